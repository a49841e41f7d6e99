use anyhow::{anyhow, Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_POOL_SIZE: usize = 16;
/// Plenty of time for a slow server to accept every module
pub const DEFAULT_SHUTDOWN_WAIT: Duration = Duration::from_secs(60 * 10);

/// Bounded set of module upload tasks.
///
/// At most `size` uploads run at once. `shutdown` is the only way to finish the
/// pool and returns once every submitted upload has completed, so a module set
/// is never left half deployed unless the wait budget runs out.
pub struct ModuleLoadPool {
    permits: Arc<Semaphore>,
    tasks: JoinSet<Result<()>>,
    shutdown_wait: Duration,
}

impl ModuleLoadPool {
    pub fn new(size: usize, shutdown_wait: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
            tasks: JoinSet::new(),
            shutdown_wait,
        }
    }

    pub fn submit<F>(&mut self, upload: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .context("Module load pool closed")?;
            upload.await
        });
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every submitted upload; returns how many completed successfully
    pub async fn shutdown(mut self) -> Result<usize> {
        let wait = self.shutdown_wait;
        let drained = tokio::time::timeout(wait, async {
            let mut loaded = 0;
            let mut first_error = None;
            while let Some(joined) = self.tasks.join_next().await {
                match joined {
                    Ok(Ok(())) => loaded += 1,
                    Ok(Err(e)) => {
                        log::error!("Module upload failed: {:#}", e);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                    Err(e) => {
                        log::error!("Module upload task aborted: {}", e);
                        if first_error.is_none() {
                            first_error = Some(anyhow!("Module upload task aborted: {}", e));
                        }
                    }
                }
            }
            match first_error {
                Some(e) => Err(e),
                None => Ok(loaded),
            }
        })
        .await;

        match drained {
            Ok(result) => result,
            Err(_) => {
                self.tasks.abort_all();
                Err(anyhow!(
                    "Module uploads did not finish within {} seconds",
                    wait.as_secs()
                ))
            }
        }
    }
}

impl Default for ModuleLoadPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE, DEFAULT_SHUTDOWN_WAIT)
    }
}
