use anyhow::{Context, Result};
use std::sync::Arc;

use crate::model::{EntityDefinition, EnvironmentConfig, FlowType};
use crate::store::traits::FlowLister;

/// Attaches the input and harmonize flows of an entity directory to an entity record
#[derive(Clone)]
pub struct FlowLinker {
    lister: Arc<dyn FlowLister>,
}

impl FlowLinker {
    pub fn new(lister: Arc<dyn FlowLister>) -> Self {
        Self { lister }
    }

    /// Both flow lists are assigned only once both lookups succeed
    pub async fn attach(
        &self,
        env: &EnvironmentConfig,
        entity: &mut EntityDefinition,
        dir_name: &str,
    ) -> Result<()> {
        let input_flows = self
            .lister
            .get_flows(&env.project_dir, dir_name, FlowType::Input)
            .await
            .with_context(|| format!("Failed to list input flows of '{}'", dir_name))?;
        let harmonize_flows = self
            .lister
            .get_flows(&env.project_dir, dir_name, FlowType::Harmonize)
            .await
            .with_context(|| format!("Failed to list harmonize flows of '{}'", dir_name))?;

        entity.input_flows = input_flows;
        entity.harmonize_flows = harmonize_flows;
        Ok(())
    }
}
