use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::model::{ConnectionConfig, ModuleValidationRequest};
use crate::store::traits::{ModuleInstaller, ModuleValidator, ResourceServices};

const VALIDATE_RESOURCE: &str = "validate";

/// Talks to a server's REST API: resource extensions, query options and module validation
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    fn authorize(&self, request: RequestBuilder, connection: &ConnectionConfig) -> RequestBuilder {
        match &connection.username {
            Some(username) => request.basic_auth(username, connection.password.as_deref()),
            None => request,
        }
    }

    fn resource_url(connection: &ConnectionConfig, resource: &str) -> String {
        format!("{}/v1/resources/{}", connection.url, resource)
    }
}

#[async_trait::async_trait]
impl ResourceServices for RestClient {
    async fn post(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
        body: &Value,
    ) -> Result<Vec<String>> {
        let url = Self::resource_url(connection, resource);
        log::debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(&url), connection)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to resource '{}' failed", resource))?;

        let status = response.status();
        let text = response.text().await.context("Failed to read resource response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "Resource '{}' returned {}: {}",
                resource,
                status,
                text
            ));
        }

        // The resource answers with a single document; an empty body means no result
        if text.trim().is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![text])
        }
    }
}

#[async_trait::async_trait]
impl ModuleInstaller for RestClient {
    async fn install_query_options(&self, connection: &ConnectionConfig, file: &Path) -> Result<()> {
        let name = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("Invalid query options file name {}", file.display()))?;
        let content_type = match file.extension().and_then(|ext| ext.to_str()) {
            Some("json") => "application/json",
            _ => "application/xml",
        };
        let contents = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;

        let url = format!("{}/v1/config/query/{}", connection.url, name);
        let response = self
            .authorize(self.client.put(&url), connection)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(contents)
            .send()
            .await
            .with_context(|| format!("Failed to install query options '{}'", name))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Installing query options '{}' returned {}: {}",
                name,
                status,
                text
            ));
        }

        log::info!("Installed query options '{}'", name);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ModuleValidator for RestClient {
    async fn validate_user_module(
        &self,
        connection: &ConnectionConfig,
        request: &ModuleValidationRequest,
    ) -> Result<Value> {
        let url = Self::resource_url(connection, VALIDATE_RESOURCE);
        let response = self
            .authorize(self.client.post(&url), connection)
            .query(&[
                ("rs:entity", request.entity_name.as_str()),
                ("rs:flow", request.flow_name.as_str()),
                ("rs:plugin", request.module_name.as_str()),
                ("rs:type", request.module_type.as_str()),
            ])
            .body(request.contents.clone())
            .send()
            .await
            .context("Module validation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Module validation returned {}: {}", status, text));
        }

        response
            .json::<Value>()
            .await
            .context("Module validation returned malformed JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path as UrlPath, routing::post, Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> ConnectionConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ConnectionConfig::new(&format!("http://{}", address))
    }

    #[tokio::test]
    async fn test_post_returns_single_item() {
        let app = Router::new().route(
            "/v1/resources/:name",
            post(|UrlPath(name): UrlPath<String>, Json(body): Json<Value>| async move {
                let count = body.as_array().map(|a| a.len()).unwrap_or(0);
                format!("{{\"resource\":\"{}\",\"entities\":{}}}", name, count)
            }),
        );
        let connection = spawn_server(app).await;
        let client = RestClient::new(Duration::from_secs(5)).unwrap();

        let items = client
            .post(&connection, "db-configs", &json!([{ "info": { "title": "Order" } }]))
            .await
            .unwrap();

        assert_eq!(items, vec![r#"{"resource":"db-configs","entities":1}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_post_empty_body_yields_no_items() {
        let app = Router::new().route("/v1/resources/:name", post(|| async { "" }));
        let connection = spawn_server(app).await;
        let client = RestClient::new(Duration::from_secs(5)).unwrap();

        let items = client
            .post(&connection, "search-options-generator", &json!([]))
            .await
            .unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_post_error_status_is_reported() {
        let app = Router::new().route(
            "/v1/resources/:name",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let connection = spawn_server(app).await;
        let client = RestClient::new(Duration::from_secs(5)).unwrap();

        let err = client
            .post(&connection, "db-configs", &json!([]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("500"));
    }
}
