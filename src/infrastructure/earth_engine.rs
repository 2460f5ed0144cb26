// Earth Engine REST client implementation
use crate::application::imagery_backend::{ImageryBackend, RemoteQueryError};
use crate::application::ndvi_query::NdviQuery;
use crate::infrastructure::access_token::AccessToken;
use crate::infrastructure::config::EarthEngineSettings;
use crate::infrastructure::ee_expression;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Authenticated session against one cloud project. Constructed once at
/// startup and shared by every request.
#[derive(Debug, Clone)]
pub struct EarthEngineClient {
    http: reqwest::Client,
    base_url: String,
    project: String,
    access_token: Arc<AccessToken>,
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl EarthEngineClient {
    pub fn new(settings: &EarthEngineSettings) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            project: settings.project.clone(),
            access_token: Arc::new(AccessToken::from_settings(settings)),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.access_token.is_configured()
    }

    fn compute_url(&self) -> String {
        format!("{}/v1/projects/{}/value:compute", self.base_url, self.project)
    }
}

#[async_trait]
impl ImageryBackend for EarthEngineClient {
    async fn compute(&self, query: &NdviQuery) -> Result<serde_json::Value, RemoteQueryError> {
        let url = self.compute_url();
        let body = json!({ "expression": ee_expression::encode(query) });

        let token = self.access_token.get().await?;

        tracing::debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            if status == 401 {
                self.access_token.invalidate().await;
            }
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(RemoteQueryError::Status { status, message });
        }

        let data = response.json::<ComputeValueResponse>().await?;
        data.result
            .ok_or_else(|| RemoteQueryError::Service("compute response has no result".to_string()))
    }
}
