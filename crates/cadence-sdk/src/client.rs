//! HTTP client a phase program uses to hand its operation batch back to
//! the engine. Grounded on `crates/node-sdk/src/client.rs`'s
//! builder-constructed reqwest wrapper, and on
//! `original_source/workflows/handlers.py::handle_workflow` for the
//! `/run_workflow` request/response shape.

use cadence_core::state::OperationExchange;
use cadence_core::OperationRequest;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunWorkflowRequest {
    pub state_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    pub operations: Vec<OperationRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunWorkflowResponse {
    pub updates: Vec<OperationExchange>,
    pub next_phase: Option<String>,
    pub error: Option<String>,
    pub delay: Option<f64>,
}

pub struct PhaseClient {
    base_url: String,
    http: reqwest::Client,
}

pub struct PhaseClientBuilder {
    base_url: String,
    http: Option<reqwest::Client>,
}

impl PhaseClient {
    pub fn builder(base_url: impl Into<String>) -> PhaseClientBuilder {
        PhaseClientBuilder {
            base_url: base_url.into(),
            http: None,
        }
    }

    pub async fn run_workflow(
        &self,
        request: RunWorkflowRequest,
    ) -> Result<RunWorkflowResponse, ClientError> {
        let url = format!("{}/run_workflow", self.base_url);
        let response = self.http.post(url).json(&request).send().await?;
        let parsed = response.error_for_status()?.json().await?;
        Ok(parsed)
    }
}

impl PhaseClientBuilder {
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn build(self) -> PhaseClient {
        PhaseClient {
            base_url: self.base_url,
            http: self.http.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_a_fresh_http_client() {
        let client = PhaseClient::builder("http://localhost:8080").build();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn run_workflow_request_serializes_without_optional_fields() {
        let request = RunWorkflowRequest {
            state_id: "s1".to_string(),
            current_phase: None,
            next_phase: None,
            delay: None,
            operations: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("current_phase").is_none());
        assert_eq!(json["state_id"], "s1");
    }
}
