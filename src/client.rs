//! Blocking HTTP client for a remote planning service.

use std::fmt;

use reqwest::StatusCode;

use crate::api::{ErrorBody, PlanRequest, PlanResponse};

#[derive(Debug, Clone)]
pub struct PlannerClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PlannerClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:10002".to_string(),
            // Above the default solver budget of 60 s.
            timeout_secs: 90,
        }
    }
}

#[derive(Debug)]
pub enum ClientError {
    Http(reqwest::Error),
    /// The service answered with an error body.
    Service {
        status: StatusCode,
        kind: String,
        message: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(err) => write!(f, "HTTP error: {}", err),
            ClientError::Service { status, kind, message } => {
                write!(f, "Planner returned {} ({}): {}", status, kind, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(err) => Some(err),
            ClientError::Service { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}

#[derive(Debug, Clone)]
pub struct PlannerClient {
    config: PlannerClientConfig,
    client: reqwest::blocking::Client,
}

impl PlannerClient {
    pub fn new(config: PlannerClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Posts `request` to `/routePos`.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, ClientError> {
        let response = self.client.post(self.url("/routePos")).json(request).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<PlanResponse>()?);
        }

        match response.json::<ErrorBody>() {
            Ok(body) => Err(ClientError::Service {
                status,
                kind: body.error,
                message: body.message,
            }),
            Err(err) => Err(ClientError::Service {
                status,
                kind: "unknown".to_string(),
                message: err.to_string(),
            }),
        }
    }

    pub fn health(&self) -> Result<bool, ClientError> {
        let response = self.client.get(self.url("/health")).send()?;
        Ok(response.status().is_success())
    }
}
