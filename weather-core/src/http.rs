//! Minimal HTTP GET seam so fetchers can run against a fake transport.

use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

const USER_AGENT: &str = concat!("weather-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// No response was received.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait HttpClient: Send + Sync + Debug {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    http: Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}
