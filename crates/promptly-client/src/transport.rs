//! HTTP transport seam
//!
//! The request client never talks to reqwest directly; it hands a fully
//! built `TransportRequest` to an `HttpTransport`. Production code uses
//! `ReqwestTransport`, tests can substitute a scripted fake.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::client::{HttpClientConfig, create_client};
use crate::Result;

/// A single outbound HTTP call
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Raw response: status, headers and the fully read body
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform exactly one HTTP exchange
    ///
    /// # Errors
    /// - `ClientError::Transport` / `ClientError::Timeout` when no response arrives.
    ///   A non-success status is *not* an error at this layer.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// `HttpTransport` backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!("{} -> {} ({} bytes)", request.url, status, body.len());

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
