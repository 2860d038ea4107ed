//! The production transport, built on [`reqwest`].

use std::time::Duration;

use crate::error::HttpClientError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};

/// Sent on every request so servers can tell anyfs traffic apart.
const USER_AGENT: &str = concat!("anyfs/", env!("CARGO_PKG_VERSION"));

/// An [`HttpClient`] over a pooled [`reqwest::Client`] with rustls.
///
/// Clones share one connection pool. Retrying is left to the caller, so a
/// failure here is reported once and classified by what went wrong.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client whose connects and whole requests are bounded by
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// [`HttpClientError::Setup`] when the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, HttpClientError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| HttpClientError::Setup(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let mut builder = self.client.request(method, url.as_str()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        // A body cut short is a dropped connection as far as callers care.
        let body = response.bytes().await.map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> HttpClientError {
    if err.is_builder() {
        HttpClientError::InvalidRequest(err.to_string())
    } else if err.is_timeout() {
        HttpClientError::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() {
        HttpClientError::Connection(err.to_string())
    } else {
        HttpClientError::Other(Box::new(err))
    }
}
