#![allow(missing_docs, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::header::{AUTHORIZATION, HeaderValue};
use http::StatusCode;
use tokio::time::Instant;

use anyfs::transport::auth::Authenticator;
use anyfs::transport::{AuthError, HttpClient, HttpClientError, HttpRequest, HttpResponse};

/// One scripted outcome of a physical request.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Answer with this response.
    Respond(HttpResponse),
    /// Fail before any response arrives.
    ConnectionError,
    /// Never answer within any sane timeout.
    Hang,
    /// Reject the request before it leaves the client.
    InvalidRequest,
}

impl Scripted {
    pub fn status(code: u16) -> Self {
        Self::Respond(HttpResponse::new(StatusCode::from_u16(code).unwrap()))
    }
}

#[derive(Debug)]
struct TransportState {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
}

/// An `HttpClient` that plays back a script and records every request.
///
/// Once the script runs out, every further request gets the fallback.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<TransportState>,
}

impl MockTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self::with_fallback(script, Scripted::status(200))
    }

    pub fn always(outcome: Scripted) -> Self {
        Self::with_fallback(std::iter::empty(), outcome)
    }

    pub fn with_fallback(script: impl IntoIterator<Item = Scripted>, fallback: Scripted) -> Self {
        Self {
            state: Arc::new(TransportState {
                script: Mutex::new(script.into_iter().collect()),
                fallback,
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of physical requests seen so far.
    pub fn calls(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, req)| req.clone())
            .collect()
    }

    /// The time between consecutive requests.
    pub fn gaps(&self) -> Vec<Duration> {
        let requests = self.state.requests.lock().unwrap();
        requests
            .windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].0))
            .collect()
    }
}

impl HttpClient for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        self.state
            .requests
            .lock()
            .unwrap()
            .push((Instant::now(), request));
        let outcome = self
            .state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.state.fallback.clone());
        match outcome {
            Scripted::Respond(response) => Ok(response),
            Scripted::ConnectionError => {
                Err(HttpClientError::Connection("connection refused".to_owned()))
            }
            Scripted::InvalidRequest => {
                Err(HttpClientError::InvalidRequest("relative URL without a base".to_owned()))
            }
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(HttpClientError::Timeout)
            }
        }
    }
}

/// Sets `authorization: test-<n>` where `n` counts calls, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct CountingAuth {
    calls: Arc<AtomicUsize>,
}

impl CountingAuth {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authenticator for CountingAuth {
    async fn authorize(&self, request: &mut HttpRequest) -> Result<(), AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_str(&format!("test-{n}"))?);
        Ok(())
    }
}

/// Always fails, as a credential provider without credentials would.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAuth;

impl Authenticator for FailingAuth {
    async fn authorize(&self, _request: &mut HttpRequest) -> Result<(), AuthError> {
        Err(AuthError::Token("no credentials available".to_owned()))
    }
}
