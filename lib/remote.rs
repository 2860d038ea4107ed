//! The resilient request layer shared by remote backends.
//!
//! One logical [`RemoteClient::send`] turns into at most
//! [`RetryPolicy::max_attempts`] physical requests. Each attempt is
//! re-authorized and bounded by [`RetryPolicy::timeout`]; transport failures
//! and transient statuses are retried after an exponentially growing delay.

use std::collections::HashSet;
use std::time::Duration;

use anyfs_http::auth::Authenticator;
use anyfs_http::{HttpClient, HttpClientError, HttpRequest, HttpResponse};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use tracing::{debug, error, instrument, warn};

use crate::error::{FsError, Result};

/// Content type used for bodies sent without one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Statuses that are worth retrying by default.
pub const DEFAULT_TRANSIENT_STATUSES: [StatusCode; 6] = [
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// How hard [`RemoteClient::send`] tries before giving up.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Upper bound on a single physical attempt.
    pub timeout: Duration,
    /// Maximum number of physical attempts per logical request. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Multiplicative growth of the delay between attempts.
    pub delay_factor: f64,
    /// Response statuses that are retried rather than failed immediately.
    pub transient_statuses: HashSet<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 4,
            initial_delay: Duration::from_secs(2),
            delay_factor: 1.5,
            transient_statuses: DEFAULT_TRANSIENT_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Whether a response with `status` should be retried.
    #[must_use]
    pub fn is_transient(&self, status: StatusCode) -> bool {
        self.transient_statuses.contains(&status)
    }

    /// The delay that follows `delay`: `floor(secs * factor) + 1` seconds.
    ///
    /// Always strictly larger than `delay` for factors of at least one, so
    /// the default policy waits 2s, 4s, then 7s.
    #[must_use]
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let secs = (delay.as_secs_f64() * self.delay_factor).floor().max(0.0) + 1.0;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Per-request knobs for [`RemoteClient::send`].
#[derive(Debug, Clone)]
pub struct SendOptions {
    fs_path: String,
    accepted: Option<HashSet<StatusCode>>,
    body: Option<Bytes>,
    headers: HeaderMap,
    authorize: bool,
}

impl SendOptions {
    /// Options for a request made on behalf of the filesystem entry `fs_path`.
    ///
    /// The path is what failures report; it is not sent anywhere.
    pub fn new(fs_path: impl Into<String>) -> Self {
        Self {
            fs_path: fs_path.into(),
            accepted: None,
            body: None,
            headers: HeaderMap::new(),
            authorize: true,
        }
    }

    /// Only treat these statuses as success, instead of anything below 300.
    #[must_use]
    pub fn accept(mut self, codes: impl IntoIterator<Item = StatusCode>) -> Self {
        self.accepted = Some(codes.into_iter().collect());
        self
    }

    /// Attach a request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a caller header. Authentication never overrides caller headers
    /// other than its own.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send the request without running the authenticator.
    #[must_use]
    pub fn unauthenticated(mut self) -> Self {
        self.authorize = false;
        self
    }

    /// The filesystem path failures are reported against.
    #[must_use]
    pub fn fs_path(&self) -> &str {
        &self.fs_path
    }

    fn accepts(&self, status: StatusCode) -> bool {
        match &self.accepted {
            Some(codes) => codes.contains(&status),
            None => status.as_u16() < 300,
        }
    }
}

/// An HTTP client with authentication and retry.
///
/// Safe to share between concurrent requests: it holds no per-request state.
#[derive(Debug, Clone)]
pub struct RemoteClient<C, A> {
    transport: C,
    auth: A,
    policy: RetryPolicy,
}

impl<C: HttpClient, A: Authenticator> RemoteClient<C, A> {
    /// Wrap `transport`, authenticating with `auth` and retrying per `policy`.
    pub fn new(transport: C, auth: A, policy: RetryPolicy) -> Self {
        Self {
            transport,
            auth,
            policy,
        }
    }

    /// The retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &C {
        &self.transport
    }

    /// The authentication strategy.
    #[must_use]
    pub fn authenticator(&self) -> &A {
        &self.auth
    }

    /// Perform one logical request.
    ///
    /// Success is a status below 300, or membership in the accepted set when
    /// one is given. A failed response ends the request on the last attempt
    /// or when its status is not transient: 403 becomes
    /// [`FsError::PermissionDenied`], anything else [`FsError::IoFailure`].
    /// Transport failures and per-attempt timeouts are retried, and become
    /// [`FsError::IoFailure`] once attempts run out; a request the transport
    /// cannot even build fails at once. An authenticator failure
    /// is reported as [`FsError::PermissionDenied`] without retrying.
    #[instrument(level = "debug", skip(self, opts), fields(fs_path = %opts.fs_path))]
    pub async fn send(&self, method: Method, url: &str, opts: SendOptions) -> Result<HttpResponse> {
        let mut base = HttpRequest::new(method.clone(), url);
        base.headers = opts.headers.clone();
        if let Some(body) = &opts.body {
            if !base.headers.contains_key(CONTENT_TYPE) {
                base.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
                );
            }
            base.body = Some(body.clone());
        }

        let max_attempts = self.policy.attempts();
        let mut delay = self.policy.initial_delay;
        let mut attempt = 1;
        loop {
            let last = attempt >= max_attempts;

            let mut request = base.clone();
            if opts.authorize {
                self.auth.authorize(&mut request).await.map_err(|e| {
                    error!(%method, url, error = %e, "failed to authorize request");
                    FsError::permission_denied(opts.fs_path.as_str())
                })?;
            }

            match tokio::time::timeout(self.policy.timeout, self.transport.send(request)).await {
                Ok(Ok(response)) if opts.accepts(response.status) => {
                    debug!(%method, url, attempt, status = response.status.as_u16(), "request succeeded");
                    return Ok(response);
                }
                Ok(Ok(response)) => {
                    let status = response.status;
                    warn!(%method, url, attempt, status = status.as_u16(), "request failed");
                    if last || !self.policy.is_transient(status) {
                        if last {
                            error!(%method, url, attempt, "giving up after final attempt");
                        }
                        return Err(if status == StatusCode::FORBIDDEN {
                            FsError::permission_denied(opts.fs_path.as_str())
                        } else {
                            FsError::io_failure(opts.fs_path.as_str())
                        });
                    }
                }
                Ok(Err(e @ (HttpClientError::InvalidRequest(_) | HttpClientError::Setup(_)))) => {
                    error!(%method, url, attempt, error = %e, "request cannot be sent");
                    return Err(FsError::io_failure(opts.fs_path.as_str()));
                }
                Ok(Err(e)) => {
                    warn!(%method, url, attempt, error = %e, "transport failure");
                    if last {
                        error!(%method, url, attempt, "giving up after final attempt");
                        return Err(FsError::io_failure(opts.fs_path.as_str()));
                    }
                }
                Err(_) => {
                    warn!(%method, url, attempt, timeout = ?self.policy.timeout, "attempt timed out");
                    if last {
                        error!(%method, url, attempt, "giving up after final attempt");
                        return Err(FsError::io_failure(opts.fs_path.as_str()));
                    }
                }
            }

            debug!(delay = ?delay, "backing off before retry");
            tokio::time::sleep(delay).await;
            delay = self.policy.next_delay(delay);
            attempt += 1;
        }
    }
}
