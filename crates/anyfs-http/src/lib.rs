//! Transport and authentication plumbing for anyfs remote backends.
//!
//! The filesystem layer never talks to a concrete HTTP library. It drives an
//! [`HttpClient`] and signs each outgoing [`HttpRequest`] with an
//! [`Authenticator`](auth::Authenticator) right before it is sent.

pub mod auth;
mod backends;
pub mod error;
mod http_client;

#[cfg(feature = "reqwest-client")]
pub use backends::ReqwestClient;
pub use error::{AuthError, HttpClientError};
pub use http_client::{HttpClient, HttpRequest, HttpResponse};
