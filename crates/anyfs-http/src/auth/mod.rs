//! Request authentication strategies.
//!
//! An [`Authenticator`] runs on every physical attempt, after the caller's
//! headers and body are in place, so schemes that sign the request see
//! exactly what goes over the wire. Strategies only ever write the header
//! names that belong to their scheme; every other caller header survives.

mod bearer;
mod shared_key;

use std::future::Future;

pub use bearer::{BearerAuth, StaticToken, TokenProvider};
pub use shared_key::SharedKeyAuth;

use crate::error::AuthError;
use crate::http_client::HttpRequest;

/// The storage service version sent when the caller does not pick one.
pub const STORAGE_API_VERSION: &str = "2019-07-07";

/// Adds credentials to a pending request.
pub trait Authenticator: Send + Sync {
    /// Mutate `request` so that the remote end accepts it as authenticated.
    fn authorize(
        &self,
        request: &mut HttpRequest,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Sends requests without credentials, for publicly readable containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authenticator for Anonymous {
    async fn authorize(&self, _request: &mut HttpRequest) -> Result<(), AuthError> {
        Ok(())
    }
}
