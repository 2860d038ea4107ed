//! Blob container backend.
//!
//! A container is presented as a filesystem rooted at `/`. The root stands
//! for the container itself and is the only directory; every other path
//! names an opaque object that is neither a file nor a directory. Hydration
//! is optimistic: a node only records the object URL, and existence is
//! discovered when an operation reaches the service.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use anyfs_http::HttpClient;
use anyfs_http::auth::{Authenticator, STORAGE_API_VERSION};

use super::{Backend, Filesystem, Node};
use crate::cache::CacheConfig;
use crate::error::{FsError, Result};
use crate::path::{FsPath, PosixPath};
use crate::remote::{RemoteClient, RetryPolicy, SendOptions};

const VERSION_HEADER: HeaderName = HeaderName::from_static("x-ms-version");

/// Where a blob container lives and how to talk to it.
///
/// The container URL is derived from the first of `url`, `host` and
/// `account` that is set. See [`BlobConfig::container_url`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobConfig {
    /// Storage account name, used to derive the default host.
    pub account: Option<String>,
    /// Container name. Required unless `url` already points at the container.
    pub container: Option<String>,
    /// Service host, overriding the account-derived one.
    pub host: Option<String>,
    /// Full service or container URL, overriding `host` and `account`.
    pub url: Option<String>,
    /// Node cache sizing.
    pub cache: CacheConfig,
    /// Retry behavior for every request.
    pub retry: RetryPolicy,
}

/// A [`BlobConfig`] that does not describe a reachable container.
#[derive(Debug, Error)]
pub enum BlobConfigError {
    /// None of `url`, `host` and `account` is set.
    #[error("url, host or account is required")]
    MissingLocation,

    /// `container` is unset and `url` does not supply it.
    #[error("container is required")]
    MissingContainer,

    /// The resolved URL does not parse.
    #[error("invalid container url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The resolved URL has no path that objects could be appended to.
    #[error("container url cannot hold object paths: {0}")]
    NotHierarchical(String),
}

impl BlobConfig {
    /// Resolve the container URL, always ending in `/`.
    ///
    /// An explicit `url` gets a trailing slash and, when set, the container
    /// appended. Otherwise the container is appended to `https://{host}/`,
    /// where `host` defaults to `{account}.blob.core.windows.net`.
    pub fn container_url(&self) -> std::result::Result<Url, BlobConfigError> {
        let raw = match &self.url {
            Some(url) => {
                let mut url = url.clone();
                if !url.ends_with('/') {
                    url.push('/');
                }
                if let Some(container) = &self.container {
                    url.push_str(container);
                    url.push('/');
                }
                url
            }
            None => {
                let host = match (&self.host, &self.account) {
                    (Some(host), _) => host.clone(),
                    (None, Some(account)) => format!("{account}.blob.core.windows.net"),
                    (None, None) => return Err(BlobConfigError::MissingLocation),
                };
                let container = self
                    .container
                    .as_ref()
                    .ok_or(BlobConfigError::MissingContainer)?;
                format!("https://{host}/{container}/")
            }
        };

        let url = Url::parse(&raw)?;
        if url.cannot_be_a_base() {
            return Err(BlobConfigError::NotHierarchical(raw));
        }
        Ok(url)
    }
}

/// Hydrated state of a blob node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobMeta {
    /// The container root.
    Container,
    /// An object inside the container.
    Object {
        /// Where the object lives.
        url: Url,
    },
}

/// Properties reported by the service for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobProperties {
    /// Size of the object in bytes.
    pub content_length: Option<u64>,
    /// MIME type recorded for the object.
    pub content_type: Option<String>,
    /// Entity tag of the current object version.
    pub etag: Option<String>,
}

impl BlobProperties {
    fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            content_length: text(CONTENT_LENGTH).and_then(|v| v.parse().ok()),
            content_type: text(CONTENT_TYPE),
            etag: text(ETAG),
        }
    }
}

/// Serves a blob container through a [`RemoteClient`].
#[derive(Debug)]
pub struct BlobBackend<C, A> {
    container_url: Url,
    client: RemoteClient<C, A>,
}

/// A filesystem over one blob container.
pub type BlobFs<C, A> = Filesystem<BlobBackend<C, A>>;

impl<C, A> BlobBackend<C, A> {
    /// The URL of the container, ending in `/`.
    #[must_use]
    pub fn container_url(&self) -> &Url {
        &self.container_url
    }

    /// The request layer used for every object operation.
    #[must_use]
    pub fn client(&self) -> &RemoteClient<C, A> {
        &self.client
    }

    fn object_url(&self, path: &PosixPath) -> Result<Url> {
        if path.parts().iter().any(|p| p == "..") {
            return Err(FsError::InvalidName(path.render()));
        }
        let mut url = self.container_url.clone();
        url.path_segments_mut()
            .map_err(|()| FsError::io_failure(path.render()))?
            .pop_if_empty()
            .extend(path.parts());
        Ok(url)
    }
}

impl<C, A> Backend for BlobBackend<C, A>
where
    C: HttpClient + 'static,
    A: Authenticator + 'static,
{
    type Path = PosixPath;
    type Meta = BlobMeta;

    async fn hydrate(&self, path: &PosixPath) -> Result<Option<BlobMeta>> {
        if path.parts().is_empty() {
            return Ok(Some(BlobMeta::Container));
        }
        let url = self.object_url(path)?;
        Ok(Some(BlobMeta::Object { url }))
    }

    fn is_dir(&self, meta: &BlobMeta) -> bool {
        matches!(meta, BlobMeta::Container)
    }
}

impl<C, A> Filesystem<BlobBackend<C, A>>
where
    C: HttpClient + 'static,
    A: Authenticator + 'static,
{
    /// A filesystem over the container described by `config`.
    pub fn blob(
        config: BlobConfig,
        transport: C,
        auth: A,
    ) -> std::result::Result<Self, BlobConfigError> {
        let container_url = config.container_url()?;
        debug!(url = %container_url, "opening blob container");
        let backend = BlobBackend {
            container_url,
            client: RemoteClient::new(transport, auth, config.retry),
        };
        Ok(Self::new(backend, PosixPath::root(), config.cache))
    }

    /// The node for the object at `key`, e.g. `logs/2024/app.log`.
    ///
    /// Objects are not directories, so nested keys cannot be reached
    /// segment by segment through [`Filesystem::resolve`]; this looks the
    /// full key up in one step.
    pub async fn object(&self, key: &str) -> Result<Node<BlobBackend<C, A>>> {
        self.node(PosixPath::root().join(key), true).await
    }

    fn object_request(&self, node: &Node<BlobBackend<C, A>>) -> Result<(Url, SendOptions)> {
        match node.meta() {
            BlobMeta::Container => Err(FsError::is_a_directory(node.path().render())),
            BlobMeta::Object { url } => {
                let opts = SendOptions::new(node.path().render())
                    .header(VERSION_HEADER, HeaderValue::from_static(STORAGE_API_VERSION));
                Ok((url, opts))
            }
        }
    }

    /// Fetch the full content of the object behind `node`.
    #[instrument(level = "debug", skip(self, node), fields(path = %node.path()))]
    pub async fn download(&self, node: &Node<BlobBackend<C, A>>) -> Result<Bytes> {
        let (url, opts) = self.object_request(node)?;
        let opts = opts.accept([StatusCode::OK, StatusCode::PARTIAL_CONTENT]);
        let response = self
            .backend()
            .client
            .send(Method::GET, url.as_str(), opts)
            .await?;
        Ok(response.body)
    }

    /// Fetch the service-side properties of the object behind `node`.
    #[instrument(level = "debug", skip(self, node), fields(path = %node.path()))]
    pub async fn properties(&self, node: &Node<BlobBackend<C, A>>) -> Result<BlobProperties> {
        let (url, opts) = self.object_request(node)?;
        let response = self
            .backend()
            .client
            .send(Method::HEAD, url.as_str(), opts)
            .await?;
        Ok(BlobProperties::from_headers(&response.headers))
    }
}
