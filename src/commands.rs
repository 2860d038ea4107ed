//! The subcommands of the `anyfs` binary.

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::ExposeSecret as _;
use thiserror::Error;
use tokio::io::AsyncWriteExt as _;
use tracing::{debug, info};

use anyfs::transport::auth::{
    Anonymous, Authenticator, BearerAuth, SharedKeyAuth, StaticToken,
};
use anyfs::transport::{AuthError, HttpClientError, HttpRequest, ReqwestClient};
use anyfs::{BlobConfigError, BlobFs, CacheConfig, EntryKind, Filesystem, FsError, FsPath, LocalFs};

use crate::app_config::{BlobSection, Config};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Blob container is misconfigured: {0}")]
    BlobConfig(#[from] BlobConfigError),

    #[error("Failed to set up authentication: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transport(#[from] HttpClientError),

    #[error("No [blob] section in the configuration.")]
    NoBlobSection,

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// The authentication strategy picked by the configuration.
pub enum ConfiguredAuth {
    SharedKey(SharedKeyAuth),
    Bearer(BearerAuth<StaticToken>),
    Anonymous(Anonymous),
}

impl ConfiguredAuth {
    fn from_section(blob: &BlobSection) -> Result<Self, AuthError> {
        match (&blob.account_key, &blob.token, &blob.account) {
            (Some(key), _, Some(account)) => Ok(Self::SharedKey(SharedKeyAuth::new(
                account.clone(),
                key.expose_secret(),
            )?)),
            (None, Some(token), _) => Ok(Self::Bearer(BearerAuth::new(StaticToken::new(
                token.clone(),
            )))),
            _ => Ok(Self::Anonymous(Anonymous)),
        }
    }
}

impl Authenticator for ConfiguredAuth {
    async fn authorize(&self, request: &mut HttpRequest) -> Result<(), AuthError> {
        match self {
            Self::SharedKey(auth) => auth.authorize(request).await,
            Self::Bearer(auth) => auth.authorize(request).await,
            Self::Anonymous(auth) => auth.authorize(request).await,
        }
    }
}

fn local_fs(config: &Config) -> LocalFs {
    Filesystem::local_with_cache(
        config.local.root.clone(),
        CacheConfig::from(&config.local.cache),
    )
}

fn blob_fs(config: &Config) -> Result<BlobFs<ReqwestClient, ConfiguredAuth>, CommandError> {
    let section = config.blob.as_ref().ok_or(CommandError::NoBlobSection)?;
    let blob = config.blob_config(section);
    let auth = ConfiguredAuth::from_section(section)?;
    let transport = ReqwestClient::new(blob.retry.timeout)?;
    Ok(Filesystem::blob(blob, transport, auth)?)
}

async fn write_stdout(bytes: &[u8]) -> Result<(), CommandError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(bytes).await?;
    stdout.flush().await?;
    Ok(())
}

/// Print the entries of the directory at `path`, or the path itself for
/// anything else.
pub async fn ls(config: &Config, path: &str) -> Result<(), CommandError> {
    let fs = local_fs(config);
    let node = fs.root().await?.go(path).await?;
    let out: String = if node.is_dir() {
        let names = node.list().await?;
        debug!(count = names.len(), "listed directory");
        names.iter().map(|name| format!("{name}\n")).collect()
    } else {
        format!("{}\n", node.path().render())
    };
    write_stdout(out.as_bytes()).await
}

/// Print the content of the file at `path`.
pub async fn cat(config: &Config, path: &str) -> Result<(), CommandError> {
    let fs = local_fs(config);
    let content = fs.root().await?.go(path).await?.slurp().await?;
    write_stdout(&content).await
}

/// Print type, size and modification time of the entry at `path`.
#[expect(
    clippy::wildcard_enum_match_arm,
    reason = "EntryKind is non_exhaustive; unknown kinds print as other"
)]
pub async fn stat(config: &Config, path: &str) -> Result<(), CommandError> {
    let fs = local_fs(config);
    let node = fs.root().await?.go(path).await?;
    let stat = node.stat().await?;
    let kind = match stat.kind {
        EntryKind::File => "file",
        EntryKind::Directory => "directory",
        _ => "other",
    };
    let modified = stat
        .modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or_else(|| "unknown".to_owned(), |d| d.as_secs().to_string());
    let out = format!(
        "path: {}\ntype: {kind}\nsize: {}\nmodified: {modified}\n",
        node.path().render(),
        stat.size,
    );
    write_stdout(out.as_bytes()).await
}

/// Download the blob at `key` to stdout.
pub async fn blob_get(config: &Config, key: &str) -> Result<(), CommandError> {
    let fs = blob_fs(config)?;
    let node = fs.object(key).await?;
    let started = SystemTime::now();
    let content = fs.download(&node).await?;
    info!(
        bytes = content.len(),
        elapsed = ?started.elapsed().unwrap_or_default(),
        "downloaded blob"
    );
    write_stdout(&content).await
}

/// Print the service-side properties of the blob at `key`.
pub async fn blob_head(config: &Config, key: &str) -> Result<(), CommandError> {
    let fs = blob_fs(config)?;
    let node = fs.object(key).await?;
    let props = fs.properties(&node).await?;
    let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_owned());
    let out = format!(
        "path: {}\ncontent-length: {}\ncontent-type: {}\netag: {}\n",
        node.path().render(),
        show(props.content_length.map(|l| l.to_string())),
        show(props.content_type),
        show(props.etag),
    );
    write_stdout(out.as_bytes()).await
}
