//! Gateway client for checking which blocks a remote store already has
//!
//! A gateway answers `HEAD <base>/ipfs/<cid>` with `200` (present) or
//! `404` (absent). Anything else is a protocol violation.
//!
//! # Example
//!
//! ```rust,no_run
//! use dagpush_core::{Block, ContentType};
//! use dagpush_gateway::{probe, HttpGateway, ProbeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = HttpGateway::new("https://ipfs.io")?;
//!     let block = Block::raw(b"hello".to_vec());
//!
//!     let exists = probe(&gateway, &block.cid, &ProbeConfig::default()).await?;
//!     println!("{} exists: {}", block.cid, exists);
//!     Ok(())
//! }
//! ```

mod probe;

use async_trait::async_trait;
use dagpush_core::Cid;
use thiserror::Error;
use tracing::debug;

pub use probe::{probe, ProbeConfig, ProbeError, DEFAULT_PROBE_TIMEOUT, DEFAULT_RETRY_COUNT};

/// HTTP status meaning the block exists
pub const STATUS_FOUND: u16 = 200;

/// HTTP status meaning the block is absent
pub const STATUS_NOT_FOUND: u16 = 404;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid gateway URL: {0:?}")]
    InvalidUrl(String),
}

/// Remote existence check for a single CID
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Issue one existence request and return the raw status code
    async fn head_status(&self, cid: &Cid) -> Result<u16, GatewayError>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    async fn head_status(&self, cid: &Cid) -> Result<u16, GatewayError> {
        (**self).head_status(cid).await
    }
}

/// Gateway reached over HTTP
#[derive(Clone, Debug)]
pub struct HttpGateway {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGateway {
    /// Create a client for `base_url` (e.g. `https://ipfs.io`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(GatewayError::InvalidUrl(base_url));
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            http: reqwest::Client::builder().build()?,
        })
    }

    /// Get the base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lookup URL for a CID
    pub fn url_for(&self, cid: &Cid) -> String {
        format!("{}/ipfs/{}", self.base_url, cid)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn head_status(&self, cid: &Cid) -> Result<u16, GatewayError> {
        let url = self.url_for(cid);
        debug!("Checking exists: {}", url);
        let resp = self.http.head(&url).send().await?;
        debug!("  -> status: {}", resp.status());
        Ok(resp.status().as_u16())
    }
}
