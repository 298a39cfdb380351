//! Existence probing with per-attempt timeout and bounded retries
//!
//! Retries are only spent on timeouts. A clean `404` answers the question
//! for this run and stops the loop; running out of retries is treated the
//! same way, since re-uploading a stored block is a no-op at the store.

use std::time::Duration;

use dagpush_core::Cid;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Gateway, GatewayError, STATUS_FOUND, STATUS_NOT_FOUND};

/// Default per-attempt timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of attempts
pub const DEFAULT_RETRY_COUNT: u32 = 3;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Unexpected status {status} for {cid}")]
    UnexpectedStatus { cid: Cid, status: u16 },

    #[error("Gateway error for {cid}: {source}")]
    Gateway { cid: Cid, source: GatewayError },
}

/// Probe parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Timeout for a single attempt
    pub timeout: Duration,
    /// Maximum number of attempts (each timeout uses one)
    pub retry_count: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

/// Ask the gateway whether it already has `cid`
///
/// Returns `Ok(true)` on 200, `Ok(false)` on 404 or when every attempt
/// timed out. Other statuses and transport failures are errors.
pub async fn probe<G: Gateway + ?Sized>(
    gateway: &G,
    cid: &Cid,
    config: &ProbeConfig,
) -> Result<bool, ProbeError> {
    for attempt in 1..=config.retry_count {
        let status = match tokio::time::timeout(config.timeout, gateway.head_status(cid)).await {
            Ok(result) => result.map_err(|source| ProbeError::Gateway { cid: *cid, source })?,
            Err(_) => {
                warn!(
                    "Probe for {} timed out after {:?} (attempt {}/{})",
                    cid.short(),
                    config.timeout,
                    attempt,
                    config.retry_count
                );
                continue;
            }
        };

        return match status {
            STATUS_FOUND => {
                debug!("Block {} already exists", cid.short());
                Ok(true)
            }
            STATUS_NOT_FOUND => Ok(false),
            status => Err(ProbeError::UnexpectedStatus { cid: *cid, status }),
        };
    }

    debug!(
        "Probe for {} gave no answer after {} attempts, assuming missing",
        cid.short(),
        config.retry_count
    );
    Ok(false)
}
