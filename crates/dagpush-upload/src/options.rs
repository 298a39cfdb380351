//! Upload options and observers

use std::sync::Arc;
use std::time::Duration;

use dagpush_config::Config;
use dagpush_core::BatchLimits;
use dagpush_gateway::ProbeConfig;

/// Cumulative upload progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Blocks submitted so far (confirmed or benignly rejected)
    pub current_blocks: usize,
    /// Blocks that need uploading in this run
    pub total_blocks: usize,
}

/// Receives progress and log lines from the driver
pub trait UploadObserver: Send + Sync {
    fn on_progress(&self, _progress: Progress) {}

    fn on_log(&self, _message: &str) {}
}

impl UploadObserver for () {}

/// Every recognised upload option, with defaults applied at construction
#[derive(Clone)]
pub struct UploadOptions {
    /// Gateway used for existence probes
    pub gateway_base_url: String,
    /// Per-attempt probe timeout
    pub timeout: Duration,
    /// Probe attempts per block
    pub retry_count: u32,
    /// Minimum spacing between probe launches
    pub probe_interval: Duration,
    pub max_concurrent_probes: usize,
    pub batch_limits: BatchLimits,
    pub observer: Arc<dyn UploadObserver>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("gateway_base_url", &self.gateway_base_url)
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .field("probe_interval", &self.probe_interval)
            .field("max_concurrent_probes", &self.max_concurrent_probes)
            .field("batch_limits", &self.batch_limits)
            .finish_non_exhaustive()
    }
}

impl UploadOptions {
    /// Build options from a loaded config file
    pub fn from_config(config: &Config) -> Self {
        Self {
            gateway_base_url: config.gateway.base_url.clone(),
            timeout: Duration::from_millis(config.gateway.timeout_ms),
            retry_count: config.gateway.retry_count,
            probe_interval: Duration::from_millis(config.upload.probe_interval_ms),
            max_concurrent_probes: config.upload.max_concurrent_probes,
            batch_limits: BatchLimits {
                max_actions: config.upload.max_batch_actions,
                max_bytes: config.upload.max_batch_bytes,
            },
            observer: Arc::new(()),
        }
    }

    pub fn with_gateway(mut self, base_url: impl Into<String>) -> Self {
        self.gateway_base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn with_max_concurrent_probes(mut self, max: usize) -> Self {
        self.max_concurrent_probes = max;
        self
    }

    pub fn with_batch_limits(mut self, limits: BatchLimits) -> Self {
        self.batch_limits = limits;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Per-probe parameters
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: self.timeout,
            retry_count: self.retry_count,
        }
    }
}
