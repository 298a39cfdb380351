//! Upload driver
//!
//! 1. Probe: ask the gateway about every block, concurrently but throttled
//! 2. Pack: group the missing blocks into bounded batches
//! 3. Submit: send batches strictly one after another

use std::collections::HashSet;

use dagpush_core::{
    build_tree, pack_batches, read_car, Block, BuilderError, CarError, Cid, SourceFile,
};
use dagpush_gateway::{probe, Gateway, GatewayError, HttpGateway, ProbeError};
use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::options::{Progress, UploadOptions};
use crate::sender::{SubmitOutcome, TransactionSender};
use crate::throttle::LaunchTicker;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Build error: {0}")]
    Build(#[from] BuilderError),

    #[error("Archive error: {0}")]
    Archive(#[from] CarError),

    #[error("Archive contains no blocks")]
    EmptyArchive,

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Batch {batch} rejected: {detail}")]
    Submission { batch: usize, detail: String },
}

/// What an upload run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Distinct blocks considered
    pub total_blocks: usize,
    /// Blocks the gateway already had
    pub already_present: usize,
    /// Blocks submitted
    pub uploaded: usize,
    /// Transactions sent
    pub batches: usize,
}

/// Drives blocks from a local tree to the remote store
pub struct UploadDriver<S, G = HttpGateway> {
    options: UploadOptions,
    gateway: G,
    sender: S,
}

impl<S: TransactionSender> UploadDriver<S, HttpGateway> {
    /// Create a driver probing `options.gateway_base_url` over HTTP
    pub fn new(options: UploadOptions, sender: S) -> Result<Self, UploadError> {
        let gateway = HttpGateway::new(options.gateway_base_url.clone())?;
        Ok(Self::with_gateway(options, gateway, sender))
    }
}

/// Drop repeated CIDs, keeping the first occurrence
pub fn dedupe_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let mut seen = HashSet::with_capacity(blocks.len());
    blocks.into_iter().filter(|b| seen.insert(b.cid)).collect()
}

impl<S: TransactionSender, G: Gateway> UploadDriver<S, G> {
    pub fn with_gateway(options: UploadOptions, gateway: G, sender: S) -> Self {
        Self {
            options,
            gateway,
            sender,
        }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    fn log(&self, message: String) {
        info!("{}", message);
        self.options.observer.on_log(&message);
    }

    /// Build a tree from `files`, upload its missing blocks and return the root CID
    pub async fn upload_files(&self, files: Vec<SourceFile>) -> Result<Cid, UploadError> {
        let tree = build_tree(files)?;
        self.log(format!(
            "Built tree {} ({} blocks, {} bytes)",
            tree.root,
            tree.blocks.len(),
            tree.size
        ));
        self.upload_blocks(tree.blocks).await?;
        Ok(tree.root)
    }

    /// Upload every block of a CAR archive
    /// Returns the CID of the archive's last block (the root for DAG writers)
    pub async fn upload_car(&self, data: &[u8]) -> Result<Cid, UploadError> {
        let blocks = read_car(data)?;
        let root = blocks.last().map(|b| b.cid).ok_or(UploadError::EmptyArchive)?;
        self.log(format!("Read archive {} ({} blocks)", root, blocks.len()));
        self.upload_blocks(blocks).await?;
        Ok(root)
    }

    /// Probe phase only: return the blocks the gateway does not have
    ///
    /// Probes run concurrently, at most `max_concurrent_probes` at once and
    /// with at least `probe_interval` between launches. The first fatal
    /// probe error aborts the phase.
    pub async fn missing_blocks(&self, blocks: Vec<Block>) -> Result<Vec<Block>, UploadError> {
        let config = self.options.probe_config();
        let ticker = LaunchTicker::new(self.options.probe_interval);
        let gateway = &self.gateway;

        let probed: Vec<(Block, bool)> = stream::iter(blocks)
            .map(|block| {
                let ticker = &ticker;
                async move {
                    ticker.wait().await;
                    let exists = probe(gateway, &block.cid, &config).await?;
                    Ok::<_, ProbeError>((block, exists))
                }
            })
            .buffered(self.options.max_concurrent_probes.max(1))
            .try_collect()
            .await?;

        Ok(probed
            .into_iter()
            .filter_map(|(block, exists)| (!exists).then_some(block))
            .collect())
    }

    /// Upload a list of blocks: dedupe, probe, pack, submit
    pub async fn upload_blocks(&self, blocks: Vec<Block>) -> Result<UploadSummary, UploadError> {
        let blocks = dedupe_blocks(blocks);
        let total_blocks = blocks.len();

        let missing = self.missing_blocks(blocks).await?;
        let already_present = total_blocks - missing.len();
        self.log(format!(
            "{} of {} blocks already present, {} to upload",
            already_present,
            total_blocks,
            missing.len()
        ));

        let to_upload = missing.len();
        let batches = pack_batches(missing, self.options.batch_limits);

        let mut uploaded = 0;
        let mut sent = 0;
        for (index, batch) in batches.iter().enumerate() {
            if batch.is_empty() {
                continue;
            }

            debug!("Submitting batch {} ({} blocks)", index, batch.len());
            match self.sender.send(batch).await {
                SubmitOutcome::Confirmed => {}
                SubmitOutcome::Benign { detail } => {
                    warn!("Ignoring expected error for batch {}: {}", index, detail);
                    self.options
                        .observer
                        .on_log(&format!("Ignoring expected error: {}", detail));
                }
                SubmitOutcome::Fatal { detail } => {
                    return Err(UploadError::Submission {
                        batch: index,
                        detail,
                    });
                }
            }

            uploaded += batch.len();
            sent += 1;
            self.options.observer.on_progress(Progress {
                current_blocks: uploaded,
                total_blocks: to_upload,
            });
        }

        self.log(format!(
            "Upload complete: {} uploaded in {} batches, {} already existed",
            uploaded, sent, already_present
        ));

        Ok(UploadSummary {
            total_blocks,
            already_present,
            uploaded,
            batches: sent,
        })
    }
}
