//! Transaction sender boundary
//!
//! The caller owns the connection to the remote ledger. Each batch is handed
//! to a [`TransactionSender`], which reports a typed outcome. Raw remote
//! error text is mapped with [`classify_failure`].

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use dagpush_core::Block;
use tracing::info;

/// Remote error fragments that mean the receiving account has no handler
/// deployed yet. This happens the first time a fresh account is targeted;
/// the blocks still land in the store.
pub const BENIGN_FAILURE_MARKERS: &[&str] = &[
    "CodeDoesNotExist",
    "MethodNotFound",
    "MethodResolveError",
    "has no contract code",
    "no program deployed",
];

/// Result of submitting one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Remote confirmed the transaction
    Confirmed,
    /// Remote rejected it in a way that does not affect stored content
    Benign { detail: String },
    /// Anything else; aborts the upload
    Fatal { detail: String },
}

impl SubmitOutcome {
    /// Convert a sender result, classifying the error text
    pub fn from_result<E: Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => SubmitOutcome::Confirmed,
            Err(e) => classify_failure(&e.to_string()),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SubmitOutcome::Fatal { .. })
    }
}

/// Classify a raw remote error message
pub fn classify_failure(message: &str) -> SubmitOutcome {
    if BENIGN_FAILURE_MARKERS.iter().any(|m| message.contains(m)) {
        SubmitOutcome::Benign {
            detail: message.to_string(),
        }
    } else {
        SubmitOutcome::Fatal {
            detail: message.to_string(),
        }
    }
}

/// Submits one batch of blocks as a single remote transaction
///
/// Resubmitting a batch must be safe: a store that already holds a CID
/// treats the write as a no-op.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    async fn send(&self, batch: &[Block]) -> SubmitOutcome;
}

#[async_trait]
impl<S: TransactionSender + ?Sized> TransactionSender for Arc<S> {
    async fn send(&self, batch: &[Block]) -> SubmitOutcome {
        (**self).send(batch).await
    }
}

/// Sender that only logs what it would submit
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSender;

#[async_trait]
impl TransactionSender for DryRunSender {
    async fn send(&self, batch: &[Block]) -> SubmitOutcome {
        let bytes: usize = batch.iter().map(|b| b.len()).sum();
        info!("[dry-run] batch of {} blocks, {} bytes", batch.len(), bytes);
        for block in batch {
            info!("[dry-run]   {} ({} bytes)", block.cid, block.len());
        }
        SubmitOutcome::Confirmed
    }
}
