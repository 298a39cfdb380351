//! Upload of content-addressed blocks through a pluggable transaction sender
//!
//! The driver filters out blocks a gateway already serves, packs the rest
//! into bounded batches and submits them one at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use dagpush_core::SourceFile;
//! use dagpush_upload::{DryRunSender, UploadDriver, UploadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = UploadOptions::default().with_gateway("https://ipfs.io");
//!     let driver = UploadDriver::new(options, DryRunSender)?;
//!
//!     let root = driver
//!         .upload_files(vec![SourceFile::new("index.html", "<h1>hi</h1>")])
//!         .await?;
//!     println!("root: {}", root);
//!     Ok(())
//! }
//! ```

mod driver;
mod options;
mod sender;
mod throttle;

pub use driver::{dedupe_blocks, UploadDriver, UploadError, UploadSummary};
pub use options::{Progress, UploadObserver, UploadOptions};
pub use sender::{
    classify_failure, DryRunSender, SubmitOutcome, TransactionSender, BENIGN_FAILURE_MARKERS,
};
pub use throttle::LaunchTicker;
