//! dagpush-core - content-addressed block pipeline primitives
//!
//! Turns a flat set of named files into a deduplicated DAG-PB directory
//! tree and prepares its blocks for upload:
//!
//! - **Cid**: CIDv1 over SHA256, RAW for file bytes, DAG-PB for directories
//! - **Codec**: canonical DAG-PB directory node encoding
//! - **Builder**: `(path, bytes)` entries -> directory tree -> blocks + root CID
//! - **CAR**: block archive reader (and a small writer for exports)
//! - **Batch**: size/count bounded batch packing
//!
//! # Example
//!
//! ```rust
//! use dagpush_core::{build_tree, pack_batches, BatchLimits, SourceFile};
//!
//! let tree = build_tree(vec![
//!     SourceFile::new("index.html", "<h1>hi</h1>"),
//!     SourceFile::new("css/site.css", "h1 { color: red }"),
//! ])?;
//!
//! // 2 files, css/, root
//! assert_eq!(tree.blocks.len(), 4);
//! assert!(tree.root.to_string().starts_with("bafy"));
//!
//! let batches = pack_batches(tree.blocks, BatchLimits::default());
//! assert_eq!(batches.len(), 1);
//! # Ok::<(), dagpush_core::BuilderError>(())
//! ```

pub mod batch;
pub mod builder;
pub mod car;
pub mod cid;
pub mod codec;
pub mod types;
pub mod varint;

pub use batch::{pack_batches, BatchLimits, MAX_BATCH_ACTIONS, MAX_BATCH_BYTES};
pub use builder::{build_tree, BuilderError, BuiltTree, TreeBuilder};
pub use car::{read_car, write_car, CarError};
pub use cid::{pack, Cid, CidError, CID_VERSION};
pub use codec::{
    decode_directory, encode_and_hash, encode_directory, is_directory_node, CodecError, DirLink,
};
pub use types::{sha256, to_hex, Block, ContentType, Hash, SourceFile};
