//! Append-only journal format for Synapse audit ledger entries.
//!
//! The governance kernel keeps its hash chain in memory; this crate is the
//! durable side of it. A journal is a 16-byte header followed by framed
//! records, each one a UTF-8 JSON document. The journal knows nothing about
//! hashes or signatures: chain verification happens in `synapse-governance`
//! after records are loaded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use synapse_journal::{JournalReader, JournalWriter, ReadMode, WriteOptions};
//! use serde_json::json;
//!
//! let mut writer = JournalWriter::open("ledger.sgl", WriteOptions::default())?;
//! writer.append_record(&json!({"index": 0, "event": "SYSTEM_EVENT"}))?;
//! writer.finish()?;
//!
//! let mut reader = JournalReader::open("ledger.sgl", ReadMode::Strict)?;
//! while let Some(record) = reader.read_json()? {
//!     println!("{}", record["index"]);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// Error types for journal operations.
pub mod errors;
/// Frame structure and serialization.
pub mod frame;
/// Journal reader implementation.
pub mod reader;
/// Record JSON helpers.
pub mod record;
/// Journal writer implementation.
pub mod writer;

pub use errors::JournalError;
pub use frame::{FrameKind, JournalHeader, RecordFrame};
pub use reader::{JournalReader, ReadMode};
pub use record::{has_entry_shape, RecordJson};
pub use writer::{JournalFile, JournalWriter, WriteOptions};
