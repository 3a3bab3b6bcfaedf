// commitlog-core/src/lib.rs
// Append-only, multi-writer commit log

pub mod commit;
pub mod durability;
pub mod error;

// Public exports
pub use commit::{CommitReader, CommitWriter, MatchingLines, RecordKey, RecordLine};
pub use durability::{SyncPolicy, WriterOptions};
pub use error::{CommitLogError, MalformedReason, Result};
