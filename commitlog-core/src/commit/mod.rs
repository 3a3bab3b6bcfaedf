// commit/mod.rs
// Commit log module
//
// This module provides:
// - `record`: line format, key generation, sanitization and the parsing rule
// - `CommitWriter`: appends records for one writer identity
// - `CommitReader` / `MatchingLines`: scans records for one writer identity

pub mod record;
mod reader;
mod writer;

pub use reader::{CommitReader, MatchingLines};
pub use record::{RecordKey, RecordLine, DELIMITER, LINE_TERMINATOR};
pub use writer::CommitWriter;
