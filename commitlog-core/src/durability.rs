//! Durability policy applied after every commit
//!
//! Every commit flushes its line out of user-space buffers before the
//! writer's lock is released. The policy decides how much further the
//! writer goes before reporting success.

use std::fs::File;
use std::io;

use serde::{Deserialize, Serialize};

/// How a committed line is pushed towards stable storage
///
/// # Examples
///
/// ```rust
/// use commitlog_core::SyncPolicy;
///
/// // Default: fsync file data after every commit
/// assert_eq!(SyncPolicy::default(), SyncPolicy::SyncData);
///
/// // Cheapest: leave it to the OS page cache
/// let policy = SyncPolicy::Flush;
/// assert!(!policy.is_durable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Flush user-space buffers only; the OS decides when bytes hit disk
    Flush,
    /// `fdatasync` after every commit
    SyncData,
    /// `fsync` after every commit (data and metadata)
    SyncAll,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy::SyncData
    }
}

impl SyncPolicy {
    /// True when a successful commit survives power loss
    pub fn is_durable(&self) -> bool {
        !matches!(self, SyncPolicy::Flush)
    }

    /// Apply the policy to an already flushed handle
    pub(crate) fn apply(&self, file: &File) -> io::Result<()> {
        match self {
            SyncPolicy::Flush => Ok(()),
            SyncPolicy::SyncData => file.sync_data(),
            SyncPolicy::SyncAll => file.sync_all(),
        }
    }
}

/// Construction options for a [`CommitWriter`](crate::CommitWriter)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterOptions {
    #[serde(default)]
    pub sync: SyncPolicy,
    #[serde(default)]
    pub writer_id: Option<String>,
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(mut self, sync: SyncPolicy) -> Self {
        self.sync = sync;
        self
    }

    pub fn writer_id(mut self, writer_id: impl Into<String>) -> Self {
        self.writer_id = Some(writer_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sync_data() {
        assert_eq!(SyncPolicy::default(), SyncPolicy::SyncData);
        assert_eq!(WriterOptions::default().sync, SyncPolicy::SyncData);
    }

    #[test]
    fn test_is_durable() {
        assert!(!SyncPolicy::Flush.is_durable());
        assert!(SyncPolicy::SyncData.is_durable());
        assert!(SyncPolicy::SyncAll.is_durable());
    }

    #[test]
    fn test_options_builder() {
        let opts = WriterOptions::new().sync(SyncPolicy::SyncAll).writer_id("A");
        assert_eq!(opts.sync, SyncPolicy::SyncAll);
        assert_eq!(opts.writer_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_apply_on_real_file() {
        let file = tempfile::tempfile().unwrap();
        for policy in [SyncPolicy::Flush, SyncPolicy::SyncData, SyncPolicy::SyncAll] {
            policy.apply(&file).unwrap();
        }
    }
}
