// commit/writer.rs
// Commit log writer: formats records and appends them under a per-instance lock

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::durability::{SyncPolicy, WriterOptions};
use crate::error::{CommitLogError, Result};

use super::record::{format_record, validate_writer_id, RecordKey, LINE_TERMINATOR};

/// Appends records for one writer identity to a commit log file
///
/// Creates the file if it does not already exist. Every commit opens the
/// file in append mode, writes one complete line, flushes it according to
/// the [`SyncPolicy`] and closes the handle again, all while holding this
/// instance's lock. Two commits on the same instance never interleave.
///
/// No lock is shared between instances or processes: interleaving across
/// them relies on the file system's append-mode atomicity for a single
/// write of one line.
pub struct CommitWriter {
    path: PathBuf,
    writer_id: Option<String>,
    sync: SyncPolicy,
    append_lock: Mutex<()>,
}

impl CommitWriter {
    /// Open or create a commit log for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, WriterOptions::default())
    }

    /// Open or create a commit log and set the writer identity in one go
    pub fn open_with_writer_id(path: impl AsRef<Path>, writer_id: &str) -> Result<Self> {
        Self::with_options(path, WriterOptions::new().writer_id(writer_id))
    }

    pub fn with_options(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CommitLogError::config("file name cannot be empty"));
        }
        if let Some(writer_id) = &options.writer_id {
            validate_writer_id(writer_id)?;
        }

        // Create the file up front so permission problems surface here
        open_append(path)?;
        debug!(path = %path.display(), sync = ?options.sync, "opened commit log for writing");

        Ok(CommitWriter {
            path: path.to_path_buf(),
            writer_id: options.writer_id,
            sync: options.sync,
            append_lock: Mutex::new(()),
        })
    }

    pub fn set_writer_id(&mut self, writer_id: impl Into<String>) -> Result<()> {
        let writer_id = writer_id.into();
        validate_writer_id(&writer_id)?;
        self.writer_id = Some(writer_id);
        Ok(())
    }

    pub fn writer_id(&self) -> Option<&str> {
        self.writer_id.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        self.sync
    }

    /// Format a message as a record line (no terminator) with a fresh key
    pub fn format_line(&self, message: &str) -> Result<String> {
        let writer_id = self.require_writer_id()?;
        Ok(format_record(writer_id, &RecordKey::generate(), message))
    }

    /// Append one record to the log
    ///
    /// Returns the key generated for the record. On success the complete
    /// line, terminator included, has been written and flushed.
    pub fn commit(&self, message: &str) -> Result<RecordKey> {
        let writer_id = self.require_writer_id()?;
        if message.is_empty() {
            return Err(CommitLogError::config("cannot commit an empty message"));
        }

        // Keys are stamped under the lock so key order matches file order
        let _guard = self.append_lock.lock();
        let key = RecordKey::generate();
        let mut line = format_record(writer_id, &key, message);
        line.push_str(LINE_TERMINATOR);

        self.append(line.as_bytes())?;
        trace!(path = %self.path.display(), key = %key, bytes = line.len(), "committed record");

        Ok(key)
    }

    /// Open, write, flush, sync. The handle is closed when this returns.
    fn append(&self, bytes: &[u8]) -> Result<()> {
        let mut file = open_append(&self.path)?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .and_then(|_| self.sync.apply(&file))
            .map_err(|e| CommitLogError::io(&self.path, e))
    }

    fn require_writer_id(&self) -> Result<&str> {
        self.writer_id
            .as_deref()
            .ok_or_else(|| CommitLogError::config("writer id must be set before committing"))
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CommitLogError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_log() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("commit.log");
        (temp_dir, path)
    }

    #[test]
    fn test_open_creates_empty_file() {
        let (_temp, path) = temp_log();
        assert!(!path.exists());

        let writer = CommitWriter::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(writer.path(), path.as_path());
        assert_eq!(writer.writer_id(), None);
    }

    #[test]
    fn test_open_empty_path_is_configuration_error() {
        let err = CommitWriter::open("").err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_open_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = CommitWriter::open(temp_dir.path()).err().unwrap();
        assert!(err.is_io());
        assert!(err.to_string().contains(&temp_dir.path().display().to_string()));
    }

    #[test]
    fn test_open_with_invalid_writer_id_fails() {
        let (_temp, path) = temp_log();
        let err = CommitWriter::open_with_writer_id(&path, "").err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_writer_id_rejected() {
        let (_temp, path) = temp_log();
        let mut writer = CommitWriter::open(&path).unwrap();
        assert!(writer.set_writer_id("").unwrap_err().is_configuration());
        assert_eq!(writer.writer_id(), None);
    }

    #[test]
    fn test_commit_without_writer_id_fails() {
        let (_temp, path) = temp_log();
        let writer = CommitWriter::open(&path).unwrap();
        assert!(writer.commit("test message").unwrap_err().is_configuration());
        assert!(writer.format_line("booger").unwrap_err().is_configuration());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_commit_empty_message_fails() {
        let (_temp, path) = temp_log();
        let writer = CommitWriter::open_with_writer_id(&path, "a").unwrap();
        assert!(writer.commit("").unwrap_err().is_configuration());
    }

    #[test]
    fn test_format_line() {
        let (_temp, path) = temp_log();
        let writer = CommitWriter::open_with_writer_id(&path, "a").unwrap();
        let msg = "big row of chickens";

        let line = writer.format_line(msg).unwrap();
        assert!(line.starts_with("a:"));
        assert!(line.ends_with(&format!(":{}", msg)));
        // 13 digit millis + '-' + 4 char suffix = 18
        assert_eq!(line.len(), "a".len() + msg.len() + 2 + 18);
    }

    #[test]
    fn test_format_line_escapes_line_breaks() {
        let (_temp, path) = temp_log();
        let writer = CommitWriter::open_with_writer_id(&path, "a").unwrap();

        let line = writer
            .format_line("two paths \r\ndiverged\r\nin the woods")
            .unwrap();
        assert!(!line.contains('\r'));
        assert!(!line.contains('\n'));
        assert!(line.ends_with(":two paths <cr><lf>diverged<cr><lf>in the woods"));
    }

    #[test]
    fn test_commit_grows_file() {
        let (_temp, path) = temp_log();
        let mut writer = CommitWriter::open(&path).unwrap();
        writer.set_writer_id("b").unwrap();

        let msg = "quick brown fox on a bench";
        writer.commit(msg).unwrap();

        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            (msg.len() + 23) as u64
        );
    }

    #[test]
    fn test_two_commits_grow_file() {
        let (_temp, path) = temp_log();
        let writer = CommitWriter::open_with_writer_id(&path, "c").unwrap();

        let msg_0 = "it was a dark and stormy night";
        let msg_1 = "and the rain was lightly falling";
        writer.commit(msg_0).unwrap();
        writer.commit(msg_1).unwrap();

        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            (msg_0.len() + msg_1.len() + 46) as u64
        );
    }

    #[test]
    fn test_commit_appends_to_existing_file() {
        let (_temp, path) = temp_log();
        std::fs::write(&path, "A:12345:First Entry\r\n").unwrap();

        let writer = CommitWriter::open_with_writer_id(&path, "A").unwrap();
        let key = writer.commit("Second Entry").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            format!("A:12345:First Entry\r\nA:{}:Second Entry\r\n", key)
        );
    }

    #[test]
    fn test_commit_with_flush_policy() {
        let (_temp, path) = temp_log();
        let writer = CommitWriter::with_options(
            &path,
            WriterOptions::new().sync(SyncPolicy::Flush).writer_id("x"),
        )
        .unwrap();
        assert_eq!(writer.sync_policy(), SyncPolicy::Flush);

        writer.commit("hello").unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), ("hello".len() + 23) as u64);
    }

    #[test]
    fn test_commit_fails_when_file_removed_from_under_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("logs");
        std::fs::create_dir(&dir).unwrap();
        let path = dir.join("commit.log");

        let writer = CommitWriter::open_with_writer_id(&path, "a").unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let err = writer.commit("lost").unwrap_err();
        assert!(err.is_io());

        // Lock was released on the error path
        std::fs::create_dir(&dir).unwrap();
        writer.commit("found").unwrap();
    }
}
