#![no_main]

use commitlog_core::{CommitReader, CommitWriter, SyncPolicy, WriterOptions};
use libfuzzer_sys::fuzz_target;
use tempfile::TempDir;

// Fuzz target: committing arbitrary payloads
// Goal: every non-empty payload becomes exactly one readable line

fuzz_target!(|message: &str| {
    if message.is_empty() {
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("fuzz.log");

    let options = WriterOptions::new().sync(SyncPolicy::Flush).writer_id("fz");
    let writer = CommitWriter::with_options(&log_path, options).unwrap();
    writer.commit(message).unwrap();

    let reader = CommitReader::open_with_writer_id(&log_path, "fz").unwrap();
    assert_eq!(reader.fetch_into(std::io::sink()).unwrap(), 1);
});
