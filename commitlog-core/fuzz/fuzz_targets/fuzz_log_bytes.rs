#![no_main]

use commitlog_core::{CommitReader, RecordLine};
use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tempfile::TempDir;

// Fuzz target: scanning arbitrary bytes as a commit log
// Goal: the reader reports errors for garbage, it never panics

fuzz_target!(|data: &[u8]| {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("fuzz.log");

    {
        let mut file = std::fs::File::create(&log_path).unwrap();
        file.write_all(data).unwrap();
    }

    if let Ok(reader) = CommitReader::open_with_writer_id(&log_path, "A") {
        let _ = reader.fetch_into(std::io::sink());
    }

    // The parsing rule on its own, one line at a time
    let text = String::from_utf8_lossy(data);
    for (ordinal, line) in text.lines().enumerate() {
        if let Ok(record) = RecordLine::parse(line, ordinal) {
            assert!(line.starts_with(record.writer_id()));
        }
    }
});
