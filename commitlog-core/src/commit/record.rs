// commit/record.rs
// Record line format shared by the writer and the reader
//
// Line layout (UTF-8, one record per line):
//   <writer_id>:<record_key>:<payload with CR/LF escaped>\r\n
//
// Only the first two delimiters are structural. The payload may contain
// the delimiter freely.

use std::borrow::Cow;
use std::fmt;

use chrono::Utc;
use rand::rngs::OsRng;
use rand::Rng;

use crate::error::{CommitLogError, MalformedReason, Result};

/// Field delimiter
pub const DELIMITER: char = ':';

/// Terminator appended after every record
pub const LINE_TERMINATOR: &str = "\r\n";

/// Escape token substituted for `\r` in payloads
pub const CR_TOKEN: &str = "<cr>";

/// Escape token substituted for `\n` in payloads
pub const LF_TOKEN: &str = "<lf>";

/// Shortest line (in characters) the reader accepts
pub const MIN_LINE_LEN: usize = 5;

/// Length of the random suffix of a record key
pub const SUFFIX_LEN: usize = 4;

const SUFFIX_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Unique key of one record: `<unix millis>-<random suffix>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    /// Build a key from the current time and the OS random source
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let mut rng = OsRng;
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        RecordKey(format!("{}-{}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replace every CR and LF with its visible escape token
pub fn sanitize_payload(message: &str) -> Cow<'_, str> {
    if !message.contains(|c: char| c == '\r' || c == '\n') {
        return Cow::Borrowed(message);
    }

    let mut out = String::with_capacity(message.len() + 8);
    for c in message.chars() {
        match c {
            '\r' => out.push_str(CR_TOKEN),
            '\n' => out.push_str(LF_TOKEN),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Check a writer identity before it is stored on a writer or reader
pub fn validate_writer_id(writer_id: &str) -> Result<()> {
    if writer_id.is_empty() {
        return Err(CommitLogError::config("writer id cannot be empty"));
    }
    if writer_id.contains(|c: char| c == DELIMITER || c == '\r' || c == '\n') {
        return Err(CommitLogError::config(format!(
            "writer id [{}] cannot contain '{}' or line breaks",
            writer_id.escape_debug(),
            DELIMITER
        )));
    }
    Ok(())
}

/// Format one record line, without its terminator
pub fn format_record(writer_id: &str, key: &RecordKey, message: &str) -> String {
    let payload = sanitize_payload(message);
    let mut line = String::with_capacity(writer_id.len() + key.0.len() + payload.len() + 2);
    line.push_str(writer_id);
    line.push(DELIMITER);
    line.push_str(key.as_str());
    line.push(DELIMITER);
    line.push_str(&payload);
    line
}

/// A line that passed the structural parsing rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLine<'a> {
    raw: &'a str,
    writer_id: &'a str,
}

impl<'a> RecordLine<'a> {
    /// Parse a raw line; `ordinal` is the 0-based line number used in errors
    pub fn parse(raw: &'a str, ordinal: usize) -> Result<Self> {
        let malformed = |reason| CommitLogError::MalformedRecord {
            line: ordinal,
            reason,
        };

        if raw.chars().take(MIN_LINE_LEN).count() < MIN_LINE_LEN {
            return Err(malformed(MalformedReason::TooShort));
        }

        let first = raw
            .find(DELIMITER)
            .ok_or_else(|| malformed(MalformedReason::NoDelimiter))?;

        let residual = &raw[first + DELIMITER.len_utf8()..];
        if !residual.contains(DELIMITER) {
            return Err(malformed(MalformedReason::SingleDelimiter));
        }

        Ok(RecordLine {
            raw,
            writer_id: &raw[..first],
        })
    }

    pub fn writer_id(&self) -> &'a str {
        self.writer_id
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }
}
