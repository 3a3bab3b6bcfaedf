// commit/reader.rs
// Commit log reader: scans the file and yields lines for one writer identity

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::error::{CommitLogError, Result};

use super::record::{validate_writer_id, RecordLine};

/// Reads a commit log and surfaces the lines written by one identity
///
/// Scans take this instance's lock for their whole duration. They do not
/// coordinate with writers, so a scan racing an append may or may not see
/// the line being appended.
pub struct CommitReader {
    path: PathBuf,
    writer_id: Option<String>,
    scan_lock: Mutex<()>,
}

impl CommitReader {
    /// Open an existing commit log for reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CommitLogError::config("file name cannot be empty"));
        }
        if !path.exists() {
            return Err(CommitLogError::NotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "opened commit log for reading");
        Ok(CommitReader {
            path: path.to_path_buf(),
            writer_id: None,
            scan_lock: Mutex::new(()),
        })
    }

    pub fn open_with_writer_id(path: impl AsRef<Path>, writer_id: &str) -> Result<Self> {
        let mut reader = Self::open(path)?;
        reader.set_writer_id(writer_id)?;
        Ok(reader)
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

    /// Apply the parsing rule to one raw line
    ///
    /// Returns `Some(raw)` when the line belongs to this reader's identity,
    /// `None` when it is well-formed but belongs to someone else.
    pub fn parse_line<'a>(&self, raw: &'a str, ordinal: usize) -> Result<Option<&'a str>> {
        let writer_id = self.require_writer_id()?;
        let record = RecordLine::parse(raw, ordinal)?;
        Ok((record.writer_id() == writer_id).then_some(raw))
    }

    /// Lazily scan the log for matching lines, in file order
    ///
    /// The returned iterator holds the scan lock and the file handle until
    /// it is dropped. It stops at the first malformed line or I/O error.
    pub fn matching_lines(&self) -> Result<MatchingLines<'_>> {
        let writer_id = self.require_writer_id()?;
        let guard = self.scan_lock.lock();
        let file = File::open(&self.path).map_err(|e| CommitLogError::io(&self.path, e))?;

        Ok(MatchingLines {
            reader: BufReader::new(file),
            buf: Vec::new(),
            path: &self.path,
            writer_id,
            ordinal: 0,
            done: false,
            _guard: guard,
        })
    }

    /// Write every matching line, newline-terminated, to `sink`
    ///
    /// Returns the number of lines written.
    pub fn fetch_into<W: Write>(&self, mut sink: W) -> Result<usize> {
        let sink_err = |e: io::Error| CommitLogError::io(Path::new("<output>"), e);

        let mut count = 0;
        for line in self.matching_lines()? {
            let line = line?;
            writeln!(sink, "{}", line).map_err(sink_err)?;
            count += 1;
        }
        sink.flush().map_err(sink_err)?;

        debug!(path = %self.path.display(), matches = count, "scan complete");
        Ok(count)
    }

    /// Print every matching line to standard output
    pub fn fetch(&self) -> Result<()> {
        let stdout = io::stdout();
        self.fetch_into(stdout.lock())?;
        Ok(())
    }

    fn require_writer_id(&self) -> Result<&str> {
        self.writer_id
            .as_deref()
            .ok_or_else(|| CommitLogError::config("writer id must be set before fetching"))
    }
}

/// Iterator over the lines of one identity, see [`CommitReader::matching_lines`]
pub struct MatchingLines<'a> {
    // Dropped before the guard
    reader: BufReader<File>,
    buf: Vec<u8>,
    path: &'a Path,
    writer_id: &'a str,
    ordinal: usize,
    done: bool,
    _guard: MutexGuard<'a, ()>,
}

impl Iterator for MatchingLines<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match read_line(&mut self.reader, &mut self.buf) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(CommitLogError::io(self.path, e)));
                }
            };

            let ordinal = self.ordinal;
            self.ordinal += 1;

            let matches = match RecordLine::parse(&line, ordinal) {
                Ok(record) => record.writer_id() == self.writer_id,
                Err(e) => {
                    warn!(path = %self.path.display(), line = ordinal, "aborting scan: {}", e);
                    self.done = true;
                    return Some(Err(e));
                }
            };

            if matches {
                return Some(Ok(line));
            }
            trace!(line = ordinal, "skipping record of another writer");
        }
    }
}

impl FusedIterator for MatchingLines<'_> {}

/// Read one line ended by `\r\n`, `\n` or a lone `\r`, terminator stripped
///
/// Returns `None` at end of file. A final line without terminator is
/// still returned.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    let mut seen_any = false;

    loop {
        let (terminator, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                break;
            }
            seen_any = true;
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    buf.extend_from_slice(&available[..i]);
                    (Some(available[i]), i + 1)
                }
                None => {
                    buf.extend_from_slice(available);
                    (None, available.len())
                }
            }
        };
        reader.consume(used);

        match terminator {
            Some(b'\r') => {
                if reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                break;
            }
            Some(_) => break,
            None => {}
        }
    }

    if !seen_any {
        return Ok(None);
    }
    String::from_utf8(std::mem::take(buf))
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
