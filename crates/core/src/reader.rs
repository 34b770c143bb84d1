//! Tolerant session log reader
//!
//! Session logs are appended to while they are being read, so a torn or
//! corrupt line is expected rather than exceptional: every line is parsed on
//! its own and anything that is not a JSON object is skipped.

use crate::error::CoreError;
use crate::fsutil::atomic_write;
use crate::record::LogRecord;
use crate::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

/// Read records from the start of the log through the first record whose
/// `uuid` equals `target`, inclusive
///
/// The whole readable log is returned when `target` never appears, and an
/// empty list when the file does not exist.
pub fn read_until(path: &Path, target: &str) -> Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    scan(path, |record| {
        let hit = record.uuid() == Some(target);
        records.push(record);
        if hit {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    Ok(records)
}

/// Read every readable record of a log
pub fn read_all(path: &Path) -> Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    scan(path, |record| {
        records.push(record);
        ControlFlow::Continue(())
    })?;
    Ok(records)
}

/// Identifier of the last user/assistant record in a log
pub fn last_message_uuid(path: &Path) -> Result<Option<String>> {
    let mut last = None;
    scan(path, |record| {
        if record.kind().is_chat() {
            if let Some(uuid) = record.uuid() {
                last = Some(uuid.to_string());
            }
        }
        ControlFlow::Continue(())
    })?;
    Ok(last)
}

/// Write records as a JSONL file, replacing any existing file atomically
pub fn write_records(path: &Path, records: &[LogRecord]) -> Result<()> {
    let mut out = String::new();
    for record in records {
        let line = record.to_line().map_err(|source| CoreError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    atomic_write(path, out.as_bytes())
}

fn scan<F>(path: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(LogRecord) -> ControlFlow<()>,
{
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Session log {} does not exist", path.display());
            return Ok(());
        }
        Err(e) => return Err(CoreError::io(path, e)),
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| CoreError::io(path, e))?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let Ok(text) = std::str::from_utf8(&buf) else {
            debug!("Skipping non-UTF-8 line {} in {}", line_no, path.display());
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match LogRecord::parse(text) {
            Some(record) => {
                if visit(record).is_break() {
                    break;
                }
            }
            None => debug!("Skipping malformed line {} in {}", line_no, path.display()),
        }
    }

    Ok(())
}
