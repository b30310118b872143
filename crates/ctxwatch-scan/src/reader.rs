use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lines read from the activity log starting at a cursor.
#[derive(Debug)]
pub struct LogSlice {
    pub lines: Vec<String>,
    /// Absolute index of the first line in `lines`
    pub start_line: usize,
    /// Cursor after the read: total lines consumed from the start of the file
    pub next_cursor: usize,
}

impl LogSlice {
    pub fn empty(start_line: usize) -> Self {
        Self {
            lines: Vec::new(),
            start_line,
            next_cursor: start_line,
        }
    }
}

/// Read raw lines from `start_line` (zero-based) to end of file.
///
/// The log grows while sessions run, so the cursor is the contract: whatever
/// happens mid-read, `next_cursor` reflects exactly the lines present in the
/// returned slice plus the skipped prefix. A read error partway through
/// returns the partial slice; the unread tail is picked up next invocation.
pub fn read_from(path: &Path, start_line: usize) -> std::io::Result<LogSlice> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    let mut consumed = 0usize;

    for line in reader.lines() {
        match line {
            Ok(text) => {
                if consumed >= start_line {
                    lines.push(text);
                }
                consumed += 1;
            }
            Err(_) => break,
        }
    }

    // The skipped prefix may be shorter than the cursor if the file shrank
    // (log rotated or truncated); never move the cursor backwards.
    let next_cursor = consumed.max(start_line);

    Ok(LogSlice {
        lines,
        start_line,
        next_cursor,
    })
}
