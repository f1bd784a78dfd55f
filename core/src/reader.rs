//! Bulk parsing of an existing log file.
//!
//! Used to catch up on a file that already has content before tailing it
//! live. Line splitting and parsing are embarrassingly parallel because the
//! parser is stateless; the resulting token vector preserves file order and
//! is replayed sequentially through the tracker.

use std::fs::File;
use std::path::Path;

use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::prelude::*;

use crate::error::WatchError;
use crate::power_log::{LogToken, parse_line};

/// Parse a whole log file. Returns the tokens in file order plus the byte
/// offset at which live tailing should resume.
pub fn read_log_file<P: AsRef<Path>>(path: P) -> Result<(Vec<LogToken>, u64), WatchError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let bytes = mmap.as_ref();

    // Find all complete line boundaries; a trailing fragment without a
    // newline is left for the tail loop.
    let mut line_ranges: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    for end in memchr_iter(b'\n', bytes) {
        if end > start {
            line_ranges.push((start, end));
        }
        start = end + 1;
    }
    let consumed = start as u64;

    let tokens: Vec<LogToken> = line_ranges
        .par_iter()
        .filter_map(|&(start, end)| {
            let line = String::from_utf8_lossy(&bytes[start..end]);
            parse_line(&line)
        })
        .collect();

    Ok((tokens, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_tokens_in_file_order_and_reports_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = "GameState.DebugPrintPower() - CREATE_GAME\n\
                       [Graphics] noise\n\
                       GameState.DebugPrintPower() - TAG_CHANGE Entity=GameEntity tag=TURN value=1\n\
                       GameState.DebugPrintPower() - TAG_CHANGE Entity=GameEntity tag=TU";
        file.write_all(content.as_bytes()).unwrap();

        let (tokens, consumed) = read_log_file(file.path()).unwrap();
        assert_eq!(tokens, vec![LogToken::GameStart, LogToken::TurnChange(1)]);
        // The truncated trailing fragment is not consumed
        let last_newline = content.rfind('\n').unwrap() as u64 + 1;
        assert_eq!(consumed, last_newline);
    }
}
