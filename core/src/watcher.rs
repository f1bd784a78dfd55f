//! Live tailing of the game client's log file.
//!
//! The watcher runs on its own task, polling the file for new bytes, and
//! hands complete lines to a single ordered channel. The client recreates
//! and truncates the log between sessions; both are detected by the
//! consumed offset outrunning the file, and surface as a
//! [`LineEvent::Rotated`] so the consumer can reset match state before the
//! fresh generation's lines arrive.

use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::session::TrackerSession;

const CHANNEL_CAPACITY: usize = 1024;

/// One item of the ordered line stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, newline stripped.
    Line(String),
    /// The file was truncated or replaced; reading restarted from offset 0.
    Rotated,
}

pub struct LogWatcher {
    path: PathBuf,
    poll_interval: Duration,
    start_offset: u64,
}

impl LogWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_millis(250),
            start_offset: 0,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resume from a known offset (e.g. after a bulk catch-up read).
    pub fn from_offset(mut self, offset: u64) -> Self {
        self.start_offset = offset;
        self
    }

    /// Start tailing. The returned receiver yields lines in arrival order;
    /// the task ends when the receiver is dropped.
    pub fn spawn(self) -> (mpsc::Receiver<LineEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    async fn run(self, tx: mpsc::Sender<LineEvent>) {
        let mut offset = self.start_offset;

        'reopen: loop {
            let file = loop {
                if tx.is_closed() {
                    return;
                }
                match File::open(&self.path).await {
                    Ok(file) => break file,
                    Err(err) => {
                        debug!(path = %self.path.display(), %err, "log file not available yet");
                        sleep(self.poll_interval).await;
                    }
                }
            };

            let opened_meta = file.metadata().await.ok();
            let mut reader = BufReader::new(file);
            if reader.seek(SeekFrom::Start(offset)).await.is_err() {
                offset = 0;
                continue 'reopen;
            }

            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => {
                        // At EOF. A file now shorter than what we consumed,
                        // gone entirely, or replaced at the path (the new
                        // generation may already be longer than the old one)
                        // means a new generation.
                        match tokio::fs::metadata(&self.path).await {
                            Ok(meta)
                                if meta.len() < offset
                                    || !is_same_file(opened_meta.as_ref(), &meta) =>
                            {
                                debug!(len = meta.len(), offset, "log rotated; restarting");
                                offset = 0;
                                if tx.send(LineEvent::Rotated).await.is_err() {
                                    return;
                                }
                                continue 'reopen;
                            }
                            Ok(_) => sleep(self.poll_interval).await,
                            Err(_) => {
                                offset = 0;
                                if tx.send(LineEvent::Rotated).await.is_err() {
                                    return;
                                }
                                continue 'reopen;
                            }
                        }
                    }
                    Ok(n) if buf.ends_with(b"\n") => {
                        offset += n as u64;
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_end_matches(['\n', '\r']).to_string();
                        if tx.send(LineEvent::Line(line)).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) => {
                        // Partial trailing line: rewind and wait until the
                        // writer finishes it.
                        if reader.seek(SeekFrom::Start(offset)).await.is_err() {
                            continue 'reopen;
                        }
                        sleep(self.poll_interval).await;
                    }
                    Err(err) => {
                        warn!(%err, "error reading log file");
                        sleep(self.poll_interval).await;
                    }
                }
            }
        }
    }
}

/// Whether the path still points at the file we have open.
fn is_same_file(opened: Option<&Metadata>, current: &Metadata) -> bool {
    let Some(opened) = opened else {
        // Identity unknown; fall back to the length heuristic alone.
        return true;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        opened.dev() == current.dev() && opened.ino() == current.ino()
    }
    #[cfg(not(unix))]
    {
        // Creation time survives in-place truncation but not replacement.
        match (opened.created(), current.created()) {
            (Ok(a), Ok(b)) => a == b,
            _ => true,
        }
    }
}

/// Drive the full pipeline: lines in, match events out through the
/// session's sinks and broadcast channel. Returns when the watcher stops.
pub async fn run_pipeline(mut rx: mpsc::Receiver<LineEvent>, session: &mut TrackerSession) {
    while let Some(event) = rx.recv().await {
        match event {
            LineEvent::Line(line) => session.process_line(&line),
            LineEvent::Rotated => {
                warn!("log rotation detected; resetting match state");
                session.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    async fn next(rx: &mut mpsc::Receiver<LineEvent>) -> LineEvent {
        timeout(WAIT, rx.recv()).await.expect("timed out").unwrap()
    }

    #[tokio::test]
    async fn tails_appended_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Power.log");
        std::fs::write(&path, "first line\n").unwrap();

        let (mut rx, handle) = LogWatcher::new(&path)
            .poll_interval(Duration::from_millis(20))
            .spawn();

        assert_eq!(next(&mut rx).await, LineEvent::Line("first line".into()));

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "second line").unwrap();
        writeln!(file, "third line").unwrap();
        file.flush().unwrap();

        assert_eq!(next(&mut rx).await, LineEvent::Line("second line".into()));
        assert_eq!(next(&mut rx).await, LineEvent::Line("third line".into()));

        drop(rx);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn partial_trailing_line_waits_for_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Power.log");
        std::fs::write(&path, "complete\nincomp").unwrap();

        let (mut rx, handle) = LogWatcher::new(&path)
            .poll_interval(Duration::from_millis(20))
            .spawn();

        assert_eq!(next(&mut rx).await, LineEvent::Line("complete".into()));

        // Finish the partial line
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "lete now").unwrap();
        file.flush().unwrap();

        assert_eq!(next(&mut rx).await, LineEvent::Line("incomplete now".into()));

        drop(rx);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn truncation_emits_rotated_and_restarts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Power.log");
        std::fs::write(&path, "old generation line\n").unwrap();

        let (mut rx, handle) = LogWatcher::new(&path)
            .poll_interval(Duration::from_millis(20))
            .spawn();

        assert_eq!(
            next(&mut rx).await,
            LineEvent::Line("old generation line".into())
        );

        // Recreate the file shorter than the consumed offset
        std::fs::write(&path, "new gen\n").unwrap();

        assert_eq!(next(&mut rx).await, LineEvent::Rotated);
        assert_eq!(next(&mut rx).await, LineEvent::Line("new gen".into()));

        drop(rx);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn replacement_with_longer_file_emits_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Power.log");
        std::fs::write(&path, "short\n").unwrap();

        let (mut rx, handle) = LogWatcher::new(&path)
            .poll_interval(Duration::from_millis(20))
            .spawn();

        assert_eq!(next(&mut rx).await, LineEvent::Line("short".into()));

        // Replace the file with a new one already longer than what was
        // consumed; length alone cannot tell this apart from growth.
        std::fs::remove_file(&path).unwrap();
        std::fs::write(&path, "a much longer replacement generation\n").unwrap();

        assert_eq!(next(&mut rx).await, LineEvent::Rotated);
        assert_eq!(
            next(&mut rx).await,
            LineEvent::Line("a much longer replacement generation".into())
        );

        drop(rx);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn waits_for_missing_file_to_appear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Power.log");

        let (mut rx, handle) = LogWatcher::new(&path)
            .poll_interval(Duration::from_millis(20))
            .spawn();

        tokio::time::sleep(Duration::from_millis(60)).await;
        std::fs::write(&path, "appeared\n").unwrap();

        assert_eq!(next(&mut rx).await, LineEvent::Line("appeared".into()));

        drop(rx);
        let _ = handle.await;
    }
}
