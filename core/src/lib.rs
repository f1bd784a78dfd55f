pub mod config;
pub mod error;
pub mod events;
pub mod power_log;
pub mod reader;
pub mod session;
pub mod tracker;
pub mod watcher;

// Re-exports for convenience
pub use error::WatchError;
pub use events::{EventSink, MatchEvent};
pub use power_log::{LogToken, parse_line};
pub use session::TrackerSession;
pub use tracker::MatchTracker;
pub use watcher::{LineEvent, LogWatcher};
