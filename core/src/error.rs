use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log file not found: {0}")]
    LogFileNotFound(PathBuf),

    #[error("config error: {0}")]
    Config(#[from] confy::ConfyError),
}
