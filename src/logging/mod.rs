//! Tracing subscriber setup.
//!
//! The terminal belongs to the UI, so diagnostics go to a file under the
//! data directory. The in-app log panel is fed separately by
//! [`LogBroadcaster`](crate::logs::LogBroadcaster), which also mirrors every
//! entry into tracing under the `flowchat::logs` target.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "flowchat.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "flowchat=debug"
    } else {
        "flowchat=info"
    }
}

/// Install a file-backed subscriber writing to `log_path`.
///
/// `RUST_LOG` wins over the `debug` flag when set. The parent directory is
/// created even if a subscriber turns out to be installed already.
pub fn init(log_path: &Path, debug: bool) -> Result<(), LoggingError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;
    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "flowchat=info");
        assert_eq!(default_directive(true), "flowchat=debug");
    }

    #[test]
    fn test_init_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        let log_file = dir.path().join("logs").join(LOG_FILE_NAME);

        // Another test may already own the global subscriber
        match init(&log_file, false) {
            Ok(()) | Err(LoggingError::SubscriberAlreadySet) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }

        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_init_rejects_path_without_file_name() {
        let result = init(Path::new("/"), false);
        assert!(matches!(result, Err(LoggingError::InvalidPath(_))));
    }
}
