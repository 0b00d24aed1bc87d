//! Error types.

use thiserror::Error;

/// Result alias for registry and rendering operations.
pub type Result<T> = std::result::Result<T, DnsthingError>;

/// Errors returned while syncing container state into the hosts file.
#[derive(Debug, Error)]
pub enum DnsthingError {
    /// Filesystem I/O failed (typically while locking or rewriting the
    /// hosts file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A Docker API call failed (daemon unreachable, connection lost).
    #[error("docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// The hosts file does not exist. The file is owned by the host system
    /// and is never created here.
    #[error("hosts file not found: {path}")]
    HostsFileNotFound {
        /// The configured path.
        path: String,
    },

    /// The Docker event stream ended. Events are expected to flow for the
    /// lifetime of the daemon, so this is fatal.
    #[error("docker event stream closed")]
    EventStreamClosed,
}

impl DnsthingError {
    /// Returns `true` if this error came from the Docker API rather than
    /// the local filesystem.
    #[must_use]
    pub const fn is_docker(&self) -> bool {
        matches!(self, Self::Docker(_))
    }
}
