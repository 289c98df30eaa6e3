use std::io;

pub type TapeResult<T, E = Error> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The head would move (or already sits) outside of `[0, L]`, or a read
    /// was attempted at or past the logical length.
    #[error("tape range violation: {0}")]
    RangeViolation(&'static str),

    /// A seek, read, write or flush against the backing file failed.
    #[error("tape io error: {0}")]
    Io(#[from] io::Error),

    /// A latency configuration file was supplied but could not be opened or
    /// parsed as three whitespace-separated non-negative integers.
    #[error("invalid latency configuration ({path}): {reason}")]
    Configuration { path: String, reason: String },

    /// The scratch directory (or the single-source copy shortcut in the
    /// merger) could not be created, read, or removed.
    #[error("filesystem error: {0}")]
    Filesystem(String),
}
