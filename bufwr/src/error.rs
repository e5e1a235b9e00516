use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("capacity must be greater than zero")]
    InvalidCapacity,

    #[error("flush delay must be greater than zero")]
    InvalidFlushDelay,

    #[error("failed to spawn flusher thread: {0}")]
    Spawn(#[source] io::Error),

    /// The sink rejected a flush. Only ever seen by the error observer.
    #[error("sink write failed: {0}")]
    Sink(#[from] io::Error),
}

impl Error {
    /// The underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Error::Spawn(e) | Error::Sink(e) => Some(e),
            _ => None,
        }
    }
}
