use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The transcript, or the chunks already cut from it, cannot be used.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("transcript {} not found", .path.display())]
    Missing { path: PathBuf },
    #[error("transcript {} is empty", .path.display())]
    Empty { path: PathBuf },
    #[error("transcript {} is not valid UTF-8", .path.display())]
    NotUtf8 { path: PathBuf },
    #[error("existing chunks are not contiguous: expected ch_{expected:04}, found ch_{found:04}")]
    Gap { expected: u32, found: u32 },
    #[error("transcript no longer starts with existing chunk ch_{index:04}; it was edited, not appended to")]
    Diverged { index: u32 },
    #[error("max_size must be greater than zero")]
    ZeroMaxSize,
    #[error("invalid turn pattern: {0}")]
    TurnPattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
