//! Error kinds surfaced by the core (spec §7).
//!
//! Resolver and file-handle failures are recoverable and map onto this enum;
//! invariant violations (a backend handing back an incomplete superblock, a
//! linear-state misuse, freeing an inode nobody holds) are programmer errors
//! and panic at the call site instead, matching the source protocol's
//! abort-on-corruption behaviour.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no such file or directory")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("file exists")]
    Exists,

    #[error("invalid argument")]
    Invalid,

    #[error("destination buffer too small")]
    Fault,

    #[error("too many levels of symbolic links")]
    Loop,

    #[error("backend I/O error: {0}")]
    BackendIo(String),

    #[error(transparent)]
    LocalIo(#[from] io::Error),
}

impl Error {
    /// The `errno` this error kind would have surfaced as on the class, per
    /// spec §6's "Error codes surfaced" table.
    pub fn raw_os_error(&self) -> i32 {
        match self {
            Error::NotFound => libc::ENOENT,
            Error::NotADirectory => libc::ENOTDIR,
            Error::IsADirectory => libc::EISDIR,
            Error::Exists => libc::EEXIST,
            Error::Invalid => libc::EINVAL,
            Error::Fault => libc::EFAULT,
            Error::Loop => libc::ELOOP,
            Error::BackendIo(_) => libc::EIO,
            Error::LocalIo(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::LocalIo(e) => e,
            other => io::Error::from_raw_os_error(other.raw_os_error()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
