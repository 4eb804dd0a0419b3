//! Error types for sfs-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("file not found")]
    NotFound,

    #[error("file already exists")]
    Exists,

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("out of bounds: requested {requested} bytes, {available} available")]
    OutOfBounds { requested: u64, available: u64 },

    #[error("invalid file name")]
    InvalidName,

    #[error("device error: {0}")]
    Device(#[from] std::io::Error),

    #[error("record decode error: {0}")]
    Codec(#[from] binrw::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
