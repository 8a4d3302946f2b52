//! Error types for lookups

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, exchanging or decoding a message.
///
/// Only `Encoding` is ever returned from `Resolver::resolve`. The other kinds are
/// network conditions the resolver absorbs by retrying another nameserver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("reply id {actual} does not match outstanding query id {expected}")]
    TransactionMismatch { expected: u16, actual: u16 },

    #[error("server flagged the response (rcode {0})")]
    ResponseFlagged(u8),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("cannot encode host name: {0}")]
    Encoding(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),
}

impl Error {
    pub fn malformed<S: Into<String>>(msg: S) -> Error {
        Error::MalformedMessage(msg.into())
    }
}
