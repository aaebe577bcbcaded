// pelagos_core/src/wire.rs

//! Wire serialization for published messages. Postcard throughout: the
//! publish channel is high-frequency binary, the same trade the archive
//! codec makes.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("wire serialization failed: {0}")]
    Encode(String),
    #[error("wire deserialization failed: {0}")]
    Decode(String),
}

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, WireError> {
    postcard::to_allocvec(msg).map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, WireError> {
    postcard::from_bytes(bytes).map_err(|e| WireError::Decode(e.to_string()))
}
