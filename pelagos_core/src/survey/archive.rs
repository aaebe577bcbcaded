// pelagos_core/src/survey/archive.rs

//! Binary archive codec for a whole [`SubmapCollection`].
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────┬───────────────┬────────────────────────────┐
//! │ Magic "PMAP" (4) │ Version (u16) │ Postcard Vec<SubmapRecord> │
//! └──────────────────┴───────────────┴────────────────────────────┘
//! ```
//!
//! Write then read round-trips a collection exactly: identical submap
//! count and identical (pose, point count) per submap.

use std::fs;
use std::path::{Path, PathBuf};

use super::load::LoadError;
use super::records::SubmapRecord;
use super::SubmapCollection;

pub const ARCHIVE_MAGIC: [u8; 4] = *b"PMAP";
pub const ARCHIVE_VERSION: u16 = 1;
/// Fixed extension appended to archive basenames.
pub const ARCHIVE_EXT: &str = "cereal";

const HEADER_LEN: usize = 6;

/// Error writing a collection archive.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to write archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode archive payload: {0}")]
    Encode(String),
}

/// Reduces any configured path to `<file stem>.cereal`, dropping directory
/// components and the supplied extension. The result is resolved against
/// the working directory; this matches the long-standing CLI contract.
pub fn cereal_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    PathBuf::from(stem).with_extension(ARCHIVE_EXT)
}

/// Serializes the collection to exactly `target`.
pub fn write_collection(target: &Path, collection: &SubmapCollection) -> Result<(), SaveError> {
    let records: Vec<SubmapRecord> = collection.iter().map(SubmapRecord::from).collect();
    let payload =
        postcard::to_allocvec(&records).map_err(|e| SaveError::Encode(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&ARCHIVE_MAGIC);
    bytes.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);

    fs::write(target, bytes).map_err(|source| SaveError::Io {
        path: target.to_path_buf(),
        source,
    })
}

/// Reads a collection archive from exactly `target`.
pub fn read_collection(target: &Path) -> Result<SubmapCollection, LoadError> {
    let bytes = fs::read(target).map_err(|source| LoadError::from_io(target.to_path_buf(), source))?;
    decode_collection(target, &bytes)
}

fn decode_collection(path: &Path, bytes: &[u8]) -> Result<SubmapCollection, LoadError> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::Truncated {
            path: path.to_path_buf(),
        });
    }
    if bytes[..4] != ARCHIVE_MAGIC {
        return Err(LoadError::BadMagic {
            path: path.to_path_buf(),
        });
    }
    let found = u16::from_le_bytes([bytes[4], bytes[5]]);
    if found != ARCHIVE_VERSION {
        return Err(LoadError::VersionMismatch {
            found,
            expected: ARCHIVE_VERSION,
        });
    }

    let records: Vec<SubmapRecord> =
        postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| LoadError::Corrupt {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(records.into_iter().map(SubmapRecord::into_submap).collect())
}
