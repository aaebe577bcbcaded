// pelagos_core/src/survey/load.rs

//! The three mutually exclusive ways a [`SubmapCollection`] comes into
//! existence. The source kind is resolved once at configuration time and
//! dispatched through one capability:
//!
//! ```ignore
//! let loader: Box<dyn SubmapLoader> = source.loader();
//! let collection = loader.load()?;
//! ```
//!
//! Loader failures are fatal to the run; there is no partial-collection
//! retry.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::archive;
use super::raw;
use super::records::SubmapRecord;
use super::SubmapCollection;

/// File extension of simulator-produced submap files.
pub const SUBMAP_FILE_EXT: &str = "submap";

/// Fatal error while populating a submap collection.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input not found: {}", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a recognized archive", path.display())]
    BadMagic { path: PathBuf },
    #[error("archive {} is truncated", path.display())]
    Truncated { path: PathBuf },
    #[error("archive version {found} does not match reader version {expected}")]
    VersionMismatch { found: u16, expected: u16 },
    #[error("malformed payload in {}: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },
}

impl LoadError {
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::Missing { path, source }
        } else {
            LoadError::Io { path, source }
        }
    }
}

/// Capability shared by the closed set of collection sources.
pub trait SubmapLoader {
    fn load(&self) -> Result<SubmapCollection, LoadError>;
}

// --- Simulation directory ---

/// Loads every `*.submap` file found directly under a simulator output
/// directory, one submap per file, pose taken from file content. File-name
/// order defines collection order, so repeated loads of the same directory
/// are stable.
pub struct SimulationDirLoader {
    pub dir: PathBuf,
}

impl SubmapLoader for SimulationDirLoader {
    fn load(&self) -> Result<SubmapCollection, LoadError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.dir.clone());
                match e.into_io_error() {
                    Some(source) => LoadError::from_io(path, source),
                    None => LoadError::Corrupt {
                        path,
                        detail: "directory walk failed".into(),
                    },
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if path.extension().is_some_and(|ext| ext == SUBMAP_FILE_EXT) {
                files.push(path);
            }
        }
        files.sort();

        let mut collection = SubmapCollection::new();
        for path in files {
            let bytes =
                fs::read(&path).map_err(|source| LoadError::from_io(path.clone(), source))?;
            let record: SubmapRecord =
                postcard::from_bytes(&bytes).map_err(|e| LoadError::Corrupt {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
            collection.push(record.into_submap());
        }
        Ok(collection)
    }
}

// --- Raw ground-truth archive ---

/// Reads a raw trajectory archive once, extracts the single pose/cloud pair
/// and the map transform, and yields the resulting singleton collection
/// already expressed in the map frame.
pub struct RawArchiveLoader {
    pub path: PathBuf,
}

impl SubmapLoader for RawArchiveLoader {
    fn load(&self) -> Result<SubmapCollection, LoadError> {
        let survey = raw::read_raw_survey(&self.path)?;
        let (submap, _map_tf) = raw::extract_map(&survey, &self.path)?;

        let mut collection = SubmapCollection::new();
        collection.push(submap);
        Ok(collection)
    }
}

// --- Serialized collection archive ---

/// Deserializes a previously written collection archive. The configured
/// path contributes only its file stem; the fixed `.cereal` extension is
/// appended regardless of the extension supplied.
pub struct SerializedLoader {
    pub path: PathBuf,
}

impl SubmapLoader for SerializedLoader {
    fn load(&self) -> Result<SubmapCollection, LoadError> {
        archive::read_collection(&archive::cereal_path(&self.path))
    }
}

/// Helper used by the simulation data producer and by tests: writes one
/// submap record as a single `*.submap` file.
pub fn write_submap_file(path: &Path, record: &SubmapRecord) -> std::io::Result<()> {
    let bytes = postcard::to_allocvec(record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record_at(x: f64) -> SubmapRecord {
        SubmapRecord {
            position: [x, 0.0, -30.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            points: vec![[x, 1.0, -32.0], [x, 2.0, -33.0]],
        }
    }

    fn populate_dir(dir: &Path, count: usize) {
        for i in 0..count {
            let path = dir.join(format!("patch_{i:03}.submap"));
            write_submap_file(&path, &record_at(i as f64 * 10.0)).unwrap();
        }
    }

    #[test]
    fn test_simulation_dir_yields_one_submap_per_file() {
        let dir = TempDir::new().unwrap();
        populate_dir(dir.path(), 3);
        // Unrelated files are skipped, not errors.
        fs::write(dir.path().join("notes.txt"), b"dive 7, pass 2").unwrap();

        let loader = SimulationDirLoader {
            dir: dir.path().to_path_buf(),
        };
        let collection = loader.load().unwrap();
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_simulation_dir_order_is_stable() {
        let dir = TempDir::new().unwrap();
        populate_dir(dir.path(), 4);

        let loader = SimulationDirLoader {
            dir: dir.path().to_path_buf(),
        };
        let first: Vec<f64> = loader
            .load()
            .unwrap()
            .iter()
            .map(|s| s.pose.translation.vector.x)
            .collect();
        let second: Vec<f64> = loader
            .load()
            .unwrap()
            .iter()
            .map(|s| s.pose.translation.vector.x)
            .collect();

        assert_eq!(first, second);
        assert_eq!(first, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_empty_simulation_dir_yields_empty_collection() {
        let dir = TempDir::new().unwrap();
        let loader = SimulationDirLoader {
            dir: dir.path().to_path_buf(),
        };
        let collection = loader.load().unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_serialized_loader_appends_fixed_extension() {
        // The loader reduces the supplied path to its stem and resolves
        // the archive against the working directory, so the fixture has to
        // live there too.
        let stem = format!("pelagos_loader_test_{}", std::process::id());
        let archive_name = PathBuf::from(format!("{stem}.cereal"));

        let mut collection = SubmapCollection::new();
        collection.push(record_at(0.0).into_submap());
        archive::write_collection(&archive_name, &collection).unwrap();

        let loader = SerializedLoader {
            path: PathBuf::from(format!("/somewhere/else/{stem}.slam")),
        };
        let loaded = loader.load();
        fs::remove_file(&archive_name).unwrap();

        assert_eq!(loaded.unwrap().len(), 1);
    }

    #[test]
    fn test_missing_serialized_archive_is_fatal() {
        let loader = SerializedLoader {
            path: PathBuf::from("no_such_survey.slam"),
        };
        let err = loader.load().unwrap_err();
        assert!(matches!(err, LoadError::Missing { .. }));
    }

    #[test]
    fn test_raw_loader_produces_singleton_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gt.praw");

        let survey = raw::RawSurvey {
            trajectory: vec![
                raw::TrajectorySample {
                    position: [100.0, 200.0, -50.0],
                    orientation: [0.0, 0.0, 0.0, 1.0],
                },
                raw::TrajectorySample {
                    position: [130.0, 200.0, -50.0],
                    orientation: [0.0, 0.0, 0.0, 1.0],
                },
            ],
            beams: vec![[110.0, 201.0, -70.0], [120.0, 199.0, -72.0]],
        };
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&raw::RAW_MAGIC);
        bytes.extend_from_slice(&raw::RAW_VERSION.to_le_bytes());
        bytes.extend_from_slice(&postcard::to_allocvec(&survey).unwrap());
        fs::write(&path, bytes).unwrap();

        let loader = RawArchiveLoader { path };
        let collection = loader.load().unwrap();

        assert_eq!(collection.len(), 1);
        let submap = collection.active().unwrap();
        assert_eq!(submap.point_count(), 2);
        // Pose is re-expressed by the map transform, not the raw UTM pose.
        assert_eq!(submap.pose.translation.vector.x, 30.0);
    }
}
