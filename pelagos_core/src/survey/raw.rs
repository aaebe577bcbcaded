// pelagos_core/src/survey/raw.rs

//! Reader for raw AUV ground-truth archives.
//!
//! A raw archive carries a surveyed trajectory and the sonar beam returns
//! in the acquisition (world) frame, with the large absolute offsets that
//! frame implies. Loading extracts exactly one pose/cloud pair plus one
//! [`MapTransform`] that re-anchors the survey in a local map frame. This
//! extraction happens once per process start.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use super::load::LoadError;
use super::{MapTransform, Submap};

pub const RAW_MAGIC: [u8; 4] = *b"PRAW";
pub const RAW_VERSION: u16 = 1;

const HEADER_LEN: usize = 6;

/// One sample of the surveyed vehicle trajectory, world frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub position: [f64; 3],
    /// Orientation as a unit quaternion, `[x, y, z, w]`.
    pub orientation: [f64; 4],
}

impl TrajectorySample {
    fn to_isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.position;
        let [qx, qy, qz, qw] = self.orientation;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz)),
        )
    }
}

/// In-memory form of a raw ground-truth archive. Read-only input; the
/// pipeline never writes this format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawSurvey {
    pub trajectory: Vec<TrajectorySample>,
    /// Sonar beam returns, world frame.
    pub beams: Vec<[f64; 3]>,
}

pub fn read_raw_survey(path: &Path) -> Result<RawSurvey, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::from_io(path.to_path_buf(), source))?;
    decode_raw_survey(path, &bytes)
}

fn decode_raw_survey(path: &Path, bytes: &[u8]) -> Result<RawSurvey, LoadError> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::Truncated {
            path: path.to_path_buf(),
        });
    }
    if bytes[..4] != RAW_MAGIC {
        return Err(LoadError::BadMagic {
            path: path.to_path_buf(),
        });
    }
    let found = u16::from_le_bytes([bytes[4], bytes[5]]);
    if found != RAW_VERSION {
        return Err(LoadError::VersionMismatch {
            found,
            expected: RAW_VERSION,
        });
    }
    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| LoadError::Corrupt {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Computes the single submap and the map transform from a raw survey.
///
/// The transform is the inverse of the first trajectory sample's pose, so
/// the survey is expressed relative to where acquisition began. The submap
/// pose is the (re-expressed) final trajectory sample; its cloud is every
/// beam, re-expressed.
pub fn extract_map(raw: &RawSurvey, path: &Path) -> Result<(Submap, MapTransform), LoadError> {
    let (Some(first), Some(last)) = (raw.trajectory.first(), raw.trajectory.last()) else {
        return Err(LoadError::Corrupt {
            path: path.to_path_buf(),
            detail: "raw survey has no trajectory samples".into(),
        });
    };

    let map_tf: MapTransform = first.to_isometry().inverse();
    let pose = map_tf * last.to_isometry();
    let cloud = raw
        .beams
        .iter()
        .map(|&[x, y, z]| map_tf * Point3::new(x, y, z))
        .collect();

    Ok((Submap::new(pose, cloud), map_tf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::TempDir;

    fn encode_raw_survey(raw: &RawSurvey) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&RAW_MAGIC);
        bytes.extend_from_slice(&RAW_VERSION.to_le_bytes());
        bytes.extend_from_slice(&postcard::to_allocvec(raw).unwrap());
        bytes
    }

    fn utm_survey() -> RawSurvey {
        // Positions carry UTM-sized offsets on purpose.
        RawSurvey {
            trajectory: vec![
                TrajectorySample {
                    position: [651_000.0, 6_470_000.0, -85.0],
                    orientation: [0.0, 0.0, 0.0, 1.0],
                },
                TrajectorySample {
                    position: [651_040.0, 6_470_030.0, -85.0],
                    orientation: [0.0, 0.0, 0.0, 1.0],
                },
            ],
            beams: vec![[651_010.0, 6_470_005.0, -110.0]],
        }
    }

    #[test]
    fn test_read_round_trips_the_external_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gt.praw");
        fs::write(&path, encode_raw_survey(&utm_survey())).unwrap();

        let raw = read_raw_survey(&path).unwrap();
        assert_eq!(raw.trajectory.len(), 2);
        assert_eq!(raw.beams.len(), 1);
    }

    #[test]
    fn test_extract_map_re_anchors_at_first_sample() {
        let raw = utm_survey();
        let (submap, map_tf) = extract_map(&raw, Path::new("gt.praw")).unwrap();

        // The transform moves the first sample to the origin...
        let anchored = map_tf * raw.trajectory[0].to_isometry();
        assert_abs_diff_eq!(anchored.translation.vector.norm(), 0.0, epsilon = 1e-9);

        // ...and the submap pose is the re-expressed final sample.
        assert_abs_diff_eq!(submap.pose.translation.vector.x, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(submap.pose.translation.vector.y, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(submap.pose.translation.vector.z, 0.0, epsilon = 1e-9);

        // Beams lose their UTM offset too.
        assert_abs_diff_eq!(submap.cloud[0].x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(submap.cloud[0].y, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(submap.cloud[0].z, -25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_trajectory_is_corrupt() {
        let raw = RawSurvey {
            trajectory: vec![],
            beams: vec![],
        };
        let err = extract_map(&raw, Path::new("gt.praw")).unwrap_err();
        assert!(matches!(err, LoadError::Corrupt { .. }));
    }

    #[test]
    fn test_wrong_magic_is_rejected() {
        let err = decode_raw_survey(Path::new("bad.praw"), b"PMAP\x01\x00").unwrap_err();
        assert!(matches!(err, LoadError::BadMagic { .. }));
    }
}
