// pelagos_core/src/survey/records.rs

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use super::Submap;

/// Serialized twin of [`Submap`]. Archive and submap files store plain
/// numeric fields; conversion to nalgebra types happens only at this
/// boundary, so the on-disk schema does not follow nalgebra's internals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmapRecord {
    pub position: [f64; 3],
    /// Acquisition orientation as a unit quaternion, `[x, y, z, w]`.
    pub orientation: [f64; 4],
    pub points: Vec<[f64; 3]>,
}

impl SubmapRecord {
    pub fn into_submap(self) -> Submap {
        let [x, y, z] = self.position;
        let [qx, qy, qz, qw] = self.orientation;
        let pose = Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz)),
        );
        let cloud = self
            .points
            .into_iter()
            .map(|[px, py, pz]| Point3::new(px, py, pz))
            .collect();
        Submap::new(pose, cloud)
    }
}

impl From<&Submap> for SubmapRecord {
    fn from(submap: &Submap) -> Self {
        let t = submap.pose.translation.vector;
        let q = submap.pose.rotation.coords;
        Self {
            position: [t.x, t.y, t.z],
            orientation: [q.x, q.y, q.z, q.w],
            points: submap.cloud.iter().map(|p| [p.x, p.y, p.z]).collect(),
        }
    }
}
