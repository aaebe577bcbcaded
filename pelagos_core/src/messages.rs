// pelagos_core/src/messages.rs

//! Output messages of the two periodic loops. In-process consumers get the
//! nalgebra-typed [`Odometry`]; everything that crosses the wire uses the
//! plain-field message structs below.

use nalgebra::{Isometry3, Point3, Vector6};
use serde::{Deserialize, Serialize};

/// The motion integrator's per-tick output: the vehicle's full dynamic
/// state in the map frame.
#[derive(Clone, Debug)]
pub struct Odometry {
    pub timestamp: f64,
    pub pose: Isometry3<f64>,
    /// Body-frame twist: `[vx, vy, vz, wx, wy, wz]`.
    pub velocity_body: Vector6<f64>,
}

/// Wire form of one published point cloud, tagged with the reference frame
/// it is expressed in. Points are narrowed to `f32`, which is what the
/// consumers render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCloudMessage {
    pub frame_id: String,
    pub timestamp: f64,
    pub points: Vec<[f32; 3]>,
}

impl PointCloudMessage {
    pub fn from_cloud(frame_id: &str, timestamp: f64, cloud: &[Point3<f64>]) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            timestamp,
            points: cloud
                .iter()
                .map(|p| [p.x as f32, p.y as f32, p.z as f32])
                .collect(),
        }
    }
}

/// Wire form of one vehicle state update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OdometryMessage {
    pub timestamp: f64,
    pub position: [f64; 3],
    /// Orientation as a unit quaternion, `[x, y, z, w]`.
    pub orientation: [f64; 4],
    /// Body-frame twist: `[vx, vy, vz, wx, wy, wz]`.
    pub velocity_body: [f64; 6],
}

impl From<&Odometry> for OdometryMessage {
    fn from(odom: &Odometry) -> Self {
        let t = odom.pose.translation.vector;
        let q = odom.pose.rotation.coords;
        let v = &odom.velocity_body;
        Self {
            timestamp: odom.timestamp,
            position: [t.x, t.y, t.z],
            orientation: [q.x, q.y, q.z, q.w],
            velocity_body: [v[0], v[1], v[2], v[3], v[4], v[5]],
        }
    }
}
