// pelagos_core/src/types.rs

use nalgebra::DVector;

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Control = DVector<f64>;

/// Frame identifier stamped onto every published point cloud. All submap
/// poses and clouds are expressed in this frame once loading completes.
pub const MAP_FRAME: &str = "map";
