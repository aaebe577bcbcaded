// pelagos_core/src/prelude.rs

pub use crate::filter::{FilterError, UniformSampler};
pub use crate::messages::{Odometry, OdometryMessage, PointCloudMessage};
pub use crate::motion::{AuvKinematics, IntegratorFault, MotionIntegrator, MotionModel};
pub use crate::survey::load::{
    LoadError, RawArchiveLoader, SerializedLoader, SimulationDirLoader, SubmapLoader,
};
pub use crate::survey::{MapTransform, Submap, SubmapCollection};
pub use crate::types::{Control, State, MAP_FRAME};
pub use crate::utils::integrators::{Integrator, RK1, RK4};
