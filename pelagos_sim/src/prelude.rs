// pelagos_sim/src/prelude.rs

pub use crate::simulation::config::{ConfigError, RunConfig, SourceConfig};
pub use crate::simulation::core::app_state::{AppState, SimulationSet};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::core::topics::{
    TopicBus, TopicReader, ODOMETRY_TOPIC, POINT_CLOUD_TOPIC,
};
