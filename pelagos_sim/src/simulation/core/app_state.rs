// pelagos_sim/src/simulation/core/app_state.rs

use bevy::{ecs::schedule::SystemSet, prelude::States};

/// Defines the major phases of the node's lifecycle.
#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// The one-time ingestion phase: the loaded collection is downsampled
    /// here, strictly before any periodic system runs. The app starts here.
    #[default]
    Loading,

    /// Both periodic loops are live. There is no way back to `Loading`.
    Running,
}

/// The two independent periodic loops. They share no data, so no ordering
/// is imposed between them.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// The fixed-rate point-cloud publish loop.
    Publish,
    /// The vehicle motion simulation tick.
    Motion,
}
