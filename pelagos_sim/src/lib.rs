// pelagos_sim/src/lib.rs

use bevy::prelude::*;

// Import the plugins defined within the simulation crate.
use crate::simulation::core::setup::NodeSetupPlugin;
use crate::simulation::plugins::motion::MotionPlugin;
use crate::simulation::plugins::survey::SurveyPlugin;

// This prelude is for convenience for other files WITHIN the pelagos_sim crate.
pub mod prelude;

// This module contains all the node-specific logic.
pub mod cli;
pub mod simulation;

/// The main plugin that brings together all the node's parts.
/// `main.rs` just adds this one plugin to the Bevy App.
pub struct PelagosNodePlugin;

impl Plugin for PelagosNodePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // Core setup: PRNG, topic bus, run-duration watchdog.
            NodeSetupPlugin,
            // One-time downsampling pass, then the periodic publish loop.
            SurveyPlugin,
            // The vehicle motion simulation on its own timer.
            MotionPlugin,
        ));
    }
}
