// pelagos_sim/src/simulation/core/setup.rs

use bevy::prelude::*;
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::prelude::*;
use crate::simulation::core::topics::TopicTag;

pub struct NodeSetupPlugin;

impl Plugin for NodeSetupPlugin {
    fn build(&self, app: &mut App) {
        // This plugin's job is to read the config and add the shared
        // resources every other plugin builds on.
        let config = app
            .world()
            .get_resource::<RunConfig>()
            .expect("RunConfig not found!");

        // --- 1. Add the Deterministic PRNG Resource ---
        let rng = match config.run.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut OsRng).expect("OS RNG failed"),
        };
        let limited = config.run.duration_seconds.is_some();
        app.insert_resource(SimulationRng(rng));

        // --- 2. Create the Output Topics ---
        let mut bus = TopicBus::default();
        bus.create_topic::<Vec<u8>>(POINT_CLOUD_TOPIC, 4, TopicTag::PointCloud);
        bus.create_topic::<Vec<u8>>(ODOMETRY_TOPIC, 16, TopicTag::Odometry);
        app.insert_resource(bus);

        // --- 3. Declare the Two Independent Loops ---
        // No ordering between them: they share no data.
        app.configure_sets(Update, (SimulationSet::Publish, SimulationSet::Motion));

        if limited {
            app.add_systems(
                Update,
                stop_after_duration.run_if(in_state(AppState::Running)),
            );
        }
    }
}

/// Shuts the node down once the configured run duration elapses. Without a
/// configured duration the node runs until the process is signaled.
fn stop_after_duration(
    time: Res<Time>,
    config: Res<RunConfig>,
    mut exit: EventWriter<AppExit>,
) {
    if let Some(limit) = config.run.duration_seconds {
        if time.elapsed_secs_f64() >= limit {
            info!("Run duration of {limit} s reached. Shutting down.");
            exit.write(AppExit::Success);
        }
    }
}
