// pelagos_sim/src/simulation/plugins/survey.rs

//! The submap pipeline's in-app half: the one-time downsampling pass while
//! the node is still in `Loading`, then the fixed-rate publish loop.
//!
//! The loader has already run to completion in `main` by the time this
//! plugin's first system fires, and the `Loading` -> `Running` transition
//! puts the downsampling pass strictly before the first publish tick, so
//! the collection is never mutated concurrently.

use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;
use std::time::Duration;

use pelagos_core::filter::UniformSampler;
use pelagos_core::messages::PointCloudMessage;
use pelagos_core::survey::SubmapCollection;
use pelagos_core::types::MAP_FRAME;
use pelagos_core::wire;

use crate::prelude::*;

/// The loaded (and, once `Running`, downsampled) submap collection. Sole
/// owner of the survey data for the whole run.
#[derive(Resource)]
pub struct SurveyData {
    pub collection: SubmapCollection,
}

/// The validated downsampler, built once at startup.
#[derive(Resource)]
pub struct CloudFilter(pub UniformSampler);

pub struct SurveyPlugin;

impl Plugin for SurveyPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<RunConfig>()
            .expect("RunConfig not found!");
        let publish_period = Duration::from_secs_f64(config.survey.publish_period);

        app.add_systems(
            OnEnter(AppState::Loading),
            (downsample_submaps, transition_to_running).chain(),
        )
        .add_systems(
            Update,
            publish_point_cloud
                .in_set(SimulationSet::Publish)
                .run_if(in_state(AppState::Running))
                .run_if(on_timer(publish_period)),
        );
    }
}

/// Runs once, before any periodic system: replaces every cloud with its
/// bounded-density subset.
fn downsample_submaps(mut survey: ResMut<SurveyData>, filter: Res<CloudFilter>) {
    if survey.collection.is_empty() {
        warn!("Submap collection is empty; the publish loop will emit nothing.");
        return;
    }

    let dense = survey.collection.total_points();
    survey.collection.downsample(&filter.0);
    info!(
        "Downsampled {} submaps: {} -> {} points (radius {})",
        survey.collection.len(),
        dense,
        survey.collection.total_points(),
        filter.0.radius()
    );
}

/// Runs once at the end of the `Loading` chain. Its only job is to move
/// the app into the main `Running` state.
fn transition_to_running(mut next_state: ResMut<NextState<AppState>>) {
    info!("Survey preparation complete. Transitioning to Running state.");
    next_state.set(AppState::Running);
}

/// One publish tick: encode the active submap's cloud and emit it,
/// fire-and-forget. A fault is logged and the loop carries on.
fn publish_point_cloud(survey: Res<SurveyData>, time: Res<Time>, mut bus: ResMut<TopicBus>) {
    let Some(submap) = survey.collection.active() else {
        return;
    };

    let message = PointCloudMessage::from_cloud(MAP_FRAME, time.elapsed_secs_f64(), &submap.cloud);
    match wire::encode(&message) {
        Ok(bytes) => {
            if !bus.publish(POINT_CLOUD_TOPIC, bytes) {
                warn!("Publish fault: topic '{POINT_CLOUD_TOPIC}' rejected the message.");
            }
        }
        Err(e) => {
            warn!("Publish fault: {e}. Skipping this tick.");
        }
    }
}
