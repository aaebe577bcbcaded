// pelagos_sim/src/simulation/plugins/motion.rs

//! The vehicle motion simulation loop. The integrator is built in
//! `OnEnter(Running)`, before the tick system can possibly fire; the tick
//! system additionally guards on the resource's existence, so a tick
//! before initialization is unreachable by construction.

use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

use pelagos_core::messages::OdometryMessage;
use pelagos_core::motion::{AuvKinematics, MotionIntegrator};
use pelagos_core::types::Control;
use pelagos_core::utils::integrators::RK4;
use pelagos_core::wire;

use crate::prelude::*;

/// The single owned motion component. Its lifetime is scoped to the run:
/// dropped with the `App`, never reset.
#[derive(Resource)]
pub struct AuvMotion {
    integrator: MotionIntegrator,
    surge_noise: Normal<f64>,
    heave_noise: Normal<f64>,
    yaw_rate_noise: Normal<f64>,
    /// Set after an integrator fault; no further ticks advance the state.
    halted: bool,
}

impl AuvMotion {
    pub fn integrator(&self) -> &MotionIntegrator {
        &self.integrator
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

pub struct MotionPlugin;

impl Plugin for MotionPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<RunConfig>()
            .expect("RunConfig not found!");
        let period = Duration::from_secs_f64(config.motion.period);

        app.add_systems(OnEnter(AppState::Running), init_motion)
            .add_systems(
                Update,
                advance_motion
                    .in_set(SimulationSet::Motion)
                    .run_if(in_state(AppState::Running))
                    .run_if(resource_exists::<AuvMotion>)
                    .run_if(on_timer(period)),
            );
    }
}

/// Fully constructs the vehicle state before the first tick is allowed to
/// fire.
fn init_motion(mut commands: Commands, config: Res<RunConfig>) {
    let motion = &config.motion;
    let initial_pose = motion.initial_pose.to_isometry();
    info!(
        "Vehicle state initialized at ({:.1}, {:.1}, {:.1}), update period {} s",
        initial_pose.translation.vector.x,
        initial_pose.translation.vector.y,
        initial_pose.translation.vector.z,
        motion.period
    );

    commands.insert_resource(AuvMotion {
        integrator: MotionIntegrator::new(
            Box::new(AuvKinematics),
            Box::new(RK4),
            &initial_pose,
        ),
        // Stddevs are validated at config resolution.
        surge_noise: Normal::new(motion.surge_speed, motion.velocity_noise_stddev).unwrap(),
        heave_noise: Normal::new(motion.heave_speed, motion.velocity_noise_stddev).unwrap(),
        yaw_rate_noise: Normal::new(motion.yaw_rate, motion.yaw_rate_noise_stddev).unwrap(),
        halted: false,
    });
}

/// One motion tick: sample the noisy command, advance the state by exactly
/// one configured period, and emit the updated state. A fault halts this
/// loop and only this loop.
fn advance_motion(
    mut motion: ResMut<AuvMotion>,
    config: Res<RunConfig>,
    mut rng: ResMut<SimulationRng>,
    mut bus: ResMut<TopicBus>,
) {
    if motion.halted {
        return;
    }

    let u = Control::from_vec(vec![
        motion.surge_noise.sample(&mut rng.0),
        motion.heave_noise.sample(&mut rng.0),
        motion.yaw_rate_noise.sample(&mut rng.0),
    ]);

    // One discrete step per tick, independent of wall-clock drift.
    match motion.integrator.step(config.motion.period, &u) {
        Ok(odometry) => match wire::encode(&OdometryMessage::from(&odometry)) {
            Ok(bytes) => {
                if !bus.publish(ODOMETRY_TOPIC, bytes) {
                    warn!("Publish fault: topic '{ODOMETRY_TOPIC}' rejected the message.");
                }
            }
            Err(e) => {
                warn!("Publish fault: {e}. Skipping this tick.");
            }
        },
        Err(fault) => {
            error!("Motion integrator halted: {fault}");
            motion.halted = true;
        }
    }
}
