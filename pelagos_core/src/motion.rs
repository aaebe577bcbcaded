// pelagos_core/src/motion.rs

//! The vehicle motion simulation: a kinematic model plus the integrator
//! that owns the vehicle state and advances it one discrete step per tick.

use std::fmt::Debug;

use dyn_clone::DynClone;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector6};

use crate::messages::Odometry;
use crate::types::{Control, State};
use crate::utils::integrators::Integrator;

// State vector layout shared by all motion models: the first six entries
// are the pose block.
pub const PX: usize = 0;
pub const PY: usize = 1;
pub const PZ: usize = 2;
pub const ROLL: usize = 3;
pub const PITCH: usize = 4;
pub const YAW: usize = 5;

// Control vector layout.
pub const SURGE: usize = 0;
pub const HEAVE: usize = 1;
pub const YAW_RATE: usize = 2;

/// Kinematic model of the vehicle. `x_dot = f(x, u, t)`.
///
/// Implementations must be `Send + Sync` so the owning integrator can live
/// in a framework resource.
pub trait MotionModel: Debug + DynClone + Send + Sync {
    fn state_dim(&self) -> usize;

    fn control_dim(&self) -> usize;

    /// Computes the time derivative of the state vector.
    fn derivatives(&self, x: &State, u: &Control, t: f64) -> State;

    /// Propagates the state forward by `dt` using a numerical integrator,
    /// with the control input held constant over the step.
    fn propagate(
        &self,
        x: &State,
        u: &Control,
        t: f64,
        dt: f64,
        integrator: &dyn Integrator<f64>,
    ) -> State {
        assert!(dt >= 0.0, "MotionModel::propagate: dt cannot be negative");

        // A control vector of the wrong dimension is replaced by zeros
        // rather than indexed out of bounds.
        let zeros;
        let u_actual = if u.nrows() == self.control_dim() {
            u
        } else {
            zeros = Control::zeros(self.control_dim());
            &zeros
        };

        let func =
            |func_x: &State, func_t: f64| -> State { self.derivatives(func_x, u_actual, func_t) };
        integrator.step(&func, x, t, t + dt)
    }
}

dyn_clone::clone_trait_object!(MotionModel);

/// Planar-heading AUV kinematics with independent heave.
///
/// State `[x, y, z, roll, pitch, yaw]`, control `[surge, heave, yaw_rate]`:
/// surge advances along the current heading, heave changes depth, roll and
/// pitch stay fixed.
#[derive(Clone, Debug, Default)]
pub struct AuvKinematics;

impl MotionModel for AuvKinematics {
    fn state_dim(&self) -> usize {
        6
    }

    fn control_dim(&self) -> usize {
        3
    }

    fn derivatives(&self, x: &State, u: &Control, _t: f64) -> State {
        let yaw = x[YAW];
        let mut x_dot = State::zeros(6);
        x_dot[PX] = yaw.cos() * u[SURGE];
        x_dot[PY] = yaw.sin() * u[SURGE];
        x_dot[PZ] = u[HEAVE];
        x_dot[YAW] = u[YAW_RATE];
        x_dot
    }
}

/// Fault raised by a kinematics step. Further ticks must halt rather than
/// propagate a corrupted state downstream.
#[derive(Debug, thiserror::Error)]
pub enum IntegratorFault {
    #[error("kinematics step produced a non-finite vehicle state at t = {t:.3} s")]
    NonFinite { t: f64 },
}

/// Owns the vehicle state and advances it exactly once per timer tick.
///
/// Construction is initialization: an integrator cannot exist without a
/// fully built vehicle state, so no tick can observe an uninitialized one.
/// Shutdown simply stops calling [`MotionIntegrator::step`]; the state is
/// never reset.
pub struct MotionIntegrator {
    model: Box<dyn MotionModel>,
    integrator: Box<dyn Integrator<f64> + Send + Sync>,
    x: State,
    t: f64,
    ticks: u64,
}

impl MotionIntegrator {
    pub fn new(
        model: Box<dyn MotionModel>,
        integrator: Box<dyn Integrator<f64> + Send + Sync>,
        initial_pose: &Isometry3<f64>,
    ) -> Self {
        let mut x = State::zeros(model.state_dim());
        let translation = initial_pose.translation.vector;
        let (roll, pitch, yaw) = initial_pose.rotation.euler_angles();
        x[PX] = translation.x;
        x[PY] = translation.y;
        x[PZ] = translation.z;
        x[ROLL] = roll;
        x[PITCH] = pitch;
        x[YAW] = yaw;

        Self {
            model,
            integrator,
            x,
            t: 0.0,
            ticks: 0,
        }
    }

    pub fn state(&self) -> &State {
        &self.x
    }

    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.x[PX], self.x[PY], self.x[PZ]),
            UnitQuaternion::from_euler_angles(self.x[ROLL], self.x[PITCH], self.x[YAW]),
        )
    }

    /// Simulated time advanced so far.
    pub fn elapsed(&self) -> f64 {
        self.t
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances the vehicle state by one discrete step of length `dt` and
    /// returns the updated state as odometry.
    ///
    /// On a fault the previous state is kept; the corrupted candidate is
    /// discarded.
    pub fn step(&mut self, dt: f64, u: &Control) -> Result<Odometry, IntegratorFault> {
        let next = self
            .model
            .propagate(&self.x, u, self.t, dt, self.integrator.as_ref());
        if next.iter().any(|v| !v.is_finite()) {
            return Err(IntegratorFault::NonFinite { t: self.t });
        }

        self.x = next;
        self.t += dt;
        self.ticks += 1;

        let surge = u.get(SURGE).copied().unwrap_or(0.0);
        let heave = u.get(HEAVE).copied().unwrap_or(0.0);
        let yaw_rate = u.get(YAW_RATE).copied().unwrap_or(0.0);
        Ok(Odometry {
            timestamp: self.t,
            pose: self.pose(),
            velocity_body: Vector6::new(surge, 0.0, heave, 0.0, 0.0, yaw_rate),
        })
    }
}
