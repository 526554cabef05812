//! Boundary contract with the external physics engine
//!
//! The vehicle controller does not own physics memory. It writes wheel
//! parameters through this handle before the engine integrates a step and
//! reads body and wheel state back afterwards; the orchestrator invokes the
//! step itself between the two phases.

use glam::{Quat, Vec3};

/// Per-wheel suspension and friction configuration pushed to the engine
/// when a wheel is registered.
///
/// Defaults are the playground vehicle's tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelTuning {
    pub radius: f32,
    pub suspension_rest_length: f32,
    pub suspension_stiffness: f32,
    pub suspension_compression: f32,
    pub suspension_relaxation: f32,
    pub max_suspension_force: f32,
    pub max_suspension_travel: f32,
    pub friction_slip: f32,
    pub side_friction_stiffness: f32,
}

impl Default for WheelTuning {
    fn default() -> Self {
        Self {
            radius: 0.5,
            suspension_rest_length: 0.125,
            suspension_stiffness: 30.0,
            suspension_compression: 2.0,
            suspension_relaxation: 1.88,
            max_suspension_force: 6000.0,
            max_suspension_travel: 5.0,
            friction_slip: 4.0,
            side_friction_stiffness: 0.6,
        }
    }
}

/// Narrow handle onto the external raycast-vehicle physics engine.
///
/// The constructor sequence guarantees the backing rigid body exists before
/// any wheel is registered, and wheels are registered before the first tick;
/// implementations may therefore assume wheel indices handed to the per-tick
/// calls are valid.
pub trait VehiclePhysics {
    /// Integrate one step. Called exactly once per tick, between the
    /// controller's pre-physics writes and post-physics reads.
    fn step(&mut self, dt: f32);

    /// Register a wheel at a chassis-local mount point with its tuning
    fn add_wheel(&mut self, chassis_mount: Vec3, tuning: &WheelTuning);

    /// Steering angle for one wheel, radians
    fn set_wheel_steering(&mut self, wheel: usize, angle: f32);

    /// Drive force for one wheel, applied during the next step
    fn set_wheel_engine_force(&mut self, wheel: usize, force: f32);

    /// Brake strength for one wheel, applied during the next step
    fn set_wheel_brake(&mut self, wheel: usize, brake: f32);

    /// Whether the wheel's suspension ray hit ground last step
    fn wheel_is_in_contact(&self, wheel: usize) -> bool;

    /// Current suspension length of one wheel
    fn wheel_suspension_length(&self, wheel: usize) -> f32;

    /// Chassis translation in world space
    fn translation(&self) -> Vec3;

    /// Chassis rotation in world space
    fn rotation(&self) -> Quat;

    /// Whether the body is currently asleep in the engine
    fn is_sleeping(&self) -> bool;

    /// Chassis mass, used to scale impulses
    fn mass(&self) -> f32;

    /// Apply a world-space impulse at the center of mass
    fn apply_impulse(&mut self, impulse: Vec3);

    /// Apply a world-space angular impulse
    fn apply_torque_impulse(&mut self, torque: Vec3);

    /// Teleport the body, zeroing its velocities (respawns)
    fn set_pose(&mut self, translation: Vec3, rotation: Quat);
}
