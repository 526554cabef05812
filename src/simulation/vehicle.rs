//! Vehicle dynamics controller
//!
//! Wraps the external raycast-vehicle physics handle. Every tick it turns
//! the sampled driver intent into per-wheel forces before the engine
//! integrates, then derives the observable vehicle states from the
//! integrated result: speed, orientation, wheel contact, and the stopped /
//! flipped / stuck flags with their hysteresis and debounce behavior.

use glam::{Quat, Vec3};

use super::physics::{VehiclePhysics, WheelTuning};
use super::types::{DriverIntent, FRONT_WHEELS, WHEEL_COUNT};

/// Tunable parameters for the vehicle controller.
///
/// Defaults are the playground vehicle's tuning.
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Peak drive force per wheel at full throttle
    pub engine_force_max: f32,
    /// Drive force multiplier while boosting
    pub engine_boost_multiplier: f32,
    /// Rolling-resistance brake always applied while driving
    pub brake_perpetual_strength: f32,
    /// Brake applied while the brake input is held
    pub brake_strength: f32,
    /// Steering clamp, radians
    pub steering_max: f32,
    /// Upward jump impulse per unit of chassis mass
    pub jump_force: f32,
    /// Yaw impulse per unit of mass when jumping with steering held
    pub jump_spin_torque: f32,
    /// Below this speed the vehicle counts as stopped
    pub stop_low_edge: f32,
    /// Above this speed the vehicle counts as moving again
    pub stop_high_edge: f32,
    /// Upside-down ratio above which the vehicle counts as flipped
    pub flip_edge: f32,
    /// Seconds of sustained flipped-and-stopped before auto recovery
    pub stuck_duration: f32,
    /// Upward recovery impulse per unit of mass
    pub recovery_impulse: f32,
    /// Corrective torque per unit of mass, scaled by the upside-down ratio
    pub recovery_torque: f32,
    /// Exponential smoothing rate for the presentation steering angle
    pub visual_steering_smoothing: f32,
    pub wheel_tuning: WheelTuning,
    /// Chassis-local wheel mount points; front pair first in each side
    pub wheel_mounts: [Vec3; WHEEL_COUNT],
}

impl Default for VehicleConfig {
    fn default() -> Self {
        let offset = Vec3::new(0.75, -0.2, 0.8);
        Self {
            engine_force_max: 10.0,
            engine_boost_multiplier: 2.0,
            brake_perpetual_strength: 0.04,
            brake_strength: 1.0,
            steering_max: 0.5,
            jump_force: 4.0,
            jump_spin_torque: 3.0,
            stop_low_edge: 0.5,
            stop_high_edge: 1.0,
            flip_edge: 0.7,
            stuck_duration: 3.0,
            recovery_impulse: 6.0,
            recovery_torque: 5.0,
            visual_steering_smoothing: 16.0,
            wheel_tuning: WheelTuning::default(),
            wheel_mounts: [
                Vec3::new(offset.x, offset.y, offset.z),
                Vec3::new(offset.x, offset.y, -offset.z),
                Vec3::new(-offset.x, offset.y, offset.z),
                Vec3::new(-offset.x, offset.y, -offset.z),
            ],
        }
    }
}

/// Runtime state of one wheel, owned by the controller
#[derive(Debug, Clone, Copy, Default)]
pub struct WheelState {
    /// Chassis-local mount point
    pub base_position: Vec3,
    pub in_contact: bool,
    pub suspension_length: f32,
    /// Steering angle, non-zero on the front pair only
    pub steering_angle: f32,
    /// Accumulated spin for presentation
    pub visual_spin: f32,
}

/// Stop/Move hysteresis states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotionState {
    Moving,
    Stopped,
}

/// Events produced by a post-physics update, consumed by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleEvent {
    /// The flip threshold was crossed. `flipped` is the new state;
    /// `direction` is the sign of the pitch rate at the crossing
    /// (+1 pitching forward, -1 pitching backward).
    FlipEdge { direction: i8, flipped: bool },
    /// The debounced stuck state changed
    StuckChanged { stuck: bool },
    /// An automatic recovery impulse was applied while stuck
    Recovered { ratio: f32 },
}

/// Per-vehicle controller over an external physics body
pub struct VehicleController {
    config: VehicleConfig,
    wheels: [WheelState; WHEEL_COUNT],

    // Intent-derived, consumed once per step
    engine_force: f32,
    steering: f32,
    brake: f32,
    visual_steering: f32,

    // Derived each post-physics phase
    position: Vec3,
    forward: Vec3,
    speed: f32,
    upside_down_ratio: f32,
    in_contact_count: usize,

    // State machines
    motion: MotionState,
    stopped_since: f64,
    flipped: bool,
    /// Raw flipped-and-stopped compound condition, tracked for its edges
    compound_stuck: bool,
    /// Debounced stuck state, set when the recovery deadline fires
    stuck: bool,
    /// Sim-clock deadline for auto recovery; arming replaces any pending one
    recovery_deadline: Option<f64>,

    clock: f64,
    last_translation: Vec3,
    last_rotation: Quat,
}

impl VehicleController {
    /// Register the wheels on the physics body and read the initial pose.
    ///
    /// The body must already exist in the engine; wheels are registered here,
    /// before the first tick can touch them.
    pub fn new(config: VehicleConfig, physics: &mut dyn VehiclePhysics) -> Self {
        let mut wheels = [WheelState::default(); WHEEL_COUNT];
        for (index, mount) in config.wheel_mounts.iter().enumerate() {
            physics.add_wheel(*mount, &config.wheel_tuning);
            wheels[index].base_position = *mount;
            wheels[index].suspension_length = config.wheel_tuning.suspension_rest_length;
        }

        let translation = physics.translation();
        let rotation = physics.rotation();
        let up = rotation * Vec3::Y;

        Self {
            upside_down_ratio: (up.dot(Vec3::NEG_Y) * 0.5 + 0.5).clamp(0.0, 1.0),
            config,
            wheels,
            engine_force: 0.0,
            steering: 0.0,
            brake: 0.0,
            visual_steering: 0.0,
            position: translation,
            forward: rotation * Vec3::Z,
            speed: 0.0,
            in_contact_count: 0,
            motion: MotionState::Moving,
            stopped_since: 0.0,
            flipped: false,
            compound_stuck: false,
            stuck: false,
            recovery_deadline: None,
            clock: 0.0,
            last_translation: translation,
            last_rotation: rotation,
        }
    }

    /// Translate driver intent into wheel parameters for the coming step
    pub fn pre_physics(&mut self, intent: &DriverIntent, physics: &mut dyn VehiclePhysics) {
        let mut engine_force = intent.accelerating() * self.config.engine_force_max;
        if intent.boost {
            engine_force *= self.config.engine_boost_multiplier;
        }

        let mut brake = self.config.brake_perpetual_strength;
        if intent.brake {
            engine_force = 0.0;
            brake = self.config.brake_strength;
        }

        self.engine_force = engine_force;
        self.brake = brake;
        self.steering =
            (intent.steering() * self.config.steering_max).clamp(-self.config.steering_max, self.config.steering_max);

        for index in 0..WHEEL_COUNT {
            physics.set_wheel_engine_force(index, self.engine_force);
            physics.set_wheel_brake(index, self.brake);
        }
        for index in FRONT_WHEELS {
            physics.set_wheel_steering(index, self.steering);
            self.wheels[index].steering_angle = self.steering;
        }
    }

    /// Read back the integrated step, run the state machines and fire any
    /// pending auto recovery. Returns the state transitions of this tick.
    pub fn post_physics(&mut self, physics: &mut dyn VehiclePhysics, dt: f32) -> Vec<VehicleEvent> {
        self.clock += f64::from(dt);
        let mut events = Vec::new();

        // A sleeping body reads as stationary with no wheel contact
        let sleeping = physics.is_sleeping();
        let translation = physics.translation();
        let rotation = physics.rotation();

        let delta = translation - self.last_translation;
        let horizontal = Vec3::new(delta.x, 0.0, delta.z);
        self.speed = if sleeping || dt <= 0.0 {
            0.0
        } else {
            horizontal.length() / dt
        };
        self.position = translation;
        self.forward = rotation * Vec3::Z;

        let up = rotation * Vec3::Y;
        self.upside_down_ratio = (up.dot(Vec3::NEG_Y) * 0.5 + 0.5).clamp(0.0, 1.0);

        // Flip machine
        let was_flipped = self.flipped;
        self.flipped = self.upside_down_ratio > self.config.flip_edge;
        if self.flipped != was_flipped {
            events.push(VehicleEvent::FlipEdge {
                direction: self.pitch_direction(rotation),
                flipped: self.flipped,
            });
        }

        // Stop machine; the band between the edges holds the current state
        match self.motion {
            MotionState::Moving if self.speed < self.config.stop_low_edge => {
                self.motion = MotionState::Stopped;
                self.stopped_since = self.clock;
            }
            MotionState::Stopped if self.speed > self.config.stop_high_edge => {
                self.motion = MotionState::Moving;
            }
            _ => {}
        }

        // Stuck compound condition, armed on its rising edge only
        let compound = self.flipped && self.motion == MotionState::Stopped;
        if compound != self.compound_stuck {
            self.compound_stuck = compound;
            if compound {
                self.recovery_deadline =
                    Some(self.clock + f64::from(self.config.stuck_duration));
            } else {
                self.recovery_deadline = None;
                if self.stuck {
                    self.stuck = false;
                    events.push(VehicleEvent::StuckChanged { stuck: false });
                }
            }
        }

        if let Some(deadline) = self.recovery_deadline {
            if self.clock >= deadline {
                self.recovery_deadline = None;
                if self.compound_stuck {
                    let ratio = self.upside_down_ratio;
                    self.apply_recovery(physics, up, ratio);
                    if !self.stuck {
                        self.stuck = true;
                        events.push(VehicleEvent::StuckChanged { stuck: true });
                    }
                    events.push(VehicleEvent::Recovered { ratio });
                }
            }
        }

        // Wheel readback
        self.in_contact_count = 0;
        for index in 0..WHEEL_COUNT {
            let in_contact = !sleeping && physics.wheel_is_in_contact(index);
            if in_contact {
                self.in_contact_count += 1;
            }
            let wheel = &mut self.wheels[index];
            wheel.in_contact = in_contact;
            wheel.suspension_length = physics.wheel_suspension_length(index);
            wheel.visual_spin += self.engine_force * 0.01;
        }

        self.visual_steering += (self.steering - self.visual_steering)
            * (dt * self.config.visual_steering_smoothing).min(1.0);

        self.last_translation = translation;
        self.last_rotation = rotation;
        events
    }

    /// Explicit jump action: an upward impulse scaled by chassis mass, plus
    /// a yaw spin when steering is held. No-op while airborne.
    pub fn jump(&mut self, intent: &DriverIntent, physics: &mut dyn VehiclePhysics) -> bool {
        if self.in_contact_count == 0 {
            return false;
        }
        let mass = physics.mass();
        physics.apply_impulse(Vec3::Y * self.config.jump_force * mass);

        let steer = intent.steering();
        if steer.abs() > f32::EPSILON {
            physics.apply_torque_impulse(
                Vec3::Y * steer.signum() * self.config.jump_spin_torque * mass,
            );
        }
        true
    }

    /// Teleport the vehicle and reset the derived state machines
    pub fn move_to(
        &mut self,
        physics: &mut dyn VehiclePhysics,
        translation: Vec3,
        rotation: Quat,
    ) {
        physics.set_pose(translation, rotation);
        self.position = translation;
        self.forward = rotation * Vec3::Z;
        self.speed = 0.0;
        let up = rotation * Vec3::Y;
        self.upside_down_ratio = (up.dot(Vec3::NEG_Y) * 0.5 + 0.5).clamp(0.0, 1.0);
        self.flipped = self.upside_down_ratio > self.config.flip_edge;
        self.motion = MotionState::Moving;
        self.compound_stuck = false;
        self.stuck = false;
        self.recovery_deadline = None;
        self.last_translation = translation;
        self.last_rotation = rotation;
    }

    /// Disarm any pending auto recovery. Idempotent; the condition re-arms
    /// on its next tick if it still holds.
    pub fn cancel_recovery(&mut self) {
        self.recovery_deadline = None;
        self.compound_stuck = false;
    }

    fn apply_recovery(&self, physics: &mut dyn VehiclePhysics, up: Vec3, ratio: f32) {
        let mass = physics.mass();
        physics.apply_impulse(Vec3::Y * self.config.recovery_impulse * mass);

        // Torque that rotates the chassis up vector back toward world up;
        // fully inverted has no unique shortest way, so roll over the side
        let mut axis = up.cross(Vec3::Y);
        if axis.length_squared() < 1e-6 {
            axis = self.forward;
        }
        physics.apply_torque_impulse(
            axis.normalize_or_zero() * self.config.recovery_torque * ratio * mass,
        );
    }

    /// Sign of the pitch rate over the last step
    fn pitch_direction(&self, rotation: Quat) -> i8 {
        let delta = rotation * self.last_rotation.inverse();
        let (axis, angle) = delta.to_axis_angle();
        let right = rotation * Vec3::X;
        if axis.dot(right) * angle >= 0.0 {
            1
        } else {
            -1
        }
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Horizontal speed derived from the last step's translation delta
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// 0 = fully upright, 1 = fully inverted
    pub fn upside_down_ratio(&self) -> f32 {
        self.upside_down_ratio
    }

    pub fn in_contact_count(&self) -> usize {
        self.in_contact_count
    }

    pub fn is_stopped(&self) -> bool {
        self.motion == MotionState::Stopped
    }

    /// Sim time at which the vehicle last entered the stopped state
    pub fn stopped_since(&self) -> f64 {
        self.stopped_since
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    pub fn wheels(&self) -> &[WheelState; WHEEL_COUNT] {
        &self.wheels
    }

    /// Smoothed steering angle for presentation
    pub fn visual_steering(&self) -> f32 {
        self.visual_steering
    }
}
