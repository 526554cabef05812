//! Gameplay orchestrator
//!
//! Thin layer over the two subsystems: samples driver intent once per tick,
//! runs the controller's pre-physics phase, invokes the external physics
//! step, runs the post-physics phase, and forwards the vehicle's derived
//! signals into achievement progress and the notification sink. Also owns
//! the player-facing respawn flow, which locks input and suppresses auto
//! recovery while active.

use glam::{Quat, Vec3};

use super::achievements::AchievementEngine;
use super::events::VehicleSink;
use super::physics::VehiclePhysics;
use super::types::{DriverIntent, FRONT_WHEELS, REAR_WHEELS};
use super::vehicle::{VehicleConfig, VehicleController, VehicleEvent};

/// Thresholds for the gameplay hooks layered on top of the vehicle
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Horizontal distance from the origin that counts as reaching the sea
    pub sea_distance: f32,
    /// Seconds the front wheels must stay airborne for the stunt credit
    pub back_wheel_duration: f64,
    /// Minimum upside-down ratio for a recovery to credit the turtle group
    pub upside_down_credit_ratio: f32,
    /// Falling below this height teleports the vehicle back to its spawn
    pub fall_reset_height: f32,
    /// Seconds of input lock after a respawn
    pub respawn_lock_duration: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sea_distance: 120.0,
            back_wheel_duration: 5.0,
            upside_down_credit_ratio: 0.75,
            fall_reset_height: -5.0,
            respawn_lock_duration: 1.0,
        }
    }
}

/// One player's driving session: vehicle, achievements, and the tick wiring
pub struct DriveSession {
    vehicle: VehicleController,
    achievements: AchievementEngine,
    sink: Box<dyn VehicleSink>,
    config: SessionConfig,
    clock: f64,
    /// While set, driver input is ignored and recovery stays disarmed
    locked_until: Option<f64>,
    spawn_translation: Vec3,
    spawn_rotation: Quat,
    /// Pitch sign recorded when the vehicle entered the flipped band
    flip_entry_direction: Option<i8>,
    /// Sim time the current back-wheel stunt started
    back_wheel_since: Option<f64>,
    jump_held: bool,
}

impl DriveSession {
    /// Build the session around an existing physics body. The body's current
    /// pose becomes the respawn point.
    pub fn new(
        vehicle_config: VehicleConfig,
        config: SessionConfig,
        achievements: AchievementEngine,
        sink: Box<dyn VehicleSink>,
        physics: &mut dyn VehiclePhysics,
    ) -> Self {
        let vehicle = VehicleController::new(vehicle_config, physics);
        let spawn_translation = physics.translation();
        let spawn_rotation = physics.rotation();

        Self {
            vehicle,
            achievements,
            sink,
            config,
            clock: 0.0,
            locked_until: None,
            spawn_translation,
            spawn_rotation,
            flip_entry_direction: None,
            back_wheel_since: None,
            jump_held: false,
        }
    }

    /// Run one full simulation tick around the external physics step
    pub fn tick(&mut self, intent: DriverIntent, physics: &mut dyn VehiclePhysics, dt: f32) {
        self.clock += f64::from(dt);

        if let Some(until) = self.locked_until {
            if self.clock >= until {
                self.locked_until = None;
            }
        }
        let locked = self.locked_until.is_some();

        let mut intent = intent;
        if locked {
            intent = DriverIntent::default();
            self.vehicle.cancel_recovery();
        }

        self.vehicle.pre_physics(&intent, physics);
        physics.step(dt);
        let events = self.vehicle.post_physics(physics, dt);

        // Jump fires on the rising edge of the request
        let jump_edge = intent.jump_requested && !self.jump_held;
        self.jump_held = intent.jump_requested;
        if jump_edge && !locked && self.vehicle.jump(&intent, physics) {
            self.achievements.add_progress("suspensions");
        }

        for event in events {
            match event {
                VehicleEvent::FlipEdge { direction, flipped } => {
                    self.sink.on_flip_edge(direction);
                    if flipped {
                        self.flip_entry_direction = Some(direction);
                    } else if self.flip_entry_direction.take() == Some(direction) {
                        // Same pitch sign on the way out means the rotation
                        // carried through: a full revolution
                        if direction > 0 {
                            self.achievements.set_progress("frontFlip", 1);
                        } else {
                            self.achievements.set_progress("backFlip", 1);
                        }
                    }
                }
                VehicleEvent::StuckChanged { stuck } => {
                    self.sink.on_stuck_changed(stuck);
                }
                VehicleEvent::Recovered { ratio } => {
                    if ratio > self.config.upside_down_credit_ratio {
                        self.achievements.set_progress("upsideDown", 1);
                    }
                }
            }
        }

        self.update_back_wheel();

        let position = self.vehicle.position();
        let distance_to_center = Vec3::new(position.x, 0.0, position.z).length();
        if distance_to_center > self.config.sea_distance {
            self.achievements.set_progress("sea", 1);
        }

        if position.y < self.config.fall_reset_height {
            self.respawn(physics);
        }

        self.achievements.update(dt);
    }

    /// Teleport back to the spawn pose and lock input briefly
    pub fn respawn(&mut self, physics: &mut dyn VehiclePhysics) {
        self.locked_until = Some(self.clock + self.config.respawn_lock_duration);
        self.vehicle
            .move_to(physics, self.spawn_translation, self.spawn_rotation);
        self.flip_entry_direction = None;
        self.back_wheel_since = None;
    }

    /// Rear wheels carrying the chassis with the front pair airborne,
    /// sustained long enough, credits the stunt
    fn update_back_wheel(&mut self) {
        let wheels = self.vehicle.wheels();
        let fronts_airborne = FRONT_WHEELS.iter().all(|&index| !wheels[index].in_contact);
        let rears_grounded = REAR_WHEELS.iter().all(|&index| wheels[index].in_contact);

        if fronts_airborne && rears_grounded {
            let since = *self.back_wheel_since.get_or_insert(self.clock);
            if self.clock - since >= self.config.back_wheel_duration {
                self.achievements.set_progress("backWheel", 1);
            }
        } else {
            self.back_wheel_since = None;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some()
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn vehicle(&self) -> &VehicleController {
        &self.vehicle
    }

    pub fn achievements(&self) -> &AchievementEngine {
        &self.achievements
    }

    /// Mutable engine access for world triggers (areas, cookies, crates)
    pub fn achievements_mut(&mut self) -> &mut AchievementEngine {
        &mut self.achievements
    }

    /// One-line state summary for the headless runner
    pub fn summary(&self) -> String {
        let position = self.vehicle.position();
        format!(
            "pos ({:.1}, {:.1}, {:.1}) | speed {:.1} m/s | {}",
            position.x,
            position.y,
            position.z,
            self.vehicle.speed(),
            self.achievements.summary()
        )
    }
}
