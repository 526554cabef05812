//! Flat-ground physics rig used by the headless demo and integration tests
//!
//! A deliberately small stand-in for a real physics backend: one dynamic
//! chassis over an infinite ground plane at y = 0, with wheel contact found
//! by casting along the chassis down axis. It responds to the same wheel
//! writes and impulse calls a real engine would, which is enough to exercise
//! the controller's state machines and recovery logic end to end.

use glam::{Quat, Vec3};

use super::physics::{VehiclePhysics, WheelTuning};

const GRAVITY: f32 = 9.81;
const GROUND_Y: f32 = 0.0;
const CHASSIS_HALF_HEIGHT: f32 = 0.5;
/// Extra suspension length tolerated before a wheel loses contact
const CONTACT_MARGIN: f32 = 0.05;
/// Yaw response per steering radian per m/s of forward speed
const STEER_RESPONSE: f32 = 0.8;
/// How quickly horizontal velocity realigns with the chassis forward axis
const LATERAL_GRIP: f32 = 6.0;
/// Brake value to exponential damping conversion
const BRAKE_SCALE: f32 = 5.0;
/// Tumble damping while resting on the ground, per second
const GROUND_ANGULAR_DAMPING: f32 = 3.0;

#[derive(Debug, Clone)]
struct RigWheel {
    mount: Vec3,
    tuning: WheelTuning,
    steering: f32,
    engine_force: f32,
    brake: f32,
    in_contact: bool,
    suspension_length: f32,
}

/// Single-chassis physics world over a flat ground plane
#[derive(Debug, Clone)]
pub struct FlatGroundRig {
    pub translation: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    mass: f32,
    sleeping: bool,
    wheels: Vec<RigWheel>,
    /// Chassis center height when resting on its wheels
    rest_height: f32,
}

impl FlatGroundRig {
    pub fn new(mass: f32, translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
            mass,
            sleeping: false,
            wheels: Vec::new(),
            rest_height: CHASSIS_HALF_HEIGHT,
        }
    }

    /// Rig spawned just above the ground at the origin; it drops onto its
    /// wheels within a few steps
    pub fn spawned(mass: f32) -> Self {
        Self::new(mass, Vec3::new(0.0, 1.0, 0.0))
    }

    pub fn set_sleeping(&mut self, sleeping: bool) {
        self.sleeping = sleeping;
    }

    /// Chassis center height when resting upright on its wheels
    pub fn rest_height(&self) -> f32 {
        self.rest_height
    }

    /// Recompute wheel contact and suspension length from the current pose
    fn refresh_wheels(&mut self) {
        let down = self.rotation * Vec3::NEG_Y;
        for wheel in &mut self.wheels {
            let mount_world = self.translation + self.rotation * wheel.mount;
            // Suspension rays only hit the plane while pointing down
            if down.y < -0.1 && mount_world.y > GROUND_Y {
                let hit_distance = (GROUND_Y - mount_world.y) / down.y;
                let length = hit_distance - wheel.tuning.radius;
                wheel.suspension_length =
                    length.clamp(0.0, wheel.tuning.suspension_rest_length + CONTACT_MARGIN);
                wheel.in_contact = length <= wheel.tuning.suspension_rest_length + CONTACT_MARGIN;
            } else {
                wheel.suspension_length = wheel.tuning.suspension_rest_length;
                wheel.in_contact = false;
            }
        }
    }
}

impl VehiclePhysics for FlatGroundRig {
    fn step(&mut self, dt: f32) {
        if self.sleeping || dt <= 0.0 {
            return;
        }

        // Integrate orientation
        if self.angvel.length_squared() > 1e-10 {
            self.rotation = (Quat::from_scaled_axis(self.angvel * dt) * self.rotation).normalize();
        }

        self.refresh_wheels();
        let grounded = self.wheels.iter().any(|wheel| wheel.in_contact);

        let forward = self.rotation * Vec3::Z;
        let forward_flat = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();

        if grounded && forward_flat != Vec3::ZERO {
            // Drive
            let drive: f32 = self.wheels.iter().map(|wheel| wheel.engine_force).sum();
            self.linvel += forward_flat * (drive / self.mass) * dt;

            // Brake as exponential damping of horizontal velocity
            let brake: f32 = self
                .wheels
                .iter()
                .map(|wheel| wheel.brake)
                .fold(0.0, f32::max);
            let damping = (-brake * BRAKE_SCALE * dt).exp();
            self.linvel.x *= damping;
            self.linvel.z *= damping;

            // Steering turns the chassis proportionally to forward speed
            let steer = self
                .wheels
                .iter()
                .map(|wheel| wheel.steering)
                .fold(0.0, |a: f32, b| if b.abs() > a.abs() { b } else { a });
            let signed_speed = self.linvel.dot(forward_flat);
            self.angvel.y = steer * signed_speed * STEER_RESPONSE;

            // Tire grip pulls the horizontal velocity onto the forward axis
            let horizontal = Vec3::new(self.linvel.x, 0.0, self.linvel.z);
            let aligned = forward_flat * signed_speed;
            let gripped = horizontal.lerp(aligned, (LATERAL_GRIP * dt).min(1.0));
            self.linvel.x = gripped.x;
            self.linvel.z = gripped.z;
        }

        // Gravity and integration
        self.linvel.y -= GRAVITY * dt;
        self.translation += self.linvel * dt;

        // Crude ground collision: resting height depends on which way up
        // the chassis is
        let up_y = (self.rotation * Vec3::Y).y;
        let min_y = if up_y > 0.0 {
            self.rest_height
        } else {
            CHASSIS_HALF_HEIGHT
        };
        if self.translation.y < min_y {
            self.translation.y = min_y;
            if self.linvel.y < 0.0 {
                self.linvel.y = 0.0;
            }
            let damping = (1.0 - GROUND_ANGULAR_DAMPING * dt).max(0.0);
            self.angvel *= damping;
        }

        self.refresh_wheels();
    }

    fn add_wheel(&mut self, chassis_mount: Vec3, tuning: &WheelTuning) {
        let suspension_length = tuning.suspension_rest_length;
        self.wheels.push(RigWheel {
            mount: chassis_mount,
            tuning: *tuning,
            steering: 0.0,
            engine_force: 0.0,
            brake: 0.0,
            in_contact: false,
            suspension_length,
        });

        // Resting chassis height comes from the lowest wheel
        let reach = -(chassis_mount.y - tuning.suspension_rest_length - tuning.radius);
        if reach > self.rest_height {
            self.rest_height = reach;
        }
        self.refresh_wheels();
    }

    fn set_wheel_steering(&mut self, wheel: usize, angle: f32) {
        if let Some(wheel) = self.wheels.get_mut(wheel) {
            wheel.steering = angle;
        }
    }

    fn set_wheel_engine_force(&mut self, wheel: usize, force: f32) {
        if let Some(wheel) = self.wheels.get_mut(wheel) {
            wheel.engine_force = force;
        }
    }

    fn set_wheel_brake(&mut self, wheel: usize, brake: f32) {
        if let Some(wheel) = self.wheels.get_mut(wheel) {
            wheel.brake = brake;
        }
    }

    fn wheel_is_in_contact(&self, wheel: usize) -> bool {
        self.wheels
            .get(wheel)
            .map(|wheel| wheel.in_contact)
            .unwrap_or(false)
    }

    fn wheel_suspension_length(&self, wheel: usize) -> f32 {
        self.wheels
            .get(wheel)
            .map(|wheel| wheel.suspension_length)
            .unwrap_or(0.0)
    }

    fn translation(&self) -> Vec3 {
        self.translation
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.sleeping = false;
        self.linvel += impulse / self.mass;
    }

    fn apply_torque_impulse(&mut self, torque: Vec3) {
        self.sleeping = false;
        // Simplified inertia: treat the chassis as a unit-radius body
        self.angvel += torque / self.mass;
    }

    fn set_pose(&mut self, translation: Vec3, rotation: Quat) {
        self.sleeping = false;
        self.translation = translation;
        self.rotation = rotation;
        self.linvel = Vec3::ZERO;
        self.angvel = Vec3::ZERO;
        self.refresh_wheels();
    }
}
