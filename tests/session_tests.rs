//! End-to-end session tests
//!
//! These run the full tick pipeline (intent, pre-physics, step,
//! post-physics, achievement hooks) on the flat-ground rig, plus a scripted
//! body where a test needs exact wheel contact control.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};

use drive_sim::simulation::{
    AchievementEngine, DriveSession, DriverIntent, FlatGroundRig, MemoryStore, NullSink,
    SessionConfig, VehicleConfig, VehiclePhysics, VehicleSink, WheelTuning,
};

#[derive(Default, Clone)]
struct RecordingVehicleSink {
    flips: Rc<RefCell<Vec<i8>>>,
    stuck: Rc<RefCell<Vec<bool>>>,
}

impl VehicleSink for RecordingVehicleSink {
    fn on_flip_edge(&mut self, direction: i8) {
        self.flips.borrow_mut().push(direction);
    }

    fn on_stuck_changed(&mut self, is_stuck: bool) {
        self.stuck.borrow_mut().push(is_stuck);
    }
}

fn default_engine() -> AchievementEngine {
    AchievementEngine::with_default_config(Box::new(MemoryStore::new()), Box::new(NullSink))
}

fn session_on(
    physics: &mut dyn VehiclePhysics,
    sink: Box<dyn VehicleSink>,
) -> DriveSession {
    DriveSession::new(
        VehicleConfig::default(),
        SessionConfig::default(),
        default_engine(),
        sink,
        physics,
    )
}

const DT: f32 = 1.0 / 60.0;

fn settle(session: &mut DriveSession, rig: &mut FlatGroundRig, ticks: u32) {
    for _ in 0..ticks {
        session.tick(DriverIntent::default(), rig, DT);
    }
}

#[test]
fn test_driving_forward_covers_ground() {
    let mut rig = FlatGroundRig::spawned(10.0);
    let mut session = session_on(&mut rig, Box::new(NullSink));

    settle(&mut session, &mut rig, 60);
    assert!(session.vehicle().in_contact_count() > 0);

    for _ in 0..600 {
        session.tick(DriverIntent::full_forward(), &mut rig, DT);
    }

    assert!(session.vehicle().speed() > 1.0);
    assert!(session.vehicle().position().z > 20.0);
    assert!(!session.vehicle().is_stopped());
}

#[test]
fn test_jump_fires_once_and_never_doubles_in_air() {
    let mut rig = FlatGroundRig::spawned(10.0);
    let mut session = session_on(&mut rig, Box::new(NullSink));

    settle(&mut session, &mut rig, 60);
    assert!(session.vehicle().in_contact_count() > 0);

    // Grounded jump applies the impulse and credits the suspension group
    let jump = DriverIntent {
        jump_requested: true,
        ..DriverIntent::default()
    };
    session.tick(jump, &mut rig, DT);
    assert_eq!(session.achievements().group_progress("suspensions"), 1);
    assert!(rig.linvel.y > 1.0);

    // Release while leaving the ground
    session.tick(DriverIntent::default(), &mut rig, DT);
    assert_eq!(session.vehicle().in_contact_count(), 0);

    // A second request while airborne is a no-op
    session.tick(jump, &mut rig, DT);
    assert_eq!(session.achievements().group_progress("suspensions"), 1);
}

#[test]
fn test_stuck_vehicle_recovers_automatically() {
    let mut rig = FlatGroundRig::new(10.0, Vec3::new(0.0, 0.5, 0.0));
    rig.rotation = Quat::from_rotation_x(2.7);
    let sink = RecordingVehicleSink::default();
    let mut session = session_on(&mut rig, Box::new(sink.clone()));

    session.tick(DriverIntent::default(), &mut rig, DT);
    let initial_ratio = session.vehicle().upside_down_ratio();
    assert!(initial_ratio > 0.9);
    assert!(session.vehicle().is_flipped());

    // No input for the debounce window plus a second
    let ticks = ((f64::from(session.vehicle().config().stuck_duration) + 1.0) / f64::from(DT))
        .ceil() as u32;
    for _ in 0..ticks {
        session.tick(DriverIntent::default(), &mut rig, DT);
    }

    // Exactly one recovery fired and it counted as getting upside down
    let stuck_entries = sink.stuck.borrow().iter().filter(|&&stuck| stuck).count();
    assert_eq!(stuck_entries, 1);
    assert_eq!(session.achievements().group_progress("upsideDown"), 1);

    // The corrective torque brings the ratio back down
    let mut min_ratio = f32::MAX;
    for _ in 0..30 {
        session.tick(DriverIntent::default(), &mut rig, DT);
        min_ratio = min_ratio.min(session.vehicle().upside_down_ratio());
    }
    assert!(min_ratio < 0.7, "ratio never decreased: {}", min_ratio);
}

#[test]
fn test_full_revolution_credits_a_front_flip() {
    let mut rig = FlatGroundRig::spawned(10.0);
    let sink = RecordingVehicleSink::default();
    let mut session = session_on(&mut rig, Box::new(sink.clone()));
    settle(&mut session, &mut rig, 30);

    // Pitch forward through the flipped band and out the same way
    rig.rotation = Quat::from_rotation_x(2.6);
    session.tick(DriverIntent::default(), &mut rig, DT);
    rig.rotation = Quat::from_rotation_x(5.9);
    session.tick(DriverIntent::default(), &mut rig, DT);

    assert_eq!(session.achievements().group_progress("frontFlip"), 1);
    assert_eq!(session.achievements().group_progress("backFlip"), 0);
    assert_eq!(*sink.flips.borrow(), [1, 1]);
}

#[test]
fn test_aborted_flip_is_not_credited() {
    let mut rig = FlatGroundRig::spawned(10.0);
    let mut session = session_on(&mut rig, Box::new(NullSink));
    settle(&mut session, &mut rig, 30);

    // Tip past the threshold, then fall back the way it came
    rig.rotation = Quat::from_rotation_x(2.6);
    session.tick(DriverIntent::default(), &mut rig, DT);
    rig.rotation = Quat::from_rotation_x(0.3);
    session.tick(DriverIntent::default(), &mut rig, DT);

    assert_eq!(session.achievements().group_progress("frontFlip"), 0);
    assert_eq!(session.achievements().group_progress("backFlip"), 0);
}

#[test]
fn test_backward_revolution_credits_a_back_flip() {
    let mut rig = FlatGroundRig::spawned(10.0);
    let mut session = session_on(&mut rig, Box::new(NullSink));
    settle(&mut session, &mut rig, 30);

    rig.rotation = Quat::from_rotation_x(-2.6);
    session.tick(DriverIntent::default(), &mut rig, DT);
    rig.rotation = Quat::from_rotation_x(-5.9);
    session.tick(DriverIntent::default(), &mut rig, DT);

    assert_eq!(session.achievements().group_progress("backFlip"), 1);
    assert_eq!(session.achievements().group_progress("frontFlip"), 0);
}

#[test]
fn test_sea_excursion_is_credited() {
    let mut rig = FlatGroundRig::spawned(10.0);
    let mut session = session_on(&mut rig, Box::new(NullSink));
    settle(&mut session, &mut rig, 30);
    assert_eq!(session.achievements().group_progress("sea"), 0);

    rig.translation.x = 125.0;
    session.tick(DriverIntent::default(), &mut rig, DT);
    assert_eq!(session.achievements().group_progress("sea"), 1);
}

#[test]
fn test_fall_reset_respawns_and_locks_input() {
    let mut body = ScriptedBody::new();
    let mut session = session_on(&mut body, Box::new(NullSink));

    body.translation = Vec3::new(3.0, -6.0, 0.0);
    session.tick(DriverIntent::default(), &mut body, 0.1);

    // Back at the spawn pose with input locked
    assert!(session.is_locked());
    assert_eq!(session.vehicle().position(), Vec3::ZERO);
    assert_eq!(body.translation, Vec3::ZERO);

    // Driver input is suppressed while locked
    session.tick(DriverIntent::full_forward(), &mut body, 0.1);
    assert!(body.engine_forces.iter().all(|&force| force == 0.0));

    // The lock expires on its own and input flows again
    for _ in 0..10 {
        session.tick(DriverIntent::default(), &mut body, 0.1);
    }
    assert!(!session.is_locked());
    session.tick(DriverIntent::full_forward(), &mut body, 0.1);
    assert!(body.engine_forces.iter().all(|&force| force == 10.0));
}

/// Scripted body for exact wheel contact control (back-wheel stunt)
struct ScriptedBody {
    translation: Vec3,
    rotation: Quat,
    contacts: Vec<bool>,
    engine_forces: Vec<f32>,
    rest_length: f32,
}

impl ScriptedBody {
    fn new() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            contacts: Vec::new(),
            engine_forces: Vec::new(),
            rest_length: 0.125,
        }
    }
}

impl VehiclePhysics for ScriptedBody {
    fn step(&mut self, _dt: f32) {}

    fn add_wheel(&mut self, _chassis_mount: Vec3, tuning: &WheelTuning) {
        self.contacts.push(false);
        self.engine_forces.push(0.0);
        self.rest_length = tuning.suspension_rest_length;
    }

    fn set_wheel_steering(&mut self, _wheel: usize, _angle: f32) {}

    fn set_wheel_engine_force(&mut self, wheel: usize, force: f32) {
        self.engine_forces[wheel] = force;
    }

    fn set_wheel_brake(&mut self, _wheel: usize, _brake: f32) {}

    fn wheel_is_in_contact(&self, wheel: usize) -> bool {
        self.contacts.get(wheel).copied().unwrap_or(false)
    }

    fn wheel_suspension_length(&self, _wheel: usize) -> f32 {
        self.rest_length
    }

    fn translation(&self) -> Vec3 {
        self.translation
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn is_sleeping(&self) -> bool {
        false
    }

    fn mass(&self) -> f32 {
        10.0
    }

    fn apply_impulse(&mut self, _impulse: Vec3) {}
    fn apply_torque_impulse(&mut self, _torque: Vec3) {}

    fn set_pose(&mut self, translation: Vec3, rotation: Quat) {
        self.translation = translation;
        self.rotation = rotation;
    }
}

#[test]
fn test_sustained_back_wheel_is_credited() {
    let mut body = ScriptedBody::new();
    let mut session = session_on(&mut body, Box::new(NullSink));

    // Rear pair carrying the chassis, front pair airborne
    body.contacts = vec![false, true, false, true];

    let dt = 0.1;
    for _ in 0..40 {
        session.tick(DriverIntent::default(), &mut body, dt);
    }
    assert_eq!(session.achievements().group_progress("backWheel"), 0);

    for _ in 0..15 {
        session.tick(DriverIntent::default(), &mut body, dt);
    }
    assert_eq!(session.achievements().group_progress("backWheel"), 1);
}

#[test]
fn test_interrupted_back_wheel_restarts_the_timer() {
    let mut body = ScriptedBody::new();
    let mut session = session_on(&mut body, Box::new(NullSink));

    let dt = 0.1;
    body.contacts = vec![false, true, false, true];
    for _ in 0..45 {
        session.tick(DriverIntent::default(), &mut body, dt);
    }

    // Front wheels touch down briefly
    body.contacts = vec![true, true, true, true];
    session.tick(DriverIntent::default(), &mut body, dt);

    // Another partial stretch must not be credited
    body.contacts = vec![false, true, false, true];
    for _ in 0..45 {
        session.tick(DriverIntent::default(), &mut body, dt);
    }
    assert_eq!(session.achievements().group_progress("backWheel"), 0);
}
