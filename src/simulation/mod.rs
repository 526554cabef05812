//! Standalone driving simulation module
//!
//! This module contains the gameplay core of the driving game: the vehicle
//! controller, the achievement engine and the tick orchestration. It runs
//! independently of any rendering layer and can be exercised headless from
//! the console without booting a full game.

mod achievements;
mod data;
mod events;
mod physics;
mod rig;
mod session;
mod store;
mod types;
mod vehicle;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use achievements::{
    AchievementDef, AchievementEngine, AchievementGroup, AchievementTier, DependencyRule,
    GlobalProgress, ProgressError, ProgressUpdate, ProgressValue,
};
#[allow(unused_imports)]
pub use data::{default_achievements, default_dependencies};
#[allow(unused_imports)]
pub use events::{AchievementSink, NullSink, VehicleSink};
#[allow(unused_imports)]
pub use physics::{VehiclePhysics, WheelTuning};
#[allow(unused_imports)]
pub use rig::FlatGroundRig;
#[allow(unused_imports)]
pub use session::{DriveSession, SessionConfig};
#[allow(unused_imports)]
pub use store::{JsonFileStore, MemoryStore, ProgressSnapshot, ProgressStore, SavedProgress};
#[allow(unused_imports)]
pub use types::{DriverIntent, FRONT_WHEELS, REAR_WHEELS, WHEEL_COUNT};
#[allow(unused_imports)]
pub use vehicle::{VehicleConfig, VehicleController, VehicleEvent, WheelState};
