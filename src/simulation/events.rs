//! Notification callbacks fired by the core
//!
//! Dependent systems (confetti, audio, UI hints) register through these
//! traits instead of being reached into from inside the simulation. All
//! callbacks are fired synchronously; the core never blocks on their return.

/// Receiver for achievement engine notifications
pub trait AchievementSink {
    /// A tier newly reached its threshold.
    ///
    /// `silent` is true while persisted progress is being restored at
    /// startup, so celebratory side effects only fire for live unlocks.
    fn on_tier_achieved(&mut self, group: &str, tier_index: usize, silent: bool);

    /// Every tier of every group is now achieved. `elapsed` is simulation
    /// seconds since construction or the last reset.
    fn on_global_complete(&mut self, elapsed: f64);
}

/// Receiver for vehicle state notifications
pub trait VehicleSink {
    /// The vehicle crossed the flip threshold in either direction.
    /// `direction` is the sign of the pitch rate at that moment:
    /// +1 pitching forward, -1 pitching backward.
    fn on_flip_edge(&mut self, direction: i8);

    /// The debounced stuck state changed. `true` means the vehicle has been
    /// flipped and stopped long enough for automatic recovery to fire.
    fn on_stuck_changed(&mut self, is_stuck: bool);
}

/// Sink that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AchievementSink for NullSink {
    fn on_tier_achieved(&mut self, _group: &str, _tier_index: usize, _silent: bool) {}
    fn on_global_complete(&mut self, _elapsed: f64) {}
}

impl VehicleSink for NullSink {
    fn on_flip_edge(&mut self, _direction: i8) {}
    fn on_stuck_changed(&mut self, _is_stuck: bool) {}
}
