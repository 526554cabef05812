//! Achievement and progression engine
//!
//! Single authority for progress mutation, tier unlocking and global
//! completion tracking. Groups are configured once at startup from the
//! static achievement table and progress is mutated only through this
//! engine's API; every live mutation ends with a persisted snapshot.

use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use super::events::AchievementSink;
use super::store::{ProgressSnapshot, ProgressStore, SavedProgress};

/// One row of the static achievement configuration table
#[derive(Debug, Clone)]
pub struct AchievementDef {
    pub group: String,
    pub title: String,
    pub description: String,
    pub threshold: u64,
    pub unique: bool,
}

impl AchievementDef {
    pub fn new(
        group: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        threshold: u64,
    ) -> Self {
        Self {
            group: group.into(),
            title: title.into(),
            description: description.into(),
            threshold,
            unique: false,
        }
    }

    /// Mark this row's group as tracking unique ids instead of a counter
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Progress carried by a group: a plain counter or a set of opaque ids.
///
/// The mode is fixed when the configuration is loaded and never changes at
/// runtime; a group whose rows declare `unique` holds a set and its
/// effective progress is the set's cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressValue {
    Counter(u64),
    UniqueSet(BTreeSet<String>),
}

impl ProgressValue {
    /// Effective numeric progress: the count, or the set's cardinality
    pub fn effective(&self) -> u64 {
        match self {
            ProgressValue::Counter(count) => *count,
            ProgressValue::UniqueSet(ids) => ids.len() as u64,
        }
    }
}

/// Update payload accepted by `set_progress`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// New counter value
    Count(u64),
    /// One id to add to a unique set
    Id(String),
    /// Several ids to add to a unique set
    Ids(Vec<String>),
}

impl From<u64> for ProgressUpdate {
    fn from(value: u64) -> Self {
        ProgressUpdate::Count(value)
    }
}

impl From<u32> for ProgressUpdate {
    fn from(value: u32) -> Self {
        ProgressUpdate::Count(u64::from(value))
    }
}

impl From<i32> for ProgressUpdate {
    fn from(value: i32) -> Self {
        ProgressUpdate::Count(value.max(0) as u64)
    }
}

impl From<&str> for ProgressUpdate {
    fn from(id: &str) -> Self {
        ProgressUpdate::Id(id.to_string())
    }
}

impl From<String> for ProgressUpdate {
    fn from(id: String) -> Self {
        ProgressUpdate::Id(id)
    }
}

impl From<Vec<String>> for ProgressUpdate {
    fn from(ids: Vec<String>) -> Self {
        ProgressUpdate::Ids(ids)
    }
}

/// Rejected progress mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("unknown achievement group '{0}'")]
    UnknownGroup(String),
    #[error("group '{0}' tracks a counter but was given unique ids")]
    ExpectedCount(String),
    #[error("group '{0}' tracks unique ids but was given a counter value")]
    ExpectedIds(String),
}

/// A single achievement threshold watched on a group.
///
/// `achieved` is monotonic: once set it stays set until an explicit reset.
#[derive(Debug, Clone)]
pub struct AchievementTier {
    pub title: String,
    pub description: String,
    pub threshold: u64,
    pub achieved: bool,
}

/// A named running total (or id set) and the tiers that watch it
#[derive(Debug, Clone)]
pub struct AchievementGroup {
    pub name: String,
    pub progress: ProgressValue,
    pub tiers: Vec<AchievementTier>,
}

impl AchievementGroup {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            progress: ProgressValue::Counter(0),
            tiers: Vec::new(),
        }
    }
}

/// Meta-achievement rule: when every listed prerequisite tier is achieved,
/// the target group is credited with one point of progress.
///
/// Rules are plain configuration data so the set of prerequisites can be
/// edited without touching the engine.
#[derive(Debug, Clone)]
pub struct DependencyRule {
    pub target_group: String,
    /// Prerequisites as (group name, tier index) pairs
    pub requires: Vec<(String, usize)>,
}

/// Aggregate completion counters across every group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalProgress {
    /// Tiers achieved so far, across all groups
    pub achieved_count: usize,
    /// Total tier count
    pub total_count: usize,
    /// Simulation time at construction or last reset
    pub started_at: f64,
    /// Stamped once, the first time every tier is achieved
    pub completed_at: Option<f64>,
}

/// Owns all achievement groups and applies progress deltas
pub struct AchievementEngine {
    groups: HashMap<String, AchievementGroup>,
    group_order: Vec<String>,
    dependencies: Vec<DependencyRule>,
    global: GlobalProgress,
    clock: f64,
    store: Box<dyn ProgressStore>,
    sink: Box<dyn AchievementSink>,
}

impl AchievementEngine {
    /// Build the engine from a configuration table and restore any persisted
    /// progress. Restored unlocks are reported with the silent flag set and
    /// do not write back to the store.
    pub fn new(
        defs: Vec<AchievementDef>,
        dependencies: Vec<DependencyRule>,
        store: Box<dyn ProgressStore>,
        sink: Box<dyn AchievementSink>,
    ) -> Self {
        let mut groups: HashMap<String, AchievementGroup> = HashMap::new();
        let mut group_order: Vec<String> = Vec::new();

        for def in defs {
            if !groups.contains_key(&def.group) {
                group_order.push(def.group.clone());
                groups.insert(def.group.clone(), AchievementGroup::new(&def.group));
            }
            if let Some(group) = groups.get_mut(&def.group) {
                // One unique row makes the whole group an id set
                if def.unique && matches!(group.progress, ProgressValue::Counter(_)) {
                    group.progress = ProgressValue::UniqueSet(BTreeSet::new());
                }
                group.tiers.push(AchievementTier {
                    title: def.title,
                    description: def.description,
                    threshold: def.threshold,
                    achieved: false,
                });
            }
        }

        for group in groups.values_mut() {
            group.tiers.sort_by_key(|tier| tier.threshold);
        }

        let total_count = groups.values().map(|group| group.tiers.len()).sum();

        let mut engine = Self {
            groups,
            group_order,
            dependencies,
            global: GlobalProgress {
                achieved_count: 0,
                total_count,
                started_at: 0.0,
                completed_at: None,
            },
            clock: 0.0,
            store,
            sink,
        };

        engine.restore();
        engine
    }

    /// Engine with the game's default achievement table and meta rules
    pub fn with_default_config(
        store: Box<dyn ProgressStore>,
        sink: Box<dyn AchievementSink>,
    ) -> Self {
        Self::new(
            super::data::default_achievements(),
            super::data::default_dependencies(),
            store,
            sink,
        )
    }

    /// Advance the engine's simulation clock
    pub fn update(&mut self, delta_secs: f32) {
        self.clock += f64::from(delta_secs);
    }

    /// Apply a progress update, returning the signed delta in effective
    /// progress. Unknown groups and type mismatches are logged no-ops that
    /// return zero; use `try_set_progress` for the typed failure.
    pub fn set_progress(&mut self, group: &str, update: impl Into<ProgressUpdate>) -> i64 {
        match self.try_set_progress(group, update) {
            Ok(delta) => delta,
            Err(e) => {
                warn!("Progress update rejected: {}", e);
                0
            }
        }
    }

    /// `set_progress` with the rejection surfaced as a typed result
    pub fn try_set_progress(
        &mut self,
        group: &str,
        update: impl Into<ProgressUpdate>,
    ) -> Result<i64, ProgressError> {
        let delta = self.apply_value(group, update.into(), false)?;
        if delta != 0 {
            self.commit(false);
        }
        Ok(delta)
    }

    /// Increment a counter group by one
    pub fn add_progress(&mut self, group: &str) -> i64 {
        match self.try_add_progress(group) {
            Ok(delta) => delta,
            Err(e) => {
                warn!("Progress update rejected: {}", e);
                0
            }
        }
    }

    /// `add_progress` with the rejection surfaced as a typed result
    pub fn try_add_progress(&mut self, group: &str) -> Result<i64, ProgressError> {
        let current = match self.groups.get(group) {
            None => return Err(ProgressError::UnknownGroup(group.to_string())),
            Some(found) => match &found.progress {
                ProgressValue::Counter(count) => *count,
                ProgressValue::UniqueSet(_) => {
                    return Err(ProgressError::ExpectedIds(group.to_string()))
                }
            },
        };
        self.try_set_progress(group, ProgressUpdate::Count(current + 1))
    }

    /// Zero every group, clear every achieved flag, reset the global
    /// counters and persist the emptied snapshot
    pub fn reset(&mut self) {
        for group in self.groups.values_mut() {
            group.progress = match &group.progress {
                ProgressValue::Counter(_) => ProgressValue::Counter(0),
                ProgressValue::UniqueSet(_) => ProgressValue::UniqueSet(BTreeSet::new()),
            };
            for tier in &mut group.tiers {
                tier.achieved = false;
            }
        }

        self.global.achieved_count = 0;
        self.global.completed_at = None;
        self.global.started_at = self.clock;
        self.persist();
    }

    /// Effective progress of a group (cardinality for unique sets);
    /// zero for unknown groups
    pub fn group_progress(&self, group: &str) -> u64 {
        self.groups
            .get(group)
            .map(|found| found.progress.effective())
            .unwrap_or(0)
    }

    /// Whether the given tier of a group is achieved
    pub fn is_tier_achieved(&self, group: &str, tier_index: usize) -> bool {
        self.groups
            .get(group)
            .and_then(|found| found.tiers.get(tier_index))
            .map(|tier| tier.achieved)
            .unwrap_or(false)
    }

    /// Current global completion counters
    pub fn global_progress(&self) -> GlobalProgress {
        self.global
    }

    /// Whether every tier across every group is achieved
    pub fn is_complete(&self) -> bool {
        self.global.total_count > 0 && self.global.achieved_count == self.global.total_count
    }

    /// Groups in configuration order
    pub fn iter_groups(&self) -> impl Iterator<Item = &AchievementGroup> {
        self.group_order
            .iter()
            .filter_map(|name| self.groups.get(name))
    }

    /// Look up one group by name
    pub fn group(&self, name: &str) -> Option<&AchievementGroup> {
        self.groups.get(name)
    }

    /// One-line progress summary for display
    pub fn summary(&self) -> String {
        format!(
            "Achievements: {}/{} unlocked",
            self.global.achieved_count, self.global.total_count
        )
    }

    /// Mutate one group's value and run its tier checks. Returns the signed
    /// delta in effective progress; zero deltas skip the tier scan entirely.
    fn apply_value(
        &mut self,
        name: &str,
        update: ProgressUpdate,
        silent: bool,
    ) -> Result<i64, ProgressError> {
        let group = self
            .groups
            .get_mut(name)
            .ok_or_else(|| ProgressError::UnknownGroup(name.to_string()))?;

        let old = group.progress.effective();

        match (&mut group.progress, update) {
            (ProgressValue::Counter(current), ProgressUpdate::Count(value)) => {
                if value < *current {
                    // Only reset() may lower a counter
                    debug!(
                        "Ignoring decreasing progress for '{}' ({} -> {})",
                        name, current, value
                    );
                } else if value != *current {
                    *current = value;
                }
            }
            (ProgressValue::UniqueSet(ids), ProgressUpdate::Id(id)) => {
                ids.insert(id);
            }
            (ProgressValue::UniqueSet(ids), ProgressUpdate::Ids(new_ids)) => {
                for id in new_ids {
                    ids.insert(id);
                }
            }
            (ProgressValue::Counter(_), _) => {
                return Err(ProgressError::ExpectedCount(name.to_string()))
            }
            (ProgressValue::UniqueSet(_), ProgressUpdate::Count(_)) => {
                return Err(ProgressError::ExpectedIds(name.to_string()))
            }
        }

        let new = group.progress.effective();
        let delta = new as i64 - old as i64;
        if delta == 0 {
            return Ok(0);
        }

        let mut newly_achieved = Vec::new();
        for (index, tier) in group.tiers.iter_mut().enumerate() {
            if !tier.achieved && new.min(tier.threshold) == tier.threshold {
                tier.achieved = true;
                newly_achieved.push(index);
            }
        }

        for index in newly_achieved {
            self.sink.on_tier_achieved(name, index, silent);
        }

        Ok(delta)
    }

    /// Post-mutation bookkeeping after a non-zero delta
    fn commit(&mut self, silent: bool) {
        self.check_dependencies(silent);
        self.recompute_global(silent);
        self.persist();
    }

    /// Evaluate the meta rules until no new credit is produced. Re-running a
    /// satisfied rule is a zero-delta no-op, so this converges.
    fn check_dependencies(&mut self, silent: bool) {
        loop {
            let mut fired = false;
            let rules = self.dependencies.clone();
            for rule in rules {
                if !self.rule_satisfied(&rule) {
                    continue;
                }
                match self.apply_value(&rule.target_group, ProgressUpdate::Count(1), silent) {
                    Ok(delta) if delta != 0 => fired = true,
                    Ok(_) => {}
                    Err(e) => warn!("Dependency rule for '{}' rejected: {}", rule.target_group, e),
                }
            }
            if !fired {
                break;
            }
        }
    }

    fn rule_satisfied(&self, rule: &DependencyRule) -> bool {
        rule.requires
            .iter()
            .all(|(group, tier_index)| self.is_tier_achieved(group, *tier_index))
    }

    /// Recount achieved tiers and stamp the completion time on the first
    /// transition to fully complete
    fn recompute_global(&mut self, silent: bool) {
        self.global.achieved_count = self
            .groups
            .values()
            .map(|group| group.tiers.iter().filter(|tier| tier.achieved).count())
            .sum();

        if self.global.total_count > 0
            && self.global.achieved_count == self.global.total_count
            && self.global.completed_at.is_none()
        {
            self.global.completed_at = Some(self.clock);
            if !silent {
                self.sink
                    .on_global_complete(self.clock - self.global.started_at);
            }
        }
    }

    /// Write the snapshot of every group with non-zero progress
    fn persist(&mut self) {
        let mut snapshot = ProgressSnapshot::new();
        for name in &self.group_order {
            let Some(group) = self.groups.get(name) else {
                continue;
            };
            match &group.progress {
                ProgressValue::Counter(count) if *count > 0 => {
                    snapshot.insert(name.clone(), SavedProgress::Count(*count));
                }
                ProgressValue::UniqueSet(ids) if !ids.is_empty() => {
                    snapshot.insert(name.clone(), SavedProgress::Ids(ids.iter().cloned().collect()));
                }
                _ => {}
            }
        }
        self.store.save(&snapshot);
    }

    /// Replay the persisted snapshot with silent notifications and without
    /// writing back to the store
    fn restore(&mut self) {
        let snapshot = self.store.load();
        for (name, saved) in snapshot {
            let update = match saved {
                SavedProgress::Count(count) => ProgressUpdate::Count(count),
                SavedProgress::Ids(ids) => ProgressUpdate::Ids(ids),
            };
            if let Err(e) = self.apply_value(&name, update, true) {
                warn!("Ignoring persisted progress: {}", e);
            }
        }
        self.check_dependencies(true);
        self.recompute_global(true);
    }
}
