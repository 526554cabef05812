//! Progress persistence
//!
//! Snapshots are a flat map of group name to saved progress; only groups
//! with progress worth keeping are recorded, so absent keys mean zero on
//! load. A missing or unparsable snapshot is treated as empty progress and
//! never prevents startup.
//!
//! The JSON file store fills the role browser local storage plays when the
//! game runs embedded in a web page.

use anyhow::Context;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Saved progress for one group: a plain count or a list of unique ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedProgress {
    Count(u64),
    Ids(Vec<String>),
}

/// Full persisted snapshot, keyed by group name
pub type ProgressSnapshot = BTreeMap<String, SavedProgress>;

/// Durable key-value persistence for achievement progress
pub trait ProgressStore {
    /// Load the last saved snapshot. Absence and corruption both read as an
    /// empty snapshot.
    fn load(&mut self) -> ProgressSnapshot;

    /// Persist the given snapshot, replacing any previous one.
    fn save(&mut self, snapshot: &ProgressSnapshot);
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    snapshot: ProgressSnapshot,
    save_count: usize,
}

/// In-memory store for tests and ephemeral sessions.
///
/// Clones share the same underlying snapshot, so a handle kept outside the
/// engine can inspect what was persisted.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryStoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a snapshot, as if a previous run had saved it
    pub fn with_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryStoreInner {
                snapshot,
                save_count: 0,
            })),
        }
    }

    /// Copy of the currently persisted snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.borrow().snapshot.clone()
    }

    /// How many times `save` has been called
    pub fn save_count(&self) -> usize {
        self.inner.borrow().save_count
    }
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> ProgressSnapshot {
        self.inner.borrow().snapshot.clone()
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) {
        let mut inner = self.inner.borrow_mut();
        inner.snapshot = snapshot.clone();
        inner.save_count += 1;
    }
}

/// JSON file on disk, used when no browser storage is available
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<ProgressSnapshot> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading progress file {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&json)
            .with_context(|| format!("parsing progress file {}", self.path.display()))?;
        Ok(snapshot)
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&mut self) -> ProgressSnapshot {
        if !self.path.exists() {
            debug!("No progress file at {}, starting fresh", self.path.display());
            return ProgressSnapshot::new();
        }

        match self.read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Fail open: bad data reads as no progress
                warn!("Failed to load progress, starting fresh: {:#}", e);
                ProgressSnapshot::new()
            }
        }
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) {
        let json = match serde_json::to_string_pretty(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize progress snapshot: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(
                        "Failed to create progress directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
        }

        match std::fs::write(&self.path, &json) {
            Ok(()) => debug!("Saved progress to {}", self.path.display()),
            Err(e) => warn!("Failed to save progress to {}: {}", self.path.display(), e),
        }
    }
}
