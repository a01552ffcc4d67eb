//! # Engine State
//!
//! The snapshot is the only shared mutable data in the engine.
//!
//! ```text
//! Snapshot
//! ├── log: String             // outcome of the latest action
//! ├── flux: NetFlux           // last known good usage report
//! ├── mode: ConnectionMode    // authentication path for the next action
//! └── busy: bool              // a portal conversation is in flight
//! ```
//!
//! Writers are the dispatcher's workers (and `set_mode`). Readers anywhere get
//! a full copy taken under the lock, so a half-written snapshot is never seen.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::auth::{ConnectionMode, NetFlux};

/// The externally observable state at one instant.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub log: String,
    pub flux: NetFlux,
    pub mode: ConnectionMode,
    pub busy: bool,
}

#[derive(Debug, Default)]
pub struct StateStore {
    inner: RwLock<Snapshot>,
}

impl StateStore {
    pub fn new(mode: ConnectionMode) -> Self {
        Self {
            inner: RwLock::new(Snapshot {
                mode,
                ..Snapshot::default()
            }),
        }
    }

    // Every write replaces whole fields, so a poisoned lock still guards
    // a consistent snapshot.
    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    pub fn log(&self) -> String {
        self.read().log.clone()
    }

    pub fn flux(&self) -> NetFlux {
        self.read().flux.clone()
    }

    pub fn mode(&self) -> ConnectionMode {
        self.read().mode
    }

    pub fn busy(&self) -> bool {
        self.read().busy
    }

    pub fn set_log(&self, log: impl Into<String>) {
        self.write().log = log.into();
    }

    pub fn set_flux(&self, flux: NetFlux) {
        self.write().flux = flux;
    }

    /// Returns `true` if the mode actually changed.
    pub fn set_mode(&self, mode: ConnectionMode) -> bool {
        let mut snapshot = self.write();
        let changed = snapshot.mode != mode;
        snapshot.mode = mode;
        changed
    }

    /// Returns the previous value.
    pub fn set_busy(&self, busy: bool) -> bool {
        std::mem::replace(&mut self.write().busy, busy)
    }
}
