// src/registry/primary.rs
//! The primary-display slot shared by a registry and every device it hands out.
//!
//! Holding a single `Option<DeviceId>` behind one lock is what makes "at most
//! one primary" hold: promoting a device replaces the previous id in the same
//! critical section, so readers see either the old primary or the new one.

use crate::config::PrimaryResync;
use crate::device::DeviceId;
use crate::driver::DeviceSnapshot;
use log::info;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PrimaryState {
    /// Not yet read from the driver.
    Unresolved,
    Resolved(Option<DeviceId>),
}

#[derive(Debug)]
pub(crate) struct PrimarySlot {
    state: Mutex<PrimaryState>,
}

impl PrimarySlot {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(PrimaryState::Unresolved),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PrimaryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_resolved(&self) -> bool {
        *self.lock() != PrimaryState::Unresolved
    }

    pub(crate) fn current(&self) -> Option<DeviceId> {
        match &*self.lock() {
            PrimaryState::Resolved(id) => id.clone(),
            PrimaryState::Unresolved => None,
        }
    }

    pub(crate) fn is(&self, device: &DeviceId) -> bool {
        matches!(&*self.lock(), PrimaryState::Resolved(Some(id)) if id == device)
    }

    /// Installs `device` as primary and returns the one it replaced.
    pub(crate) fn replace(&self, device: Option<DeviceId>) -> Option<DeviceId> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, PrimaryState::Resolved(device)) {
            PrimaryState::Resolved(previous) => previous,
            PrimaryState::Unresolved => None,
        }
    }

    /// Reconciles the slot with a full enumeration.
    ///
    /// The driver's report is adopted when the slot is unresolved, when the
    /// policy is `EveryQuery`, or when the cached primary has disappeared.
    pub(crate) fn sync(&self, snapshots: &[DeviceSnapshot], policy: PrimaryResync) {
        let reported = snapshots.iter().find(|s| s.is_primary).map(|s| s.id.clone());
        let mut state = self.lock();
        let resync = match (&*state, policy) {
            (PrimaryState::Unresolved, _) => true,
            (_, PrimaryResync::EveryQuery) => true,
            (PrimaryState::Resolved(Some(cached)), PrimaryResync::OnRefresh) => {
                !snapshots.iter().any(|s| &s.id == cached)
            }
            (PrimaryState::Resolved(None), PrimaryResync::OnRefresh) => false,
        };
        let next = PrimaryState::Resolved(reported);
        if resync && *state != next {
            info!("Primary display resynced from driver: {:?}", next);
            *state = next;
        }
    }

    /// Adopts the driver's report unconditionally, in one critical section.
    pub(crate) fn adopt(&self, snapshots: &[DeviceSnapshot]) {
        let reported = snapshots.iter().find(|s| s.is_primary).map(|s| s.id.clone());
        let mut state = self.lock();
        info!("Primary display refreshed from driver: {:?}", reported);
        *state = PrimaryState::Resolved(reported);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::resolution::Resolution;

    fn snapshot(id: &str, primary: bool) -> DeviceSnapshot {
        let current = Resolution::new(0, 0, 800, 600, 32, 60.0).unwrap();
        DeviceSnapshot {
            id: DeviceId::new(id),
            bounds: Rect::default(),
            current: current.clone(),
            is_primary: primary,
            available: vec![current],
        }
    }

    #[test_log::test]
    fn it_should_adopt_the_reported_primary_on_first_sync() {
        let slot = PrimarySlot::new();
        assert!(!slot.is_resolved());
        slot.sync(&[snapshot("A", false), snapshot("B", true)], PrimaryResync::OnRefresh);
        assert_eq!(slot.current(), Some(DeviceId::new("B")));
        assert!(slot.is(&DeviceId::new("B")));
        assert!(!slot.is(&DeviceId::new("A")));
    }

    #[test_log::test]
    fn it_should_keep_a_manual_primary_until_refreshed() {
        let slot = PrimarySlot::new();
        let snapshots = [snapshot("A", true), snapshot("B", false)];
        slot.sync(&snapshots, PrimaryResync::OnRefresh);
        assert_eq!(slot.replace(Some(DeviceId::new("B"))), Some(DeviceId::new("A")));

        slot.sync(&snapshots, PrimaryResync::OnRefresh);
        assert_eq!(slot.current(), Some(DeviceId::new("B")));

        slot.sync(&snapshots, PrimaryResync::EveryQuery);
        assert_eq!(slot.current(), Some(DeviceId::new("A")));
    }

    #[test_log::test]
    fn it_should_resync_when_the_cached_primary_disappears() {
        let slot = PrimarySlot::new();
        slot.replace(Some(DeviceId::new("GONE")));
        slot.sync(&[snapshot("A", true)], PrimaryResync::OnRefresh);
        assert_eq!(slot.current(), Some(DeviceId::new("A")));
    }

    #[test_log::test]
    fn it_should_respect_a_cleared_primary() {
        let slot = PrimarySlot::new();
        slot.sync(&[snapshot("A", true)], PrimaryResync::OnRefresh);
        slot.replace(None);
        slot.sync(&[snapshot("A", true)], PrimaryResync::OnRefresh);
        assert_eq!(slot.current(), None);

        slot.adopt(&[snapshot("A", true)]);
        assert_eq!(slot.current(), Some(DeviceId::new("A")));
    }
}
