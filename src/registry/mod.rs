// src/registry/mod.rs
//! DisplayRegistry - device lookups and the process-wide primary display.
//!
//! The registry never caches devices: every lookup asks the driver for fresh
//! snapshots and wraps them in new `Device` values. The only state it keeps is
//! the primary slot, shared with the devices it creates so `is_primary` always
//! reflects the latest `set_primary`.
//!
//! ## Primary resync
//! The cached primary is read from the driver lazily, on the first lookup.
//! After that it follows `RegistryConfig::primary_resync`: with `OnRefresh`
//! (the default) only `refresh()` re-reads it, or a lookup that finds the
//! cached device gone; with `EveryQuery` each lookup adopts the driver's view.

pub(crate) mod primary;

use crate::config::{PrimaryResync, RegistryConfig, CONFIG};
use crate::device::{Device, DeviceId};
use crate::driver::{default_driver, DeviceSnapshot, DisplayDriver};
use crate::error::DisplayError;
use crate::geometry::Rect;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use primary::PrimarySlot;
use std::fmt;
use std::sync::Arc;

/// Names a display for `DisplayRegistry::display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayIndex {
    /// Whichever display currently holds the primary slot.
    Primary,
    /// Position in the driver's enumeration order.
    Nth(usize),
}

impl DisplayIndex {
    pub const FIRST: DisplayIndex = DisplayIndex::Nth(0);
    pub const SECOND: DisplayIndex = DisplayIndex::Nth(1);
    pub const THIRD: DisplayIndex = DisplayIndex::Nth(2);
    pub const FOURTH: DisplayIndex = DisplayIndex::Nth(3);
    pub const FIFTH: DisplayIndex = DisplayIndex::Nth(4);
    pub const SIXTH: DisplayIndex = DisplayIndex::Nth(5);
}

pub struct DisplayRegistry {
    driver: Arc<dyn DisplayDriver>,
    primary: Arc<PrimarySlot>,
    config: RegistryConfig,
}

impl DisplayRegistry {
    pub fn new(driver: Arc<dyn DisplayDriver>, config: RegistryConfig) -> Self {
        Self {
            driver,
            primary: Arc::new(PrimarySlot::new()),
            config,
        }
    }

    /// A registry configured from `CONFIG.registry`.
    pub fn with_driver(driver: Arc<dyn DisplayDriver>) -> Self {
        Self::new(driver, CONFIG.registry.clone())
    }

    pub fn driver(&self) -> &Arc<dyn DisplayDriver> {
        &self.driver
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn wrap(&self, snapshot: DeviceSnapshot) -> Device {
        Device::from_snapshot(
            snapshot,
            Arc::clone(&self.driver),
            Arc::clone(&self.primary),
            self.config.refresh_tolerance_hz,
        )
    }

    /// Enumerates and reconciles the primary slot. The slot lock is only
    /// taken after the driver call has returned.
    fn enumerate(&self) -> Result<Vec<DeviceSnapshot>, DisplayError> {
        let snapshots = self.driver.enumerate_devices()?;
        self.primary.sync(&snapshots, self.config.primary_resync);
        Ok(snapshots)
    }

    /// Single-index lookups can't see the whole topology, so resolve the
    /// primary slot with a full enumeration first when the policy asks for it.
    fn sync_if_needed(&self) -> Result<(), DisplayError> {
        if !self.primary.is_resolved() || self.config.primary_resync == PrimaryResync::EveryQuery {
            self.enumerate()?;
        }
        Ok(())
    }

    /// Every display, in enumeration order.
    pub fn devices(&self) -> Result<Vec<Device>, DisplayError> {
        Ok(self
            .enumerate()?
            .into_iter()
            .map(|snapshot| self.wrap(snapshot))
            .collect())
    }

    /// The `index`-th display, or `None` past the end.
    pub fn get_device(&self, index: usize) -> Result<Option<Device>, DisplayError> {
        self.sync_if_needed()?;
        Ok(self.driver.get_display(index)?.map(|s| self.wrap(s)))
    }

    pub fn display(&self, index: DisplayIndex) -> Result<Option<Device>, DisplayError> {
        match index {
            DisplayIndex::Primary => self.primary_device(),
            DisplayIndex::Nth(n) => self.get_device(n),
        }
    }

    /// The display holding the primary slot. `None` when the slot was
    /// cleared or the driver reports no primary.
    pub fn primary_device(&self) -> Result<Option<Device>, DisplayError> {
        Ok(self.devices()?.into_iter().find(Device::is_primary))
    }

    /// Makes `device` the primary display, demoting the previous one in the
    /// same critical section. Returns the demoted id.
    ///
    /// The driver is asked for the current topology first; an id it does not
    /// report is rejected with `UnknownDevice` and the slot is left untouched.
    pub fn set_primary(&self, device: &DeviceId) -> Result<Option<DeviceId>, DisplayError> {
        let snapshots = self.driver.enumerate_devices()?;
        if !snapshots.iter().any(|snapshot| &snapshot.id == device) {
            warn!("Refusing to make unknown display {} primary", device);
            return Err(DisplayError::UnknownDevice(device.clone()));
        }
        let previous = self.primary.replace(Some(device.clone()));
        if previous.as_ref() != Some(device) {
            info!("Primary display: {:?} -> {}", previous, device);
        }
        Ok(previous)
    }

    /// Leaves no display marked primary. Returns the demoted id.
    pub fn clear_primary(&self) -> Option<DeviceId> {
        let previous = self.primary.replace(None);
        info!("Primary display cleared (was {:?})", previous);
        previous
    }

    /// Id of the primary display as currently cached, without querying the driver.
    pub fn primary_id(&self) -> Option<DeviceId> {
        self.primary.current()
    }

    /// Re-reads the primary display from the driver, discarding any
    /// `set_primary` / `clear_primary` made since the last refresh.
    pub fn refresh(&self) -> Result<(), DisplayError> {
        let snapshots = self.driver.enumerate_devices()?;
        self.primary.adopt(&snapshots);
        Ok(())
    }

    /// The first display, probing indices in ascending order up to
    /// `max_point_search`, whose bounds contain the point.
    pub fn find_device_containing_point(&self, x: i32, y: i32) -> Result<Option<Device>, DisplayError> {
        self.sync_if_needed()?;
        for index in 0..self.config.max_point_search {
            let Some(snapshot) = self.driver.get_display(index)? else {
                continue;
            };
            let device = self.wrap(snapshot);
            if device.bounds().contains(x, y) {
                debug!("Point ({}, {}) is on display {}", x, y, device.id());
                return Ok(Some(device));
            }
        }
        Ok(None)
    }

    /// The display showing the largest part of `bounds`, usually a window's
    /// rectangle. Ties go to the display enumerated first.
    pub fn find_device_with_largest_overlap(&self, bounds: Rect) -> Result<Option<Device>, DisplayError> {
        let mut best: Option<(i64, Device)> = None;
        for device in self.devices()? {
            let Some(overlap) = device.bounds().intersection(&bounds) else {
                continue;
            };
            let area = overlap.area();
            if best.as_ref().map_or(area > 0, |(best_area, _)| area > *best_area) {
                best = Some((area, device));
            }
        }
        Ok(best.map(|(_, device)| device))
    }
}

impl fmt::Debug for DisplayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayRegistry")
            .field("primary", &self.primary.current())
            .field("config", &self.config)
            .finish()
    }
}

static GLOBAL: OnceCell<DisplayRegistry> = OnceCell::new();

/// Installs the process-wide registry. Fails, handing the registry back, if
/// one was already installed or lazily created by `global()`.
pub fn install(registry: DisplayRegistry) -> Result<&'static DisplayRegistry, DisplayRegistry> {
    GLOBAL
        .try_insert(registry)
        .map_err(|(_, rejected)| rejected)
}

/// The process-wide registry, created with the default driver on first use.
pub fn global() -> &'static DisplayRegistry {
    GLOBAL.get_or_init(|| {
        info!("Creating process-wide display registry with the default driver");
        DisplayRegistry::with_driver(default_driver())
    })
}

#[cfg(test)]
mod tests;
