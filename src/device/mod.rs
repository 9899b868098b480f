// src/device/mod.rs
//! A display device: its bounds, its modes, and the change/restore state machine.
//!
//! Devices are handed out by `DisplayRegistry` and talk to the native layer
//! only through the shared `DisplayDriver`. A device records the mode it had
//! before the first change made through it, so the change can be undone.
//!
//! A `Device` is mutated through `&mut self`; sharing one device between
//! threads needs external synchronization (e.g. a `Mutex<Device>`).

use crate::driver::{DeviceSnapshot, DisplayDriver};
use crate::error::DisplayError;
use crate::geometry::Rect;
use crate::registry::primary::PrimarySlot;
use crate::resolution::Resolution;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Opaque platform identifier of a display (output name, handle, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a device stands with respect to mode changes made through it.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeState {
    /// No change has been made; nothing to restore.
    Unchanged,
    /// At least one change succeeded; `original` is the mode to go back to.
    Changed { original: Resolution },
    /// A restore is in flight. Left behind only if the driver call unwound,
    /// in which case a later restore retries it.
    Restoring { original: Resolution },
}

impl ModeState {
    pub fn original(&self) -> Option<&Resolution> {
        match self {
            ModeState::Unchanged => None,
            ModeState::Changed { original } | ModeState::Restoring { original } => Some(original),
        }
    }
}

pub struct Device {
    id: DeviceId,
    bounds: Rect,
    current: Resolution,
    state: ModeState,
    /// Sorted best-first, no duplicates.
    available: Vec<Resolution>,
    primary: Arc<PrimarySlot>,
    driver: Arc<dyn DisplayDriver>,
    refresh_tolerance_hz: f32,
}

impl Device {
    pub(crate) fn from_snapshot(
        snapshot: DeviceSnapshot,
        driver: Arc<dyn DisplayDriver>,
        primary: Arc<PrimarySlot>,
        refresh_tolerance_hz: f32,
    ) -> Self {
        let bounds = if snapshot.bounds.is_empty() {
            snapshot.current.bounds()
        } else {
            snapshot.bounds
        };
        let mut device = Device {
            id: snapshot.id,
            bounds,
            current: snapshot.current,
            state: ModeState::Unchanged,
            available: Vec::new(),
            primary,
            driver,
            refresh_tolerance_hz,
        };
        device.set_available_resolutions(snapshot.available);
        device
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Bounds in desktop pixel coordinates.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Moves or resizes the device. The current mode's size follows the new
    /// bounds, for platforms that report geometry and modes separately.
    pub fn set_bounds(&mut self, bounds: Rect) -> Result<(), DisplayError> {
        if bounds.width <= 0 {
            return Err(DisplayError::invalid("bounds.width", "must be greater than zero"));
        }
        if bounds.height <= 0 {
            return Err(DisplayError::invalid("bounds.height", "must be greater than zero"));
        }
        self.bounds = bounds;
        self.current
            .set_size(bounds.width as u32, bounds.height as u32);
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.current.width()
    }

    pub fn height(&self) -> u32 {
        self.current.height()
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.current.bits_per_pixel()
    }

    pub fn refresh_rate(&self) -> f32 {
        self.current.refresh_rate()
    }

    pub fn current_resolution(&self) -> &Resolution {
        &self.current
    }

    /// The mode to restore, if a change has been made through this device.
    pub fn original_resolution(&self) -> Option<&Resolution> {
        self.state.original()
    }

    pub fn mode_state(&self) -> &ModeState {
        &self.state
    }

    /// Whether this device holds its registry's primary slot. Use
    /// `DisplayRegistry::set_primary` to move it.
    pub fn is_primary(&self) -> bool {
        self.primary.is(&self.id)
    }

    /// Supported modes, best first.
    pub fn available_resolutions(&self) -> &[Resolution] {
        &self.available
    }

    /// Replaces the supported modes, dropping duplicates and sorting best first.
    pub fn set_available_resolutions(&mut self, mut modes: Vec<Resolution>) {
        modes.sort();
        modes.dedup();
        self.available = modes;
    }

    /// Finds the best supported mode matching the request.
    ///
    /// Width and height must match exactly, so a non-positive size never
    /// matches. A color depth or refresh rate of 0 or below does not constrain
    /// its field. A requested refresh rate matches within the configured
    /// tolerance (1 Hz by default).
    /// Because the list is sorted best-first, the first hit is the best one;
    /// no constraint is relaxed on a miss.
    pub fn select_resolution(
        &self,
        width: i32,
        height: i32,
        bits_per_pixel: i32,
        refresh_rate: f32,
    ) -> Option<&Resolution> {
        self.available.iter().find(|res| {
            i64::from(res.width()) == i64::from(width)
                && i64::from(res.height()) == i64::from(height)
                && (bits_per_pixel <= 0
                    || i64::from(res.bits_per_pixel()) == i64::from(bits_per_pixel))
                && (refresh_rate <= 0.0
                    || (res.refresh_rate() - refresh_rate).abs() < self.refresh_tolerance_hz)
        })
    }

    /// Switches to `resolution`, or restores the original mode when given `None`.
    ///
    /// Changing to the current mode is a no-op that never reaches the driver.
    /// On failure the device is left exactly as it was.
    pub fn change_resolution(&mut self, resolution: Option<&Resolution>) -> Result<(), DisplayError> {
        let Some(requested) = resolution else {
            return self.restore_resolution();
        };
        if *requested == self.current {
            debug!("Device {}: already at {}", self.id, requested);
            return Ok(());
        }

        if !self.driver.try_change_resolution(&self.id, requested) {
            warn!("Device {}: driver rejected {}", self.id, requested);
            return Err(DisplayError::ModeChangeFailed {
                device: self.id.clone(),
                requested: requested.clone(),
            });
        }

        if matches!(self.state, ModeState::Unchanged) {
            self.state = ModeState::Changed {
                original: self.current.clone(),
            };
        }
        info!("Device {}: changed {} -> {}", self.id, self.current, requested);
        self.current = requested.clone();
        Ok(())
    }

    /// Selects a mode and switches to it. Returns the mode switched to, or
    /// `None` when nothing matched (in which case nothing happens).
    pub fn change_resolution_to(
        &mut self,
        width: i32,
        height: i32,
        bits_per_pixel: i32,
        refresh_rate: f32,
    ) -> Result<Option<Resolution>, DisplayError> {
        let Some(mode) = self
            .select_resolution(width, height, bits_per_pixel, refresh_rate)
            .cloned()
        else {
            debug!(
                "Device {}: no mode matches {}x{}x{}@{}Hz",
                self.id, width, height, bits_per_pixel, refresh_rate
            );
            return Ok(None);
        };
        self.change_resolution(Some(&mode))?;
        Ok(Some(mode))
    }

    /// Reverts to the mode from before the first change. A no-op when
    /// nothing was changed; on failure the original is kept for a retry.
    pub fn restore_resolution(&mut self) -> Result<(), DisplayError> {
        let original = match std::mem::replace(&mut self.state, ModeState::Unchanged) {
            ModeState::Unchanged => return Ok(()),
            ModeState::Changed { original } | ModeState::Restoring { original } => original,
        };
        self.state = ModeState::Restoring {
            original: original.clone(),
        };

        if self.driver.try_restore_resolution(&self.id) {
            info!("Device {}: restored {}", self.id, original);
            self.current = original;
            self.state = ModeState::Unchanged;
            Ok(())
        } else {
            warn!("Device {}: driver failed to restore {}", self.id, original);
            self.state = ModeState::Changed {
                original: original.clone(),
            };
            Err(DisplayError::ModeRestoreFailed {
                device: self.id.clone(),
                original,
            })
        }
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("current", &self.current)
            .field("state", &self.state)
            .field("available", &self.available.len())
            .field("is_primary", &self.is_primary())
            .finish()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} display ({}x{}@{}Hz) with {} modes available",
            if self.is_primary() { "Primary" } else { "Secondary" },
            self.width(),
            self.height(),
            self.refresh_rate(),
            self.available.len()
        )
    }
}

#[derive(Serialize)]
struct DeviceView<'a> {
    id: &'a DeviceId,
    bounds: Rect,
    is_primary: bool,
    current: &'a Resolution,
    original: Option<&'a Resolution>,
    available: &'a [Resolution],
}

impl Serialize for Device {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DeviceView {
            id: &self.id,
            bounds: self.bounds,
            is_primary: self.is_primary(),
            current: &self.current,
            original: self.original_resolution(),
            available: &self.available,
        }
        .serialize(serializer)
    }
}
