//! Headless display driver implementation.
//!
//! Keeps an in-memory picture of "native" display state so the registry and
//! devices can be exercised without a display server. Mode switches succeed
//! only for modes the simulated display lists, the mode in effect before the
//! first switch is remembered for restoring, and failures can be injected.

use crate::config::{HeadlessConfig, HeadlessDisplayConfig};
use crate::device::DeviceId;
use crate::driver::{DeviceSnapshot, DisplayDriver};
use crate::error::DisplayError;
use crate::geometry::Rect;
use crate::resolution::Resolution;
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Modes of the display served when no layout is configured, best first.
const DEFAULT_MODES: &[(i32, i32, i32, f32)] = &[
    (1920, 1080, 32, 60.0),
    (1600, 900, 32, 60.0),
    (1280, 720, 32, 60.0),
    (1024, 768, 32, 60.0),
];

const DEFAULT_DISPLAY_ID: &str = "HEADLESS-0";

#[derive(Debug, Clone)]
struct HeadlessDisplay {
    id: DeviceId,
    bounds: Rect,
    current: Resolution,
    /// Native mode before the first switch; taken on restore.
    saved: Option<Resolution>,
    modes: Vec<Resolution>,
    primary: bool,
}

impl HeadlessDisplay {
    fn from_config(config: &HeadlessDisplayConfig) -> Self {
        let mut modes = config.modes.clone();
        if !modes.contains(&config.current) {
            modes.push(config.current.clone());
        }
        Self {
            id: DeviceId::new(config.id.clone()),
            bounds: config.bounds.unwrap_or_else(|| config.current.bounds()),
            current: config.current.clone(),
            saved: None,
            modes,
            primary: config.primary,
        }
    }

    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            id: self.id.clone(),
            bounds: self.bounds,
            current: self.current.clone(),
            is_primary: self.primary,
            available: self.modes.clone(),
        }
    }

    fn apply(&mut self, mode: Resolution) {
        self.bounds.width = mode.width() as i32;
        self.bounds.height = mode.height() as i32;
        self.current = mode;
    }
}

pub struct HeadlessDisplayDriver {
    displays: Mutex<Vec<HeadlessDisplay>>,
    fail_enumeration: AtomicBool,
    fail_restore: AtomicBool,
    change_calls: AtomicUsize,
    restore_calls: AtomicUsize,
}

impl HeadlessDisplayDriver {
    /// Serves `displays` in the given order.
    pub fn new(displays: &[HeadlessDisplayConfig]) -> Self {
        info!("HeadlessDisplayDriver::new() with {} display(s)", displays.len());
        Self::with_displays(displays.iter().map(HeadlessDisplay::from_config).collect())
    }

    /// Uses the configured layout, or a single 1920x1080 primary display
    /// when none is configured.
    pub fn from_config(config: &HeadlessConfig) -> Self {
        if config.displays.is_empty() {
            info!("HeadlessDisplayDriver: no displays configured, using default layout");
            Self::with_displays(default_displays())
        } else {
            Self::new(&config.displays)
        }
    }

    fn with_displays(displays: Vec<HeadlessDisplay>) -> Self {
        Self {
            displays: Mutex::new(displays),
            fail_enumeration: AtomicBool::new(false),
            fail_restore: AtomicBool::new(false),
            change_calls: AtomicUsize::new(0),
            restore_calls: AtomicUsize::new(0),
        }
    }

    fn displays(&self) -> MutexGuard<'_, Vec<HeadlessDisplay>> {
        self.displays.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every enumeration fail, as if the display server went away.
    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Makes every restore attempt report failure.
    pub fn set_fail_restore(&self, fail: bool) {
        self.fail_restore.store(fail, Ordering::SeqCst);
    }

    /// Number of `try_change_resolution` calls received so far.
    pub fn change_calls(&self) -> usize {
        self.change_calls.load(Ordering::SeqCst)
    }

    /// Number of `try_restore_resolution` calls received so far.
    pub fn restore_calls(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }

    /// The mode the simulated hardware is running.
    pub fn native_mode(&self, device: &DeviceId) -> Option<Resolution> {
        self.displays()
            .iter()
            .find(|d| &d.id == device)
            .map(|d| d.current.clone())
    }

    /// Moves the OS-level primary flag, as a user would in system settings.
    /// Returns `false` if no display has that id.
    pub fn set_native_primary(&self, device: &DeviceId) -> bool {
        let mut displays = self.displays();
        if !displays.iter().any(|d| &d.id == device) {
            return false;
        }
        for display in displays.iter_mut() {
            display.primary = &display.id == device;
        }
        true
    }
}

impl Default for HeadlessDisplayDriver {
    fn default() -> Self {
        Self::with_displays(default_displays())
    }
}

fn default_displays() -> Vec<HeadlessDisplay> {
    let modes: Vec<Resolution> = DEFAULT_MODES
        .iter()
        .filter_map(|&(w, h, bpp, hz)| Resolution::new(0, 0, w, h, bpp, hz).ok())
        .collect();
    let Some(current) = modes.first().cloned() else {
        return Vec::new();
    };
    vec![HeadlessDisplay {
        id: DeviceId::new(DEFAULT_DISPLAY_ID),
        bounds: current.bounds(),
        current,
        saved: None,
        modes,
        primary: true,
    }]
}

impl DisplayDriver for HeadlessDisplayDriver {
    fn enumerate_devices(&self) -> Result<Vec<DeviceSnapshot>, DisplayError> {
        if self.fail_enumeration.load(Ordering::SeqCst) {
            warn!("HeadlessDisplayDriver: enumeration failure injected");
            return Err(DisplayError::PlatformQueryFailed(
                "headless display server unavailable".to_string(),
            ));
        }
        let snapshots: Vec<DeviceSnapshot> =
            self.displays().iter().map(HeadlessDisplay::snapshot).collect();
        trace!("HeadlessDisplayDriver: enumerated {} display(s)", snapshots.len());
        Ok(snapshots)
    }

    fn try_change_resolution(&self, device: &DeviceId, requested: &Resolution) -> bool {
        self.change_calls.fetch_add(1, Ordering::SeqCst);
        let mut displays = self.displays();
        let Some(display) = displays.iter_mut().find(|d| &d.id == device) else {
            warn!("HeadlessDisplayDriver: no display {}", device);
            return false;
        };
        if !display.modes.contains(requested) {
            debug!(
                "HeadlessDisplayDriver: {} does not support {}",
                device, requested
            );
            return false;
        }
        if display.saved.is_none() {
            display.saved = Some(display.current.clone());
        }
        display.apply(requested.clone());
        info!("HeadlessDisplayDriver: {} switched to {}", device, requested);
        true
    }

    fn try_restore_resolution(&self, device: &DeviceId) -> bool {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_restore.load(Ordering::SeqCst) {
            warn!("HeadlessDisplayDriver: restore failure injected for {}", device);
            return false;
        }
        let mut displays = self.displays();
        let Some(display) = displays.iter_mut().find(|d| &d.id == device) else {
            warn!("HeadlessDisplayDriver: no display {}", device);
            return false;
        };
        if let Some(saved) = display.saved.take() {
            info!("HeadlessDisplayDriver: {} restored to {}", device, saved);
            display.apply(saved);
        }
        true
    }
}
