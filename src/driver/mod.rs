// src/driver/mod.rs
//! DisplayDriver trait - the native boundary for display enumeration and mode switching.
//!
//! Everything platform-specific lives behind this trait: asking the OS which
//! monitors exist, what modes they support, and switching or reverting a mode.
//! The registry and devices only ever talk to a driver through it.
//!
//! ## Threading Model
//! - Drivers are shared between the registry and every `Device` it hands out,
//!   so implementations must be `Send + Sync`.
//! - Calls are synchronous and may block on the native API. Callers never hold
//!   the registry lock across a driver call.
//!
//! ## Failure Model
//! - Enumeration failures are errors (`PlatformQueryFailed`).
//! - A rejected mode switch or restore is a normal `false` outcome; the device
//!   turns it into `ModeChangeFailed` / `ModeRestoreFailed` with context.

pub mod headless;

pub use headless::HeadlessDisplayDriver;

use crate::device::DeviceId;
use crate::error::DisplayError;
use crate::geometry::Rect;
use crate::resolution::Resolution;
use serde::Serialize;
use std::sync::Arc;

/// Everything the driver knows about one display at query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    /// An empty rectangle means "use the current mode's bounds".
    pub bounds: Rect,
    pub current: Resolution,
    pub is_primary: bool,
    /// Raw native order; may contain duplicates.
    pub available: Vec<Resolution>,
}

pub trait DisplayDriver: Send + Sync {
    /// All displays, in the platform's enumeration order.
    fn enumerate_devices(&self) -> Result<Vec<DeviceSnapshot>, DisplayError>;

    /// Attempts a native mode switch. An unsupported mode returns `false`.
    fn try_change_resolution(&self, device: &DeviceId, requested: &Resolution) -> bool;

    /// Reverts the device to its mode from before the first switch.
    fn try_restore_resolution(&self, device: &DeviceId) -> bool;

    /// The `index`-th display, or `None` past the end.
    fn get_display(&self, index: usize) -> Result<Option<DeviceSnapshot>, DisplayError> {
        Ok(self.enumerate_devices()?.into_iter().nth(index))
    }
}

/// The driver used when nothing else has been installed.
///
/// Native bindings are provided by the embedding application; without one the
/// headless driver serves the displays described in `CONFIG.headless`.
pub fn default_driver() -> Arc<dyn DisplayDriver> {
    use crate::config::CONFIG;

    Arc::new(HeadlessDisplayDriver::from_config(&CONFIG.headless))
}
