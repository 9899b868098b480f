//! Display device enumeration and mode switching.
//!
//! - `Resolution`: one display mode, totally ordered best-first
//! - `Device`: a display's bounds and modes, with change/restore bookkeeping
//! - `DisplayRegistry`: device lookups and the single primary display
//! - `DisplayDriver`: the native boundary; `HeadlessDisplayDriver` simulates it

pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod registry;
pub mod resolution;

pub use device::{Device, DeviceId, ModeState};
pub use driver::{DeviceSnapshot, DisplayDriver, HeadlessDisplayDriver};
pub use error::DisplayError;
pub use geometry::Rect;
pub use registry::{DisplayIndex, DisplayRegistry};
pub use resolution::{AspectRatio, Resolution};
