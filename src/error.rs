// src/error.rs
//! Error taxonomy for display queries and mode changes.
//!
//! A selection miss is not an error: `Device::select_resolution` returns
//! `None` for that case.

use crate::device::DeviceId;
use crate::resolution::Resolution;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DisplayError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },
    #[error("device {0}: not reported by the display driver")]
    UnknownDevice(DeviceId),
    #[error("platform display query failed: {0}")]
    PlatformQueryFailed(String),
    #[error("device {device}: failed to change resolution to {requested}")]
    ModeChangeFailed {
        device: DeviceId,
        requested: Resolution,
    },
    #[error("device {device}: failed to restore resolution {original}")]
    ModeRestoreFailed {
        device: DeviceId,
        original: Resolution,
    },
}

impl DisplayError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        DisplayError::InvalidArgument { name, reason }
    }
}
