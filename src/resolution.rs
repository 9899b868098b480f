// src/resolution.rs
//! The `Resolution` value type: one display mode of a device.
//!
//! Resolutions compare by value (size, color depth, refresh rate) and sort in
//! descending order of preference, so the first element of a sorted mode list
//! is the "best" mode: tallest, then widest, then fastest, then deepest.

use crate::error::DisplayError;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Friendly name for the proportion between width and height of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    Ratio16x9,
    Ratio4x3,
    Ratio3x2,
    Ratio5x3,
    Ratio5x4,
    Ratio16x10,
    Ratio17x9,
    Ratio18x9,
    Ratio21x9,
    #[default]
    Unknown,
}

/// Inclusive `(lower, upper)` bands of `width / height`. Order matters: the
/// first band containing the ratio wins.
const ASPECT_RATIO_BANDS: &[(f64, f64, AspectRatio)] = &[
    (1.77, 1.8, AspectRatio::Ratio16x9),
    (1.33, 1.34, AspectRatio::Ratio4x3),
    (1.5, 1.5, AspectRatio::Ratio3x2),
    (1.66, 1.67, AspectRatio::Ratio5x3),
    (1.25, 1.25, AspectRatio::Ratio5x4),
    (1.6, 1.6, AspectRatio::Ratio16x10),
    (1.88, 1.89, AspectRatio::Ratio17x9),
    (2.0, 2.0, AspectRatio::Ratio18x9),
    (2.33, 2.34, AspectRatio::Ratio21x9),
];

impl AspectRatio {
    pub fn classify(width: u32, height: u32) -> Self {
        if height == 0 {
            return AspectRatio::Unknown;
        }
        let ratio = f64::from(width) / f64::from(height);
        ASPECT_RATIO_BANDS
            .iter()
            .find(|(lower, upper, _)| ratio >= *lower && ratio <= *upper)
            .map(|(_, _, aspect)| *aspect)
            .unwrap_or(AspectRatio::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Ratio16x9 => "16:9",
            AspectRatio::Ratio4x3 => "4:3",
            AspectRatio::Ratio3x2 => "3:2",
            AspectRatio::Ratio5x3 => "5:3",
            AspectRatio::Ratio5x4 => "5:4",
            AspectRatio::Ratio16x10 => "16:10",
            AspectRatio::Ratio17x9 => "17:9",
            AspectRatio::Ratio18x9 => "18:9",
            AspectRatio::Ratio21x9 => "21:9",
            AspectRatio::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A display mode: geometry, color depth and refresh rate.
///
/// Equality and hashing ignore the origin; two modes at different desktop
/// positions with the same size, depth and rate are the same mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ResolutionSpec")]
pub struct Resolution {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    /// Hz. Zero means the platform did not report a rate.
    refresh_rate: f32,
    aspect_ratio: AspectRatio,
}

impl Resolution {
    /// Builds a mode, validating every field.
    ///
    /// Fails with `InvalidArgument` when `width`, `height` or `bits_per_pixel`
    /// is not strictly positive, or when `refresh_rate` is negative or not finite.
    pub fn new(
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        bits_per_pixel: i32,
        refresh_rate: f32,
    ) -> Result<Self, DisplayError> {
        if width <= 0 {
            return Err(DisplayError::invalid("width", "must be greater than zero"));
        }
        if height <= 0 {
            return Err(DisplayError::invalid("height", "must be greater than zero"));
        }
        if bits_per_pixel <= 0 {
            return Err(DisplayError::invalid(
                "bits_per_pixel",
                "must be greater than zero",
            ));
        }
        if !refresh_rate.is_finite() || refresh_rate < 0.0 {
            return Err(DisplayError::invalid(
                "refresh_rate",
                "must be a finite value greater than, or equal to zero",
            ));
        }

        let (width, height) = (width as u32, height as u32);
        Ok(Self {
            x,
            y,
            width,
            height,
            bits_per_pixel: bits_per_pixel as u32,
            // Folds -0.0 into 0.0 so equal rates always hash alike.
            refresh_rate: refresh_rate + 0.0,
            aspect_ratio: AspectRatio::classify(width, height),
        })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }

    pub fn refresh_rate(&self) -> f32 {
        self.refresh_rate
    }

    /// Computed once at construction; not updated by `set_size`.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// The desktop rectangle this mode was reported at.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width as i32, self.height as i32)
    }

    /// Resizes the mode in place. Only the owning device calls this, to keep
    /// its current mode in step with its bounds.
    pub(crate) fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl PartialEq for Resolution {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.bits_per_pixel == other.bits_per_pixel
            && self.refresh_rate == other.refresh_rate
    }
}

// Sound because the constructor rejects NaN.
impl Eq for Resolution {}

impl Hash for Resolution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
        self.bits_per_pixel.hash(state);
        self.refresh_rate.to_bits().hash(state);
    }
}

impl Ord for Resolution {
    /// Descending: height, width, refresh rate, bits per pixel.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .height
            .cmp(&self.height)
            .then_with(|| other.width.cmp(&self.width))
            .then_with(|| other.refresh_rate.total_cmp(&self.refresh_rate))
            .then_with(|| other.bits_per_pixel.cmp(&self.bits_per_pixel))
    }
}

impl PartialOrd for Resolution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}@{}Hz",
            self.width, self.height, self.bits_per_pixel, self.refresh_rate
        )
    }
}

/// Unvalidated wire form; deserialization goes through `Resolution::new`.
#[derive(Debug, Deserialize)]
struct ResolutionSpec {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    width: i32,
    height: i32,
    #[serde(default = "default_bits_per_pixel")]
    bits_per_pixel: i32,
    #[serde(default)]
    refresh_rate: f32,
}

fn default_bits_per_pixel() -> i32 {
    32
}

impl TryFrom<ResolutionSpec> for Resolution {
    type Error = DisplayError;

    fn try_from(spec: ResolutionSpec) -> Result<Self, Self::Error> {
        Resolution::new(
            spec.x,
            spec.y,
            spec.width,
            spec.height,
            spec.bits_per_pixel,
            spec.refresh_rate,
        )
    }
}
