//! Coordinate rescaling between device space and API space.
//!
//! The agent never sees the container's real resolution. Coordinates it
//! sends ("API space") are expressed in one of a few standard target
//! resolutions and scaled up to the device; coordinates read back from the
//! device are scaled down before they reach the agent.

use crate::error::ComputerError;
use crate::session::DisplayGeometry;

/// A standard display size used to cap the agent-facing coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetResolution {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl TargetResolution {
    fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Candidate targets, scanned in order. Sizes above XGA/WXGA are not
/// recommended for agent consumption.
pub const SCALING_TARGETS: &[TargetResolution] = &[
    TargetResolution { name: "XGA", width: 1024, height: 768 },    // 4:3
    TargetResolution { name: "WXGA", width: 1280, height: 800 },   // 16:10
    TargetResolution { name: "FWXGA", width: 1366, height: 768 },  // ~16:9
];

/// Not all real displays hit a standard ratio exactly (16:9 panels vary).
const ASPECT_RATIO_TOLERANCE: f64 = 0.02;

/// Which space the input coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingSource {
    /// Agent-specified coordinates in target-resolution space.
    Api,
    /// Raw coordinates reported by the sandbox display.
    Device,
}

/// Pick the scaling target for a device geometry.
///
/// The scan stops at the first aspect-ratio match whether or not that
/// entry's width guard holds; a matched entry wider than the device means no
/// scaling at all, not a fallback to a later entry. Existing integrations
/// depend on that early stop.
pub fn select_target(geometry: &DisplayGeometry) -> Option<&'static TargetResolution> {
    let ratio = f64::from(geometry.width) / f64::from(geometry.height);
    for target in SCALING_TARGETS {
        if (target.aspect_ratio() - ratio).abs() < ASPECT_RATIO_TOLERANCE {
            if target.width < geometry.width {
                return Some(target);
            }
            return None;
        }
    }
    None
}

/// Rescale a coordinate pair between API space and device space.
///
/// Identity when no usable target exists for the geometry. `Api` input is
/// bounds-checked against the device size before scaling up; `Device` input
/// is scaled down unchecked. Rounding is `f64::round` (nearest, ties away
/// from zero).
pub fn scale_coordinates(
    geometry: &DisplayGeometry,
    source: ScalingSource,
    x: u32,
    y: u32,
) -> Result<(u32, u32), ComputerError> {
    let Some(target) = select_target(geometry) else {
        return Ok((x, y));
    };

    // Both factors are below 1: the target is strictly smaller than the device.
    let x_factor = f64::from(target.width) / f64::from(geometry.width);
    let y_factor = f64::from(target.height) / f64::from(geometry.height);

    match source {
        ScalingSource::Api => {
            if x > geometry.width || y > geometry.height {
                return Err(ComputerError::OutOfBounds { x, y });
            }
            Ok((
                (f64::from(x) / x_factor).round() as u32,
                (f64::from(y) / y_factor).round() as u32,
            ))
        }
        ScalingSource::Device => Ok((
            (f64::from(x) * x_factor).round() as u32,
            (f64::from(y) * y_factor).round() as u32,
        )),
    }
}
