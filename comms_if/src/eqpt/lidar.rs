//! # Lidar Equipment Communications Module
//!
//! A lidar scan is a fixed-length array of returns, one per bearing. Bearing `i` of an `N`
//! sample scan points `i / N * 360 - 180` degrees from the vessel's heading, measured
//! counter-clockwise.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single observation from the range sensor.
///
/// Returns only live for one control tick, nothing downstream keeps them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarReturn {
    /// Index of the bearing this return was measured along
    pub bearing_idx: usize,

    /// Distance from the sensor to the return, equal to the sensor's max range on a miss
    pub distance_m: f64,

    /// World position of the return (the ray end point on a miss)
    pub point_m: Vector3<f64>,

    /// Estimated world velocity of the surface that produced the return, zero if the surface
    /// was seen for the first time or the ray missed
    pub velocity_ms: Vector3<f64>,
}

/// A complete scan as delivered by an external lidar driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LidarScan {
    /// Returns ordered by bearing index
    pub returns: Vec<LidarReturn>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur when parsing a scan packet.
#[derive(Debug, Error)]
pub enum ScanParseError {
    #[error("Scan contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Expected a scan of {expected} returns but found {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("Return at position {position} has bearing index {found}")]
    BearingMismatch { position: usize, found: usize },

    #[error("Scan on line {line}: {source}")]
    AtLine {
        line: usize,
        source: Box<ScanParseError>,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LidarScan {
    /// Parse a scan from a JSON packet, checking that it holds exactly `num_samples` returns in
    /// bearing order.
    pub fn from_json(json_str: &str, num_samples: usize) -> Result<Self, ScanParseError> {
        let scan: LidarScan = serde_json::from_str(json_str).map_err(ScanParseError::InvalidJson)?;

        if scan.returns.len() != num_samples {
            return Err(ScanParseError::WrongLength {
                expected: num_samples,
                found: scan.returns.len(),
            });
        }

        for (position, ret) in scan.returns.iter().enumerate() {
            if ret.bearing_idx != position {
                return Err(ScanParseError::BearingMismatch {
                    position,
                    found: ret.bearing_idx,
                });
            }
        }

        Ok(scan)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
