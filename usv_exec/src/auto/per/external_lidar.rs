//! Range sensor fed by an external lidar driver, and a replay of recorded scans to drive it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use log::{debug, warn};
use nalgebra::Vector3;

use comms_if::eqpt::lidar::{LidarReturn, LidarScan, ScanParseError};

use super::RangeSensor;
use crate::auto::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds the latest scan pushed by a driver. Scanning is done by the driver, so `scan` and
/// `complete_scan` do nothing.
#[derive(Debug, Clone)]
pub struct ExternalLidar {
    num_samples: usize,
    max_range_m: f64,
    distances: Vec<f64>,
    points: Vec<Vector3<f64>>,
    velocities: Vec<Vector3<f64>>,
}

/// Recorded scans, one JSON packet per line, handed to an [`ExternalLidar`] one at a time.
#[derive(Debug, Clone)]
pub struct ScanReplay {
    scans: VecDeque<LidarScan>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ExternalLidar {
    /// Create a new sensor with every sample at `max_range_m` and no velocity.
    pub fn new(num_samples: usize, max_range_m: f64) -> Self {
        Self {
            num_samples,
            max_range_m,
            distances: vec![max_range_m; num_samples],
            points: vec![Vector3::zeros(); num_samples],
            velocities: vec![Vector3::zeros(); num_samples],
        }
    }

    /// Replace the held samples with a new scan.
    ///
    /// Returns with a bearing index outside the sensor's range are dropped, bearings missing
    /// from the scan keep their previous sample.
    pub fn push_scan(&mut self, scan: &LidarScan) {
        for r in scan.returns.iter() {
            self.push_return(r);
        }
    }

    /// Forget every sample, as if every ray had missed.
    pub fn clear(&mut self) {
        let max_range_m = self.max_range_m;
        self.distances.iter_mut().for_each(|d| *d = max_range_m);
        self.points.iter_mut().for_each(|p| *p = Vector3::zeros());
        self.velocities.iter_mut().for_each(|v| *v = Vector3::zeros());
    }

    pub fn push_return(&mut self, ret: &LidarReturn) {
        if ret.bearing_idx >= self.num_samples {
            warn!(
                "Dropping lidar return with bearing index {} (sensor has {} samples)",
                ret.bearing_idx, self.num_samples
            );
            return;
        }

        self.distances[ret.bearing_idx] = ret.distance_m;
        self.points[ret.bearing_idx] = ret.point_m;
        self.velocities[ret.bearing_idx] = ret.velocity_ms;
    }
}

impl ScanReplay {
    /// Parse a recording. Blank lines are skipped, every other line must be a complete scan of
    /// `num_samples` returns.
    pub fn from_json_lines(text: &str, num_samples: usize) -> Result<Self, ScanParseError> {
        let scans = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| {
                LidarScan::from_json(l, num_samples).map_err(|e| ScanParseError::AtLine {
                    line: i + 1,
                    source: Box::new(e),
                })
            })
            .collect::<Result<VecDeque<_>, _>>()?;

        debug!("Loaded {} recorded scans", scans.len());

        Ok(Self { scans })
    }

    /// Number of scans not yet fed.
    pub fn remaining(&self) -> usize {
        self.scans.len()
    }

    /// Push the next recorded scan into the sensor. Returns false once the recording has run
    /// out, leaving the sensor untouched.
    pub fn feed(&mut self, lidar: &mut ExternalLidar) -> bool {
        match self.scans.pop_front() {
            Some(scan) => {
                lidar.push_scan(&scan);
                true
            }
            None => false,
        }
    }
}

impl RangeSensor for ExternalLidar {
    fn num_samples(&self) -> usize {
        self.num_samples
    }

    fn scan(&mut self, _pose: &Pose, _dt_s: f64) {}

    fn complete_scan(&mut self, _pose: &Pose, _dt_s: f64) {}

    fn distances(&self) -> &[f64] {
        &self.distances
    }

    fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    fn velocities(&self) -> &[Vector3<f64>] {
        &self.velocities
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_scan() {
        let mut lidar = ExternalLidar::new(4, 20.0);

        let scan = LidarScan {
            returns: vec![
                LidarReturn {
                    bearing_idx: 2,
                    distance_m: 4.0,
                    point_m: Vector3::new(1.0, 2.0, 0.0),
                    velocity_ms: Vector3::new(0.0, 1.0, 0.0),
                },
                LidarReturn {
                    bearing_idx: 9,
                    distance_m: 1.0,
                    point_m: Vector3::zeros(),
                    velocity_ms: Vector3::zeros(),
                },
            ],
        };
        lidar.push_scan(&scan);

        assert_eq!(lidar.distances(), &[20.0, 20.0, 4.0, 20.0]);

        let returns = lidar.returns();
        assert_eq!(returns.len(), 4);
        assert_eq!(returns[2], scan.returns[0]);
        assert_eq!(returns[3].bearing_idx, 3);
    }

    fn packet(distances: &[f64]) -> String {
        let scan = LidarScan {
            returns: distances
                .iter()
                .enumerate()
                .map(|(i, d)| LidarReturn {
                    bearing_idx: i,
                    distance_m: *d,
                    point_m: Vector3::new(*d, i as f64, 0.0),
                    velocity_ms: Vector3::zeros(),
                })
                .collect(),
        };
        serde_json::to_string(&scan).unwrap()
    }

    #[test]
    fn test_replay() {
        let recording = format!(
            "{}\n\n{}\n",
            packet(&[20.0, 2.5, 20.0]),
            packet(&[20.0, 20.0, 1.5])
        );
        let mut replay = ScanReplay::from_json_lines(&recording, 3).unwrap();
        assert_eq!(replay.remaining(), 2);

        let mut lidar = ExternalLidar::new(3, 20.0);
        assert!(replay.feed(&mut lidar));
        assert_eq!(lidar.distances(), &[20.0, 2.5, 20.0]);
        assert!(replay.feed(&mut lidar));
        assert_eq!(lidar.distances(), &[20.0, 20.0, 1.5]);

        // Out of scans, the last one is left in place
        assert!(!replay.feed(&mut lidar));
        assert_eq!(replay.remaining(), 0);
        assert_eq!(lidar.distances(), &[20.0, 20.0, 1.5]);

        lidar.clear();
        assert_eq!(lidar.distances(), &[20.0, 20.0, 20.0]);
        assert!(lidar.returns().iter().all(|r| r.point_m == Vector3::zeros()));
    }

    #[test]
    fn test_replay_bad_line() {
        let recording = format!("{}\n{}\n", packet(&[20.0, 20.0]), packet(&[20.0]));

        match ScanReplay::from_json_lines(&recording, 2) {
            Err(ScanParseError::AtLine { line: 2, source }) => {
                assert!(matches!(
                    *source,
                    ScanParseError::WrongLength {
                        expected: 2,
                        found: 1
                    }
                ))
            }
            r => panic!("Expected a bad second line, got {:?}", r),
        }
    }
}
