//! Estimator solution records

use hifitime::TimeScale;
use nalgebra::Vector3;

use gnss::prelude::Constellation;

use crate::prelude::Epoch;

/// Solution quality
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// No solution for this epoch
    #[default]
    None,
    /// Single point (code only) quality
    Single,
    /// Float carrier phase solution
    Float,
    /// Ambiguity fixed solution
    Fixed,
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(fmt, "none"),
            Self::Single => write!(fmt, "single"),
            Self::Float => write!(fmt, "float"),
            Self::Fixed => write!(fmt, "fixed"),
        }
    }
}

impl SolutionStatus {
    /// Numeric code used by the status stream
    pub(crate) fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Single => 5,
            Self::Float => 2,
            Self::Fixed => 1,
        }
    }
}

/// Estimator output for one epoch.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Sampling [Epoch]
    pub t: Epoch,
    /// [SolutionStatus]
    pub status: SolutionStatus,
    /// Receiver ECEF position [m]
    pub position: Vector3<f64>,
    /// Receiver ECEF velocity [m/s], zero unless dynamics are estimated
    pub velocity: Vector3<f64>,
    /// Position covariance (xx, yy, zz, xy, yz, zx) [m²]
    pub covariance: [f64; 6],
    /// Receiver clock bias [s] per constellation
    pub clocks_s: Vec<(Constellation, f64)>,
    /// Number of contributing satellites
    pub nsat: usize,
}

impl Solution {
    /// GPS week and time of week [s]
    pub(crate) fn week_tow(&self) -> (u32, f64) {
        let (week, tow_ns) = self.t.to_time_scale(TimeScale::GPST).to_time_of_week();
        (week, tow_ns as f64 * 1E-9)
    }
}

/// Per satellite diagnostics snapshot.
#[derive(Debug, Clone, Default)]
pub struct SatDiagnostics {
    /// Azimuth [rad]
    pub azimuth_rad: f64,
    /// Elevation [rad]
    pub elevation_rad: f64,
    /// Post-fit phase residual per frequency [m]
    pub phase_residuals: [f64; 3],
    /// Post-fit code residual per frequency [m]
    pub code_residuals: [f64; 3],
    /// Slip bits per frequency (bit 0 slip, bits 1..3 LLI/GF/MW provenance)
    pub slip: [u8; 3],
    /// Lock counters per frequency
    pub lock: [u32; 3],
    /// Outage counters per frequency
    pub outage: [u32; 3],
    /// Melbourne-Wübbena running mean [m] and arc length
    pub mw_mean: f64,
    pub mw_arc: u32,
    /// Phase bias estimate and std [m] per frequency, when active
    pub ambiguity: [Option<(f64, f64)>; 3],
}
