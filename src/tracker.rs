//! Per satellite tracking records

use gnss::prelude::{Constellation, SV};

use crate::constants::{MAX_FREQ, MAX_SAT};

/// Slip provenance bits
pub(crate) const SLIP: u8 = 0x01;
pub(crate) const SLIP_LLI: u8 = 0x02;
pub(crate) const SLIP_GF: u8 = 0x04;
pub(crate) const SLIP_MW: u8 = 0x08;

/// Arena slot of this vehicle, `None` for out of range PRNs.
/// The arena is fixed at session start: no hashing on the hot path.
pub(crate) fn sat_slot(sv: SV) -> Option<usize> {
    let prn = sv.prn as usize;
    let (base, first, count) = match sv.constellation {
        Constellation::GPS => (0, 1, 32),
        Constellation::Glonass => (32, 1, 26),
        Constellation::Galileo => (58, 1, 36),
        Constellation::BeiDou => (94, 1, 46),
        Constellation::QZSS => (140, 1, 10),
        Constellation::SBAS => (150, 120, 39),
        _ => return None,
    };
    if prn < first || prn >= first + count {
        return None;
    }
    Some(base + prn - first)
}

/// Inverse arena mapping, for diagnostics and status reporting.
pub(crate) fn slot_sv(slot: usize) -> Option<SV> {
    let (constellation, base, first) = match slot {
        0..=31 => (Constellation::GPS, 0, 1),
        32..=57 => (Constellation::Glonass, 32, 1),
        58..=93 => (Constellation::Galileo, 58, 1),
        94..=139 => (Constellation::BeiDou, 94, 1),
        140..=149 => (Constellation::QZSS, 140, 1),
        150..=188 => (Constellation::SBAS, 150, 120),
        _ => return None,
    };
    Some(SV::new(constellation, (slot - base + first) as u8))
}

/// Tracking state of one satellite slot, carried across epochs.
#[derive(Debug, Clone)]
pub(crate) struct SatTracker {
    /// Azimuth [rad] at last epoch
    pub azimuth_rad: f64,
    /// Elevation [rad] at last epoch
    pub elevation_rad: f64,
    /// Valid (accepted) this epoch, per frequency
    pub vsat: [bool; MAX_FREQ],
    /// Previous geometry free combination [m], 0 when unset
    pub gf: f64,
    /// Melbourne-Wübbena running mean [m]
    pub mw_mean: f64,
    /// Melbourne-Wübbena running second moment [m²]
    pub mw_m2: f64,
    /// Melbourne-Wübbena arc length [epochs]
    pub mw_arc: u32,
    /// Slip bits per frequency, [SLIP] plus provenance
    pub slip: [u8; MAX_FREQ],
    /// Carrier phase windup [cycles], unwrapped
    pub windup_cycles: f64,
    /// Tracking outage counters per frequency
    pub outage: [u32; MAX_FREQ],
    /// Continuous lock counters per frequency
    pub lock: [u32; MAX_FREQ],
    /// Cumulative slip counters per frequency
    pub slip_count: [u32; MAX_FREQ],
    /// Rejected code / phase measurement counters
    pub reject_code: u32,
    pub reject_phase: u32,
    /// Pre-fit phase residual per frequency [m]
    pub prefit_phase: [f64; MAX_FREQ],
    /// Post-fit phase residual per frequency [m]
    pub postfit_phase: [f64; MAX_FREQ],
    /// Pre-fit / post-fit code residuals per frequency [m]
    pub prefit_code: [f64; MAX_FREQ],
    pub postfit_code: [f64; MAX_FREQ],
    /// Upper triangular ambiguity pairing bits (fix-and-hold bookkeeping)
    pub pair: Vec<u8>,
}

impl Default for SatTracker {
    fn default() -> Self {
        Self {
            azimuth_rad: 0.0,
            elevation_rad: 0.0,
            vsat: [false; MAX_FREQ],
            gf: 0.0,
            mw_mean: 0.0,
            mw_m2: 0.0,
            mw_arc: 0,
            slip: [0; MAX_FREQ],
            windup_cycles: 0.0,
            outage: [0; MAX_FREQ],
            lock: [0; MAX_FREQ],
            slip_count: [0; MAX_FREQ],
            reject_code: 0,
            reject_phase: 0,
            prefit_phase: [0.0; MAX_FREQ],
            postfit_phase: [0.0; MAX_FREQ],
            prefit_code: [0.0; MAX_FREQ],
            postfit_code: [0.0; MAX_FREQ],
            pair: vec![0; MAX_SAT],
        }
    }
}

impl SatTracker {
    pub fn slipped(&self, freq: usize) -> bool {
        self.slip[freq] & SLIP != 0
    }

    pub fn slip_lli(&self, freq: usize) -> bool {
        self.slip[freq] & SLIP_LLI != 0
    }

    pub fn slip_gf(&self, freq: usize) -> bool {
        self.slip[freq] & SLIP_GF != 0
    }

    pub fn slip_mw(&self, freq: usize) -> bool {
        self.slip[freq] & SLIP_MW != 0
    }

    /// Restart the Melbourne-Wübbena statistics on a fresh arc.
    pub fn reset_mw(&mut self, mw: f64, half_wide_lane: f64) {
        self.mw_mean = mw;
        self.mw_m2 = half_wide_lane;
        self.mw_arc = 1;
    }
}
