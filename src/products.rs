//! Precise products and correction tables, owned by the caller
//! and borrowed for each epoch.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::prelude::{Carrier, SV};

/// Phase center variations over a regular zenith (receiver) or nadir
/// (satellite) angle grid, one row per frequency slot.
#[derive(Debug, Default, Clone)]
pub struct PcvTable {
    /// First grid angle [°]
    pub zen1_deg: f64,
    /// Last grid angle [°]
    pub zen2_deg: f64,
    /// Grid step [°]
    pub dzen_deg: f64,
    /// Variation values [m], per frequency slot
    pub values_m: Vec<Vec<f64>>,
}

impl PcvTable {
    /// Linearly interpolated variation [m] at this angle, clamped to
    /// the grid boundaries. Zero when the table is empty.
    pub(crate) fn variation(&self, freq: usize, angle_deg: f64) -> f64 {
        let Some(row) = self.values_m.get(freq) else {
            return 0.0;
        };
        if row.is_empty() || self.dzen_deg <= 0.0 {
            return 0.0;
        }
        let pos = (angle_deg - self.zen1_deg) / self.dzen_deg;
        if pos <= 0.0 {
            return row[0];
        }
        let last = row.len() - 1;
        if pos >= last as f64 {
            return row[last];
        }
        let i = pos.floor() as usize;
        let frac = pos - i as f64;
        row[i] * (1.0 - frac) + row[i + 1] * frac
    }
}

/// Antenna model: per frequency phase center offsets and variations.
/// Receiver offsets are expressed in the local ENU frame, satellite
/// offsets in the yaw-steered body frame.
#[derive(Debug, Default, Clone)]
pub struct Antenna {
    /// Phase center offset [m], per frequency slot
    pub pco_m: Vec<Vector3<f64>>,
    /// Phase center variations
    pub pcv: PcvTable,
}

impl Antenna {
    pub(crate) fn pco(&self, freq: usize) -> Vector3<f64> {
        self.pco_m.get(freq).copied().unwrap_or_default()
    }
}

/// Differential code biases of one satellite [m].
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeBiases {
    /// P1 - C1 bias [m]
    pub p1_c1_m: f64,
    /// P2 - C2 bias [m]
    pub p2_c2_m: f64,
    /// P1 - P2 bias [m]
    pub p1_p2_m: f64,
}

/// Precise products for the session: antenna models, code biases,
/// wavelength overrides and external atmospheric delays.
#[derive(Debug, Default, Clone)]
pub struct NavTables {
    /// Receiver [Antenna] model
    pub receiver_antenna: Antenna,
    /// Satellite [Antenna] models
    pub sv_antennas: HashMap<SV, Antenna>,
    /// Satellite [CodeBiases]
    pub code_biases: HashMap<SV, CodeBiases>,
    /// SSR code biases [m], per (SV, frequency slot). When present they
    /// take precedence over [CodeBiases].
    pub ssr_code_biases: HashMap<(SV, usize), f64>,
    /// True when SSR ephemerides and biases are in use
    pub ssr: bool,
    /// Wavelength overrides [m] per (SV, frequency slot): Glonass FDMA
    pub wavelengths: HashMap<(SV, usize), f64>,
    /// Klobuchar broadcast parameters (α0..α3, β0..β3)
    pub klobuchar: Option<[f64; 8]>,
    /// External slant ionospheric delays: L1 delay [m] and variance [m²]
    pub stec: HashMap<SV, (f64, f64)>,
    /// External zenith tropospheric delay [m] and variance [m²]
    pub ztd: Option<(f64, f64)>,
}

impl NavTables {
    /// Wavelength [m] of this (SV, frequency slot), honoring the
    /// per vehicle overrides (Glonass FDMA). Zero when the slot does
    /// not exist for this constellation.
    pub(crate) fn wavelength(&self, sv: SV, slot: usize) -> f64 {
        if let Some(lambda) = self.wavelengths.get(&(sv, slot)) {
            return *lambda;
        }
        match Carrier::from_slot(sv.constellation, slot) {
            Some(carrier) => carrier.wavelength(),
            None => 0.0,
        }
    }

    pub(crate) fn sv_antenna(&self, sv: SV) -> Option<&Antenna> {
        self.sv_antennas.get(&sv)
    }
}
