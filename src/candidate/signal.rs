//! Signal observations

use crate::prelude::Carrier;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tracking code class, selects the applicable P1-C1 / P2-C2 code bias.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CodeClass {
    /// Civil (C/A class) ranging code
    #[default]
    CoarseAcquisition,
    /// Precise (P class) ranging code
    Precise,
    /// Any other tracking code
    Other,
}

/// Observed signal on one carrier frequency
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// [Carrier] signal
    pub carrier: Carrier,
    /// Carrier phase [cycles]
    pub phase_cycles: Option<f64>,
    /// Pseudo range [m]
    pub pseudo_range_m: Option<f64>,
    /// Doppler shift [Hz]
    pub doppler: Option<f64>,
    /// SNR [dB-Hz]
    pub snr_dbhz: Option<f64>,
    /// Loss of lock indicator
    pub lli: u8,
    /// Tracking code class
    pub code: CodeClass,
}

impl Observation {
    /// Pseudo range only [Observation]
    pub fn pseudo_range(carrier: Carrier, pseudo_range_m: f64, snr_dbhz: Option<f64>) -> Self {
        Self {
            carrier,
            snr_dbhz,
            pseudo_range_m: Some(pseudo_range_m),
            ..Default::default()
        }
    }

    /// Complete phase + code [Observation]
    pub fn dual(
        carrier: Carrier,
        phase_cycles: f64,
        pseudo_range_m: f64,
        snr_dbhz: Option<f64>,
    ) -> Self {
        Self {
            carrier,
            snr_dbhz,
            phase_cycles: Some(phase_cycles),
            pseudo_range_m: Some(pseudo_range_m),
            ..Default::default()
        }
    }

    /// True when the low two LLI bits indicate a possible loss of lock.
    pub(crate) fn lli_slip(&self) -> bool {
        self.lli & 0x03 != 0
    }
}
