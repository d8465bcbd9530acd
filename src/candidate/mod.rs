//! Position solving candidate

use nalgebra::Vector3;

use crate::prelude::{Carrier, Epoch, SV};

mod signal;

pub(crate) mod combination;
pub(crate) mod correction;

pub use signal::{CodeClass, Observation};
pub(crate) use correction::Corrected;

/// Precise orbital and clock state of one satellite, already evaluated
/// at signal transmission time by the precise products consumer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvState {
    /// ECEF position at transmission time, Earth rotation corrected [m]
    pub position_m: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub velocity_m_s: Vector3<f64>,
    /// SV clock bias [s]
    pub clock_bias_s: f64,
    /// SV clock drift [s/s]
    pub clock_drift_s_s: f64,
    /// Orbit and clock variance [m²], typically URA derived
    pub variance_m2: f64,
}

/// Position solving candidate: one satellite proposed for the epoch.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// [SV]
    pub sv: SV,
    /// Sampling [Epoch]
    pub t: Epoch,
    /// Signal [Observation]s, one per sampled carrier
    pub observations: Vec<Observation>,
    /// Orbital state, resolved by the caller from precise products
    pub(crate) state: Option<SvState>,
    /// Unhealthy vehicles do not contribute
    pub(crate) healthy: bool,
    /// Vehicle type, e.g. "BLOCK IIA" or "BEIDOU-2I", drives the
    /// attitude and multipath models
    pub(crate) vehicle: Option<String>,
}

impl Candidate {
    /// Basic candidate definition, to propose to the estimator.
    /// ## Input
    /// - sv: [SV] Identity
    /// - t: sampling [Epoch]
    /// - observations: signal observations. Phase and code on two
    ///   carriers are required for the combination based estimation modes.
    pub fn new(sv: SV, t: Epoch, observations: Vec<Observation>) -> Self {
        Self {
            sv,
            t,
            observations,
            state: None,
            healthy: true,
            vehicle: None,
        }
    }

    /// Define the orbital state. This is mandatory: candidates without
    /// a resolved state do not contribute to the epoch.
    pub fn set_state(&mut self, state: SvState) {
        self.state = Some(state);
    }

    /// Declare this vehicle unhealthy for the epoch.
    pub fn set_unhealthy(&mut self) {
        self.healthy = false;
    }

    /// Define the vehicle type string, as found in the antenna products.
    /// Required for the Block IIA eclipse exclusion and the BDS-2
    /// multipath model.
    pub fn set_vehicle(&mut self, vehicle: &str) {
        self.vehicle = Some(vehicle.to_string());
    }

    /// Observation on this frequency slot, if sampled.
    pub(crate) fn observation(&self, slot: usize) -> Option<&Observation> {
        let carrier = Carrier::from_slot(self.sv.constellation, slot)?;
        self.observations
            .iter()
            .find(|obs| obs.carrier == carrier)
    }

    /// Raw phase [cycles] and code [m] on this slot, `None` unless both
    /// are sampled and the SNR mask passes.
    pub(crate) fn phase_code(&self, slot: usize, min_snr: Option<f64>) -> Option<(f64, f64)> {
        let obs = self.observation(slot)?;
        if let (Some(min), Some(snr)) = (min_snr, obs.snr_dbhz) {
            if snr < min {
                return None;
            }
        }
        Some((obs.phase_cycles?, obs.pseudo_range_m?))
    }

    /// True if this candidate may contribute: resolved state, healthy,
    /// not excluded by the user.
    pub(crate) fn is_usable(&self, excluded: &[SV]) -> bool {
        self.state.is_some() && self.healthy && !excluded.contains(&self.sv)
    }
}
