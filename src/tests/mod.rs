//! Synthetic end to end scenarios
//!
//! A deterministic constellation is generated around a known receiver
//! position: observations are computed from the same geometric model
//! the estimator uses, so a noise free run must reproduce the truth.

mod ppp;

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::{
    position::{enu_rotation, geometric_distance},
    prelude::*,
};

pub(crate) const SAMPLING_S: f64 = 30.0;

pub(crate) struct Scenario {
    /// Ground truth receiver position
    pub truth: AprioriPosition,
    /// Single point seed proposed each epoch
    pub seed: AprioriPosition,
    /// Receiver clock offset [s]
    pub dtr_s: f64,
    /// Constellation: (SV, azimuth [°], elevation [°])
    pub sats: Vec<(SV, f64, f64)>,
    /// Phase ambiguities [cycles], per (SV, frequency slot)
    pub ambiguities: HashMap<(SV, usize), f64>,
    /// Sun ECEF position [m]
    pub sun_m: Vector3<f64>,
    /// Phase offsets [m] injected on (SV, frequency slot)
    pub phase_offset_m: HashMap<(SV, usize), f64>,
    /// LLI flags raised on (SV, frequency slot)
    pub lli: Vec<(SV, usize)>,
}

impl Scenario {
    /// Six GPS vehicles, dual frequency, well spread in the sky.
    pub fn gps_six() -> Self {
        let truth = AprioriPosition::from_geo(Vector3::new(
            45.0_f64.to_radians(),
            8.0_f64.to_radians(),
            250.0,
        ));
        let geometry = [
            (1, 0.0, 60.0),
            (3, 60.0, 40.0),
            (5, 120.0, 50.0),
            (8, 180.0, 35.0),
            (17, 240.0, 45.0),
            (23, 300.0, 70.0),
        ];
        let mut ambiguities = HashMap::new();
        let mut sats = vec![];
        for (prn, az, el) in geometry {
            let sv = SV::new(Constellation::GPS, prn);
            ambiguities.insert((sv, 0), 1_000.0 + prn as f64);
            ambiguities.insert((sv, 1), 2_000.0 + prn as f64);
            sats.push((sv, az, el));
        }
        Self {
            seed: truth.clone(),
            truth,
            dtr_s: 1E-8,
            sats,
            ambiguities,
            sun_m: Vector3::new(1.496E11, 0.0, 0.0),
            phase_offset_m: HashMap::new(),
            lli: vec![],
        }
    }

    /// Session configuration matching the synthetic model: iono-free
    /// dual frequency, no atmosphere, no antenna products.
    pub fn config(&self) -> Config {
        let mut cfg = Config::preset(Profile::Static);
        cfg.constellations = vec![Constellation::GPS];
        cfg.frequencies = 2;
        cfg.iono = IonoModel::IonoFree;
        cfg.tropo = TropoModel::Off;
        cfg
    }

    /// Satellite ECEF position [m] seen at (azimuth, elevation) [°]
    /// from the truth position.
    pub fn sat_position(&self, az_deg: f64, el_deg: f64) -> Vector3<f64> {
        let geo = self.truth.geodetic();
        let enu = enu_rotation(geo[0], geo[1]);
        let (az, el) = (az_deg.to_radians(), el_deg.to_radians());
        let los_enu = Vector3::new(az.sin() * el.cos(), az.cos() * el.cos(), el.sin());
        let los_ecef = enu.transpose() * los_enu;
        self.truth.ecef() + los_ecef * 23.5E6
    }

    /// One epoch of noise free observations.
    pub fn candidates(&self, t: Epoch) -> Vec<Candidate> {
        let c = Constants::SPEED_OF_LIGHT_M_S;
        self.sats
            .iter()
            .map(|(sv, az, el)| {
                let position = self.sat_position(*az, *el);
                let (range, _) = geometric_distance(&position, &self.truth.ecef());
                let mut observations = vec![];
                for (freq, carrier) in [(0, Carrier::L1), (1, Carrier::L2)] {
                    let lambda = carrier.wavelength();
                    let ambiguity = self.ambiguities.get(&(*sv, freq)).copied().unwrap_or(0.0);
                    let offset = self
                        .phase_offset_m
                        .get(&(*sv, freq))
                        .copied()
                        .unwrap_or(0.0);
                    let phase_cycles =
                        (range + c * self.dtr_s + offset) / lambda + ambiguity;
                    let pseudo_range = range + c * self.dtr_s;
                    let mut obs =
                        Observation::dual(carrier, phase_cycles, pseudo_range, Some(45.0));
                    if self.lli.contains(&(*sv, freq)) {
                        obs.lli = 0x01;
                    }
                    observations.push(obs);
                }
                let mut cd = Candidate::new(*sv, t, observations);
                cd.set_state(SvState {
                    position_m: position,
                    velocity_m_s: Vector3::new(0.0, 3_000.0, 0.0),
                    clock_bias_s: 0.0,
                    clock_drift_s_s: 0.0,
                    variance_m2: 0.0,
                });
                cd
            })
            .collect()
    }

    pub fn context(&self) -> EpochContext {
        EpochContext {
            apriori: self.seed.clone(),
            clocks_s: vec![(Constellation::GPS, self.dtr_s)],
            sun_position_m: self.sun_m,
        }
    }
}

/// Truth position error [m] of a solution.
pub(crate) fn position_error(scenario: &Scenario, solution: &Solution) -> f64 {
    (solution.position - scenario.truth.ecef()).norm()
}
