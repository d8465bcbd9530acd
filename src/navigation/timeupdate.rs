//! Filter time update
//!
//! Propagates the state and covariance by one epoch, in block order:
//! position dynamics, white noise receiver clocks, random walk
//! troposphere, per satellite ionosphere, receiver DCB, and the carrier
//! phase biases with their phase/code coherency screening.

use hifitime::TimeScale;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use gnss::prelude::Constellation;

use crate::{
    bias::zenith_delays,
    cfg::{ArMode, Config, IonoModel, Profile},
    constants::{Constants, MAX_SAT},
    navigation::{Navigation, Prepared},
    position::{enu_rotation, AprioriPosition},
    prelude::Epoch,
    products::NavTables,
};

impl Navigation {
    /// Runs the complete time update. `clocks` are the single point
    /// receiver clock offsets [s] per constellation, `pool` the prepared
    /// candidates whose slip flags were already refreshed.
    pub(crate) fn time_update(
        &mut self,
        t: Epoch,
        cfg: &Config,
        tables: &NavTables,
        apriori: &AprioriPosition,
        clocks: &[(Constellation, f64)],
        pool: &[Prepared],
    ) {
        let dt_s = match self.last_epoch {
            Some(last) => (t - last).to_seconds().abs(),
            None => 0.0,
        };

        for tracker in self.trackers.iter_mut() {
            tracker.vsat = [false; crate::constants::MAX_FREQ];
        }

        self.update_position(cfg, apriori, dt_s);
        self.update_clocks(clocks);
        self.update_tropo(cfg, apriori, dt_s);
        self.update_iono(cfg, tables, pool, dt_s);
        self.update_dcb();
        self.update_bias(t, cfg, tables, pool, dt_s);
    }

    fn update_position(&mut self, cfg: &Config, apriori: &AprioriPosition, dt_s: f64) {
        let ip = self.index.position();

        if cfg.profile == Profile::Fixed {
            if let Some((x, y, z)) = cfg.ground_truth {
                for (i, value) in [x, y, z].into_iter().enumerate() {
                    self.init_param(ip + i, value, 1E-8);
                }
                return;
            }
            warn!("fixed profile without ground truth: falling back to apriori");
        }

        let seed = apriori.ecef();
        let initialized = (0..3).all(|i| self.is_active(ip + i));

        if !initialized {
            for i in 0..3 {
                self.init_param(ip + i, seed[i], Constants::VAR_POS);
            }
            if let Some(iv) = self.index.velocity() {
                for i in 0..3 {
                    self.init_param(iv + i, 1E-6, Constants::VAR_VEL);
                }
            }
            if let Some(ia) = self.index.acceleration() {
                for i in 0..3 {
                    self.init_param(ia + i, 1E-6, Constants::VAR_ACC);
                }
            }
            return;
        }

        match (cfg.profile, cfg.dynamics) {
            (Profile::Static, _) => {
                let q = cfg.process_noise[5].powi(2) * dt_s;
                for i in 0..3 {
                    self.p[(ip + i, ip + i)] += q;
                }
            },
            (Profile::Kinematic, false) => {
                // epoch-wise reinitialization from the single point seed
                for i in 0..3 {
                    self.init_param(ip + i, seed[i], Constants::VAR_POS);
                }
            },
            (Profile::Kinematic, true) => {
                self.propagate_dynamics(cfg, apriori, dt_s);
            },
            (Profile::Fixed, _) => unreachable!("handled above"),
        }
    }

    /// Position/velocity/acceleration block transition, with the
    /// acceleration process noise rotated from local ENU into ECEF.
    fn propagate_dynamics(&mut self, cfg: &Config, apriori: &AprioriPosition, dt_s: f64) {
        let np = self.index.np();
        let ip = self.index.position();

        let mut f = DMatrix::<f64>::identity(np, np);
        for i in 0..6 {
            f[(i, i + 3)] = dt_s;
        }
        for i in 0..3 {
            f[(i, i + 6)] = dt_s.powi(2) / 2.0;
        }

        let x_block = DVector::from_fn(np, |i, _| self.x[ip + i]);
        let p_block = DMatrix::from_fn(np, np, |i, j| self.p[(ip + i, ip + j)]);

        let x_new = &f * x_block;
        let p_new = &f * p_block * f.transpose();

        for i in 0..np {
            self.x[ip + i] = x_new[i];
            for j in 0..np {
                let value = 0.5 * (p_new[(i, j)] + p_new[(j, i)]);
                self.p[(ip + i, ip + j)] = value;
                self.p[(ip + j, ip + i)] = value;
            }
        }

        // acceleration process noise, ENU diag rotated into ECEF
        let geodetic = apriori.geodetic();
        let e = enu_rotation(geodetic[0], geodetic[1]);
        let q_enu = Matrix3::from_diagonal(&Vector3::new(
            cfg.process_noise[3].powi(2) * dt_s,
            cfg.process_noise[3].powi(2) * dt_s,
            cfg.process_noise[4].powi(2) * dt_s,
        ));
        let q_ecef = e.transpose() * q_enu * e;

        if let Some(ia) = self.index.acceleration() {
            for i in 0..3 {
                for j in 0..3 {
                    self.p[(ia + i, ia + j)] += q_ecef[(i, j)];
                }
            }
        }
    }

    /// White noise receiver clocks: every epoch, every system clock is
    /// reseeded from the single point solution.
    fn update_clocks(&mut self, clocks: &[(Constellation, f64)]) {
        let systems = self.index.systems().to_vec();
        let primary = systems
            .first()
            .and_then(|sys| lookup_clock(clocks, *sys))
            .or_else(|| clocks.first().map(|(_, dt)| *dt))
            .unwrap_or(0.0);

        for sys in systems {
            let Some(ic) = self.index.clock(sys) else {
                continue;
            };
            let dtr = lookup_clock(clocks, sys).unwrap_or(primary);
            let mut bias_m = Constants::SPEED_OF_LIGHT_M_S * dtr;
            if bias_m == 0.0 {
                bias_m = 1E-6;
            }
            self.init_param(ic, bias_m, Constants::VAR_CLK);
        }
    }

    fn update_tropo(&mut self, cfg: &Config, apriori: &AprioriPosition, dt_s: f64) {
        let Some(it) = self.index.tropo() else {
            return;
        };

        if !self.is_active(it) {
            let (_, zwd) = zenith_delays(&apriori.geodetic(), Constants::REL_HUMI);
            self.init_param(it, zwd, Constants::VAR_ZTD);
            debug!("troposphere initialized: zwd={:.3}m", zwd);
        } else {
            self.p[(it, it)] += cfg.process_noise[2].powi(2) * dt_s;
        }

        if self.index.num_tropo() == 3 {
            for i in 1..3 {
                if !self.is_active(it + i) {
                    self.init_param(it + i, 1E-6, Constants::VAR_GRA);
                } else {
                    self.p[(it + i, it + i)] += (0.1 * cfg.process_noise[2]).powi(2) * dt_s;
                }
            }
        }
    }

    fn update_iono(&mut self, cfg: &Config, tables: &NavTables, pool: &[Prepared], dt_s: f64) {
        if cfg.iono != IonoModel::Estimate {
            return;
        }
        let gap = cfg.gap_resion();

        for slot in 0..MAX_SAT {
            let Some(ii) = self.index.iono(slot) else {
                continue;
            };
            if self.x[ii] != 0.0 && self.trackers[slot].outage[0] > gap {
                self.init_param(ii, 0.0, 0.0);
            }
        }

        for prepared in pool.iter() {
            let Some(ii) = self.index.iono(prepared.slot) else {
                continue;
            };
            let k = cfg.second_frequency.slot(prepared.cd.sv.constellation);

            if self.x[ii] == 0.0 {
                let (p1, pk) = (prepared.corrected.p[0], prepared.corrected.p[k.min(2)]);
                if p1 == 0.0 || pk == 0.0 {
                    continue;
                }
                let lambda_1 = tables.wavelength(prepared.cd.sv, 0);
                let lambda_k = tables.wavelength(prepared.cd.sv, k);
                if lambda_1 == 0.0 || lambda_k == 0.0 {
                    continue;
                }
                let gamma = (lambda_k / lambda_1).powi(2);
                let ion = (p1 - pk) / (1.0 - gamma);
                self.init_param(ii, ion, Constants::VAR_IONO);
                debug!("({}) iono initialized: {:.3}m", prepared.cd.sv, ion);
            } else {
                let elevation = self.trackers[prepared.slot]
                    .elevation_rad
                    .max(Constants::MIN_EL_IONO_RAD);
                self.p[(ii, ii)] += (cfg.process_noise[1] / elevation.sin()).powi(2) * dt_s;
            }
        }
    }

    fn update_dcb(&mut self) {
        let Some(id) = self.index.dcb() else {
            return;
        };
        if !self.is_active(id) {
            self.init_param(id, 1E-6, Constants::VAR_DCB);
        }
    }

    /// Carrier phase bias update: outage/instantaneous/day-boundary
    /// resets, random walk inflation, phase/code coherency screening,
    /// then per satellite reinitialization on slip or first sight.
    fn update_bias(&mut self, t: Epoch, cfg: &Config, tables: &NavTables, pool: &[Prepared], dt_s: f64) {
        let day_jump = day_boundary(t);
        if day_jump {
            info!("{} day boundary clock jump", t);
        }

        for freq in 0..self.index.amb_frequencies() {
            // outage bookkeeping and deactivation
            for slot in 0..MAX_SAT {
                let Some(ib) = self.index.bias(slot, freq) else {
                    continue;
                };
                self.trackers[slot].outage[freq] += 1;
                let expired = self.trackers[slot].outage[freq] > cfg.max_outage;
                if self.x[ib] != 0.0
                    && (expired || cfg.ar_mode == ArMode::Instantaneous || day_jump)
                {
                    self.init_param(ib, 0.0, 0.0);
                    self.clear_pairing(slot);
                } else if self.is_active(ib) {
                    self.p[(ib, ib)] += cfg.process_noise[0].powi(2) * dt_s;
                }
            }

            // phase/code coherency: a common offset on every bias is a
            // receiver clock event, absorbed into the bias block
            let mut biases = vec![0.0_f64; pool.len()];
            let mut offsets = Vec::<f64>::with_capacity(pool.len());
            for (i, prepared) in pool.iter().enumerate() {
                biases[i] = self.local_bias(cfg, tables, prepared, freq);
                if biases[i] == 0.0 {
                    continue;
                }
                if let Some(ib) = self.index.bias(prepared.slot, freq) {
                    if self.is_active(ib) {
                        offsets.push(biases[i] - self.x[ib]);
                    }
                }
            }

            if !offsets.is_empty() {
                let n = offsets.len() as f64;
                let mean = offsets.iter().sum::<f64>() / n;
                let sum_abs = offsets.iter().map(|o| o.abs()).sum::<f64>();
                let max_abs = offsets.iter().fold(0.0_f64, |m, o| m.max(o.abs()));
                let threshold = Constants::CLOCK_JUMP_THRESHOLD_S * Constants::SPEED_OF_LIGHT_M_S;
                // ignore when a single satellite dominates the spread
                if mean.abs() > threshold && max_abs <= 2.0 * sum_abs / n {
                    for slot in 0..MAX_SAT {
                        let Some(ib) = self.index.bias(slot, freq) else {
                            continue;
                        };
                        if self.is_active(ib) {
                            self.x[ib] += mean;
                        }
                    }
                    info!("{} phase-code jump corrected: {:.3}m", t, mean);
                }
            }

            // reinitialization on slip or first sight
            for (i, prepared) in pool.iter().enumerate() {
                let Some(ib) = self.index.bias(prepared.slot, freq) else {
                    continue;
                };
                let slipped = self.combination_slip(cfg, prepared, freq);
                if biases[i] != 0.0 && (self.x[ib] == 0.0 || slipped) {
                    self.init_param(ib, biases[i], Constants::VAR_BIAS);
                    self.clear_pairing(prepared.slot);
                    self.trackers[prepared.slot].lock[freq] = 0;
                    debug!(
                        "({}) bias reinitialized: {:.3}m (slip: {})",
                        prepared.cd.sv, biases[i], slipped
                    );
                }
            }
        }
    }

    /// Locally measured phase bias [m]: `Lc − Pc` for the combined mode,
    /// `L − P + 2·I·γ` uncombined.
    fn local_bias(&self, cfg: &Config, tables: &NavTables, prepared: &Prepared, freq: usize) -> f64 {
        if cfg.iono == IonoModel::IonoFree {
            if prepared.corrected.lc == 0.0 || prepared.corrected.pc == 0.0 {
                return 0.0;
            }
            prepared.corrected.lc - prepared.corrected.pc
        } else {
            let (l, p) = (prepared.corrected.l[freq], prepared.corrected.p[freq]);
            if l == 0.0 || p == 0.0 {
                return 0.0;
            }
            let ion = self
                .index
                .iono(prepared.slot)
                .map(|ii| self.x[ii])
                .unwrap_or(0.0);
            let lambda_1 = tables.wavelength(prepared.cd.sv, 0);
            let lambda_f = tables.wavelength(prepared.cd.sv, freq);
            if lambda_1 == 0.0 || lambda_f == 0.0 {
                return 0.0;
            }
            l - p + 2.0 * ion * (lambda_f / lambda_1).powi(2)
        }
    }

    fn combination_slip(&self, cfg: &Config, prepared: &Prepared, freq: usize) -> bool {
        let tracker = &self.trackers[prepared.slot];
        if cfg.iono == IonoModel::IonoFree {
            let k = cfg.second_frequency.slot(prepared.cd.sv.constellation);
            tracker.slipped(0) || tracker.slipped(k.min(crate::constants::MAX_FREQ - 1))
        } else {
            tracker.slipped(freq)
        }
    }

    fn clear_pairing(&mut self, slot: usize) {
        for bit in self.trackers[slot].pair.iter_mut() {
            *bit = 0;
        }
        for tracker in self.trackers.iter_mut() {
            tracker.pair[slot] = 0;
        }
    }
}

fn lookup_clock(clocks: &[(Constellation, f64)], sys: Constellation) -> Option<f64> {
    clocks
        .iter()
        .find(|(c, _)| *c == sys)
        .map(|(_, dt)| *dt)
        .filter(|dt| *dt != 0.0)
}

/// Day boundary rule on the GPS time of week.
pub(crate) fn day_boundary(t: Epoch) -> bool {
    let (_, tow_ns) = t.to_time_scale(TimeScale::GPST).to_time_of_week();
    let tow_tenths = (tow_ns as f64 * 1E-9 * 10.0).round() as i64;
    tow_tenths % 864000 == 0
}

#[cfg(test)]
mod test {
    use super::day_boundary;
    use crate::{
        candidate::Corrected,
        cfg::{Config, IonoModel, Profile, TropoModel},
        constants::Constants,
        navigation::{Navigation, Prepared},
        position::AprioriPosition,
        prelude::{Candidate, Epoch},
        tracker::{sat_slot, SLIP},
    };
    use gnss::prelude::{Constellation, SV};
    use hifitime::TimeScale;
    use nalgebra::Vector3;

    #[test]
    fn day_boundary_rule() {
        let week_start = Epoch::from_time_of_week(2290, 0, TimeScale::GPST);
        assert!(day_boundary(week_start));
        let midday = Epoch::from_time_of_week(2290, 43_200 * 1_000_000_000, TimeScale::GPST);
        assert!(!day_boundary(midday));
        let day_two = Epoch::from_time_of_week(2290, 86_400 * 1_000_000_000, TimeScale::GPST);
        assert!(day_boundary(day_two));
    }

    fn iflc_config() -> Config {
        let mut cfg = Config::preset(Profile::Static);
        cfg.constellations = vec![Constellation::GPS];
        cfg.iono = IonoModel::IonoFree;
        cfg.tropo = TropoModel::Off;
        cfg
    }

    fn prepared(prn: u8, lc: f64, pc: f64) -> Prepared {
        let sv = SV::new(Constellation::GPS, prn);
        Prepared {
            cd: Candidate::new(sv, Epoch::default(), vec![]),
            slot: sat_slot(sv).unwrap(),
            corrected: Corrected {
                lc,
                pc,
                ..Default::default()
            },
            excluded: false,
        }
    }

    fn epoch(tow_s: u64) -> Epoch {
        Epoch::from_time_of_week(2300, tow_s * 1_000_000_000, TimeScale::GPST)
    }

    #[test]
    fn slip_reinitializes_bias_variance() {
        let cfg = iflc_config();
        let mut nav = Navigation::new(&cfg);
        let tables = Default::default();
        let apriori = AprioriPosition::from_ecef(Vector3::new(4.5E6, 0.7E6, 4.4E6));
        let pool = vec![prepared(7, 21_000_123.4, 21_000_100.0)];
        let slot = pool[0].slot;
        let ib = nav.index.bias(slot, 0).unwrap();

        nav.time_update(epoch(3600), &cfg, &tables, &apriori, &[], &pool);
        assert_eq!(nav.p[(ib, ib)], Constants::VAR_BIAS);
        assert!((nav.x[ib] - 23.4).abs() < 1E-9);
        nav.last_epoch = Some(epoch(3600));

        // quiet epoch: random walk inflation only
        nav.time_update(epoch(3630), &cfg, &tables, &apriori, &[], &pool);
        assert!(nav.p[(ib, ib)] > Constants::VAR_BIAS);
        nav.last_epoch = Some(epoch(3630));

        // slip: variance back to the initialization value exactly
        nav.trackers[slot].slip[0] = SLIP;
        nav.time_update(epoch(3660), &cfg, &tables, &apriori, &[], &pool);
        assert_eq!(nav.p[(ib, ib)], Constants::VAR_BIAS);
    }

    #[test]
    fn common_phase_code_jump_absorbed() {
        let cfg = iflc_config();
        let mut nav = Navigation::new(&cfg);
        let tables = Default::default();
        let apriori = AprioriPosition::from_ecef(Vector3::new(4.5E6, 0.7E6, 4.4E6));

        let pool: Vec<Prepared> = [(1, 11.0), (2, 22.0), (3, 33.0), (4, 44.0)]
            .iter()
            .map(|(prn, bias)| prepared(*prn, 20_000_000.0 + bias, 20_000_000.0))
            .collect();
        nav.time_update(epoch(3600), &cfg, &tables, &apriori, &[], &pool);
        nav.last_epoch = Some(epoch(3600));

        let ib: Vec<usize> = pool
            .iter()
            .map(|p| nav.index.bias(p.slot, 0).unwrap())
            .collect();
        let before: Vec<f64> = ib.iter().map(|i| nav.x[*i]).collect();

        // the same millisecond event on every vehicle
        let jump = 0.001 * Constants::SPEED_OF_LIGHT_M_S;
        let jumped: Vec<Prepared> = [(1, 11.0), (2, 22.0), (3, 33.0), (4, 44.0)]
            .iter()
            .map(|(prn, bias)| prepared(*prn, 20_000_000.0 + bias + jump, 20_000_000.0))
            .collect();
        nav.time_update(epoch(3630), &cfg, &tables, &apriori, &[], &jumped);

        for (i, old) in ib.iter().zip(before.iter()) {
            assert!(
                (nav.x[*i] - old - jump).abs() < 1E-6,
                "offset not absorbed into the bias"
            );
        }
    }
}
