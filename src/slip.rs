//! Cycle slip detectors
//!
//! Three independent detectors run every epoch and OR their verdicts
//! into the per satellite slip bits: the receiver loss-of-lock
//! indicator, the Melbourne-Wübbena wide lane jump test backed by
//! recursive arc statistics, and the geometry free jump test.

use log::{debug, warn};

use crate::{
    candidate::combination::{geometry_free, melbourne_wubbena, wide_lane_wavelength},
    cfg::Config,
    constants::Constants,
    prelude::Candidate,
    products::NavTables,
    tracker::{sat_slot, SatTracker, SLIP, SLIP_GF, SLIP_LLI, SLIP_MW},
};

/// Runs the three detectors over the epoch pool. Slip bits from the
/// previous epoch are cleared for every observed satellite first.
pub(crate) fn detect(
    cfg: &Config,
    tables: &NavTables,
    pool: &[Candidate],
    trackers: &mut [SatTracker],
) {
    for cd in pool.iter() {
        let Some(slot) = sat_slot(cd.sv) else {
            continue;
        };
        for freq in 0..cfg.frequencies {
            trackers[slot].slip[freq] = 0;
        }
    }
    detect_lli(cfg, pool, trackers);
    detect_mw(cfg, tables, pool, trackers);
    detect_gf(cfg, tables, pool, trackers);
}

/// Loss of lock indicator: receiver reported, per frequency.
fn detect_lli(cfg: &Config, pool: &[Candidate], trackers: &mut [SatTracker]) {
    for cd in pool.iter() {
        let Some(slot) = sat_slot(cd.sv) else {
            continue;
        };
        for freq in 0..cfg.frequencies {
            let Some(obs) = cd.observation(freq) else {
                continue;
            };
            if obs.lli_slip() {
                warn!("{} ({}) LLI slip on frequency {}", cd.t, cd.sv, freq);
                trackers[slot].slip[freq] |= SLIP | SLIP_LLI;
            }
        }
    }
}

/// Melbourne-Wübbena jump test. The wide lane combination is free of
/// geometry and first order ionosphere: a jump beyond the arc statistics
/// is a slip on one of the combined frequencies.
fn detect_mw(cfg: &Config, tables: &NavTables, pool: &[Candidate], trackers: &mut [SatTracker]) {
    for cd in pool.iter() {
        let Some(slot) = sat_slot(cd.sv) else {
            continue;
        };
        let k = cfg.second_frequency.slot(cd.sv.constellation);
        let (lambda_1, lambda_k) = (tables.wavelength(cd.sv, 0), tables.wavelength(cd.sv, k));
        if lambda_1 == 0.0 || lambda_k == 0.0 {
            continue;
        }
        let (Some((l1, p1)), Some((lk, pk))) = (cd.phase_code(0, None), cd.phase_code(k, None))
        else {
            continue;
        };

        let mw = melbourne_wubbena(l1, lk, p1, pk, lambda_1, lambda_k);
        let half_wl = wide_lane_wavelength(lambda_1, lambda_k) / 2.0;
        let tracker = &mut trackers[slot];

        if tracker.mw_arc == 0 || tracker.slip.iter().any(|s| s & SLIP != 0) {
            tracker.reset_mw(mw, half_wl);
            continue;
        }

        if (mw - tracker.mw_mean).abs() > Constants::MW_GAP_MAX {
            warn!("{} ({}) MW gap {:.3}m", cd.t, cd.sv, mw - tracker.mw_mean);
            mark_slip(tracker, cfg.frequencies, SLIP_MW);
            tracker.reset_mw(mw, half_wl);
            continue;
        }

        if tracker.mw_arc >= 4 {
            let threshold = Constants::MW_GAP_MAX
                .min((4.0 * tracker.mw_m2.sqrt()).max(Constants::MW_CS_MIN));
            if (mw - tracker.mw_mean).abs() > threshold {
                warn!(
                    "{} ({}) MW slip {:.3}m (thres {:.3}m)",
                    cd.t,
                    cd.sv,
                    mw - tracker.mw_mean,
                    threshold
                );
                mark_slip(tracker, cfg.frequencies, SLIP_MW);
                tracker.reset_mw(mw, half_wl);
                continue;
            }
        }

        let n = (tracker.mw_arc + 1).min(Constants::MW_ARC_MAX);
        let previous_mean = tracker.mw_mean;
        tracker.mw_mean = ((n - 1) as f64 * tracker.mw_mean + mw) / n as f64;
        tracker.mw_m2 =
            ((n - 1) as f64 * tracker.mw_m2 + (mw - previous_mean).powi(2)) / n as f64;
        tracker.mw_arc = n;
    }
}

/// Geometry free jump test: combination wide, marks every frequency.
fn detect_gf(cfg: &Config, tables: &NavTables, pool: &[Candidate], trackers: &mut [SatTracker]) {
    for cd in pool.iter() {
        let Some(slot) = sat_slot(cd.sv) else {
            continue;
        };
        let k = cfg.second_frequency.slot(cd.sv.constellation);
        let (lambda_1, lambda_k) = (tables.wavelength(cd.sv, 0), tables.wavelength(cd.sv, k));
        if lambda_1 == 0.0 || lambda_k == 0.0 {
            continue;
        }
        let (Some((l1, _)), Some((lk, _))) = (cd.phase_code(0, None), cd.phase_code(k, None))
        else {
            continue;
        };

        let g = geometry_free(l1, lk, lambda_1, lambda_k);
        if g == 0.0 {
            continue;
        }
        let tracker = &mut trackers[slot];
        if tracker.gf != 0.0 && (g - tracker.gf).abs() > cfg.thres_slip {
            warn!("{} ({}) GF slip {:.3}m", cd.t, cd.sv, g - tracker.gf);
            mark_slip(tracker, cfg.frequencies, SLIP_GF);
        } else {
            debug!("{} ({}) gf {:.3}m", cd.t, cd.sv, g);
        }
        tracker.gf = g;
    }
}

fn mark_slip(tracker: &mut SatTracker, frequencies: usize, provenance: u8) {
    for freq in 0..frequencies {
        tracker.slip[freq] |= SLIP | provenance;
    }
}

#[cfg(test)]
mod test {
    use super::detect;
    use crate::{
        cfg::{Config, Profile},
        constants::Constants,
        prelude::{Candidate, Carrier, Epoch, Observation, SV},
        products::NavTables,
        tracker::{sat_slot, SatTracker},
    };
    use gnss::prelude::Constellation;

    fn dual_candidate(sv: SV, l1: f64, l2: f64, p: f64) -> Candidate {
        Candidate::new(
            sv,
            Epoch::default(),
            vec![
                Observation::dual(Carrier::L1, l1, p, Some(45.0)),
                Observation::dual(Carrier::L2, l2, p, Some(42.0)),
            ],
        )
    }

    #[test]
    fn mw_statistics_saturate() {
        let cfg = Config::preset(Profile::Static);
        let tables = NavTables::default();
        let sv = SV::new(Constellation::GPS, 5);
        let slot = sat_slot(sv).unwrap();
        let mut trackers = vec![SatTracker::default(); crate::constants::MAX_SAT];

        let range = 21_000_000.0;
        let (l1, l2) = (Carrier::L1.wavelength(), Carrier::L2.wavelength());
        let pool = vec![dual_candidate(sv, range / l1, range / l2, range)];

        for epoch in 0..150 {
            detect(&cfg, &tables, &pool, &mut trackers);
            assert!(!trackers[slot].slipped(0), "slip at epoch {}", epoch);
        }
        // constant observations: converged mean, saturated arc
        let mw = crate::candidate::combination::melbourne_wubbena(
            range / l1,
            range / l2,
            range,
            range,
            l1,
            l2,
        );
        assert!((trackers[slot].mw_mean - mw).abs() < 1E-9);
        assert_eq!(trackers[slot].mw_arc, Constants::MW_ARC_MAX);
    }

    #[test]
    fn mw_detects_two_cycle_slip() {
        let cfg = Config::preset(Profile::Static);
        let tables = NavTables::default();
        let sv = SV::new(Constellation::GPS, 5);
        let slot = sat_slot(sv).unwrap();
        let mut trackers = vec![SatTracker::default(); crate::constants::MAX_SAT];

        let range = 21_000_000.0;
        let (l1, l2) = (Carrier::L1.wavelength(), Carrier::L2.wavelength());
        let pool = vec![dual_candidate(sv, range / l1, range / l2, range)];
        for _ in 0..50 {
            detect(&cfg, &tables, &pool, &mut trackers);
        }
        assert!(!trackers[slot].slipped(0));

        // 2 cycle jump on L1
        let slipped = vec![dual_candidate(sv, range / l1 + 2.0, range / l2, range)];
        detect(&cfg, &tables, &slipped, &mut trackers);
        assert!(trackers[slot].slipped(0));
        assert!(trackers[slot].slip_mw(0));
        assert_eq!(trackers[slot].mw_arc, 1);
    }

    #[test]
    fn lli_resets_mw_arc() {
        let cfg = Config::preset(Profile::Static);
        let tables = NavTables::default();
        let sv = SV::new(Constellation::GPS, 3);
        let slot = sat_slot(sv).unwrap();
        let mut trackers = vec![SatTracker::default(); crate::constants::MAX_SAT];

        let range = 23_500_000.0;
        let (l1, l2) = (Carrier::L1.wavelength(), Carrier::L2.wavelength());
        let pool = vec![dual_candidate(sv, range / l1, range / l2, range)];
        for _ in 0..7 {
            detect(&cfg, &tables, &pool, &mut trackers);
        }
        let arc = trackers[slot].mw_arc;
        assert!(arc > 1);

        let mut flagged = dual_candidate(sv, range / l1, range / l2, range);
        flagged.observations[1].lli = 0x01;
        detect(&cfg, &tables, &vec![flagged], &mut trackers);

        assert!(trackers[slot].slip_lli(1));
        assert!(!trackers[slot].slip_gf(1));
        assert!(!trackers[slot].slip_mw(1));
        // MW statistics restart on the flagged arc
        assert_eq!(trackers[slot].mw_arc, 1);
    }
}
