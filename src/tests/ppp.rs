use hifitime::TimeScale;
use nalgebra::Vector3;

use crate::{
    position::AprioriPosition,
    prelude::*,
    tests::{position_error, Scenario, SAMPLING_S},
    tracker::{SLIP, SLIP_GF, SLIP_LLI, SLIP_MW},
};

fn epoch(tow_s: f64) -> Epoch {
    Epoch::from_time_of_week(2300, (tow_s * 1E9) as u64, TimeScale::GPST)
}

#[test]
fn single_epoch_float() {
    let _ = env_logger::try_init();

    let scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();

    let t = epoch(3600.0);
    let solution = solver
        .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
        .unwrap();

    assert_eq!(solution.status, SolutionStatus::Float);
    assert_eq!(solution.nsat, 6);
    assert!(
        position_error(&scenario, &solution) < 1E-3,
        "residual {:.6}m",
        position_error(&scenario, &solution)
    );
    // receiver clock recovered
    let (_, dt) = solution.clocks_s[0];
    assert!((dt - scenario.dtr_s).abs() * Constants::SPEED_OF_LIGHT_M_S < 1E-3);

    for (sv, _, _) in scenario.sats.iter() {
        let diag = solver.diagnostics(*sv).unwrap();
        assert_eq!(diag.mw_arc, 1);
        assert!(diag.ambiguity[0].is_some());
    }
}

#[test]
fn static_hundred_epochs_with_slip() {
    let mut scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();
    let sv5 = SV::new(Constellation::GPS, 5);

    let mut previous = None;
    for i in 0..100 {
        if i == 50 {
            // abrupt 2 cycle slip on L1
            *scenario.ambiguities.get_mut(&(sv5, 0)).unwrap() += 2.0;
        }
        let t = epoch(3600.0 + i as f64 * SAMPLING_S);
        let solution = solver
            .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Float, "epoch {}", i);

        let diag = solver.diagnostics(sv5).unwrap();
        match i {
            49 => {
                assert_eq!(diag.lock[0], 50);
                previous = Some(solution.position);
            },
            50 => {
                assert!(diag.slip[0] & SLIP != 0, "slip not raised");
                assert!(diag.slip[0] & SLIP_MW != 0, "MW detector silent");
                assert_eq!(diag.lock[0], 1, "ambiguity not reinitialized");
                let jump = (solution.position - previous.unwrap()).norm();
                assert!(jump < 5E-3, "position jump {:.4}m", jump);
            },
            51 => {
                assert_eq!(diag.slip[0] & SLIP, 0);
            },
            _ => {},
        }
        assert!(position_error(&scenario, &solution) < 1E-3);
    }
}

#[test]
fn lli_flag_provenance() {
    let mut scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();
    let sv3 = SV::new(Constellation::GPS, 3);

    for i in 0..10 {
        scenario.lli.clear();
        if i == 7 {
            scenario.lli.push((sv3, 1));
        }
        let t = epoch(3600.0 + i as f64 * SAMPLING_S);
        solver
            .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
            .unwrap();

        let diag = solver.diagnostics(sv3).unwrap();
        if i == 7 {
            assert!(diag.slip[1] & SLIP_LLI != 0);
            assert_eq!(diag.slip[1] & SLIP_GF, 0);
            assert_eq!(diag.slip[1] & SLIP_MW, 0);
            // MW arc restarts under the receiver flag
            assert_eq!(diag.mw_arc, 1);
        } else if i == 6 {
            assert_eq!(diag.mw_arc, 7);
        }
    }
}

#[test]
fn day_boundary_resets_ambiguities() {
    let scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();

    // 30s sampling across tow = 86400
    for (i, tow) in [86_340.0, 86_370.0, 86_400.0, 86_430.0].iter().enumerate() {
        let t = epoch(*tow);
        let solution = solver
            .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Float);
        assert!(position_error(&scenario, &solution) < 1E-3);

        for (sv, _, _) in scenario.sats.iter() {
            let lock = solver.diagnostics(*sv).unwrap().lock[0];
            match i {
                0 => assert_eq!(lock, 1),
                1 => assert_eq!(lock, 2),
                // every active ambiguity went through a reset
                2 => assert_eq!(lock, 1, "({}) not reset on day boundary", sv),
                3 => assert_eq!(lock, 2),
                _ => unreachable!(),
            }
        }
    }
}

#[test]
fn single_satellite_phase_jump_is_isolated() {
    let mut scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();
    let jumper = SV::new(Constellation::GPS, 1);

    for i in 0..5 {
        let t = epoch(3600.0 + i as f64 * SAMPLING_S);
        solver
            .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
            .unwrap();
    }

    let before: Vec<f64> = scenario
        .sats
        .iter()
        .map(|(sv, _, _)| solver.diagnostics(*sv).unwrap().ambiguity[0].unwrap().0)
        .collect();

    // millisecond class jump on a single vehicle: the common offset
    // correction must not engage
    let jump = 0.0006 * Constants::SPEED_OF_LIGHT_M_S;
    scenario.phase_offset_m.insert((jumper, 0), jump);
    scenario.phase_offset_m.insert((jumper, 1), jump);

    let t = epoch(3600.0 + 5.0 * SAMPLING_S);
    let solution = solver
        .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
        .unwrap();
    assert!(position_error(&scenario, &solution) < 1E-3);

    for ((sv, _, _), old) in scenario.sats.iter().zip(before.iter()) {
        let (amb, _) = solver.diagnostics(*sv).unwrap().ambiguity[0].unwrap();
        if *sv == jumper {
            // slipped and reinitialized with the jump absorbed
            assert!((amb - old).abs() > 1.0, "jump not absorbed");
        } else {
            assert!(
                (amb - old).abs() < 1E-6,
                "({}) ambiguity dragged by foreign jump",
                sv
            );
        }
    }
}

#[test]
fn eclipsing_block_iia_excluded() {
    let mut scenario = Scenario::gps_six();
    let mut cfg = scenario.config();
    cfg.posopt[3] = true;
    let tables = NavTables::default();

    // seventh vehicle, Block IIA, directly opposite the sun
    let sv10 = SV::new(Constellation::GPS, 10);
    scenario.sats.push((sv10, 40.0, 55.0));
    scenario.ambiguities.insert((sv10, 0), 1_010.0);
    scenario.ambiguities.insert((sv10, 1), 2_010.0);
    let shadow_direction = scenario.sat_position(40.0, 55.0).normalize();
    scenario.sun_m = -shadow_direction * 1.496E11;

    let mut solver = Solver::new(&cfg).unwrap();
    let t = epoch(3600.0);
    let mut pool = scenario.candidates(t);
    for cd in pool.iter_mut() {
        if cd.sv == sv10 {
            cd.set_vehicle("BLOCK IIA");
        }
    }

    let solution = solver
        .resolve(t, &pool, &tables, &scenario.context())
        .unwrap();

    assert_eq!(solution.status, SolutionStatus::Float);
    assert_eq!(solution.nsat, 6, "eclipsing vehicle contributed");
    assert!(position_error(&scenario, &solution) < 1E-3);
    // no ambiguity was ever set up for the shadowed vehicle
    assert!(solver.diagnostics(sv10).unwrap().ambiguity[0].is_none());
}

#[test]
fn covariance_stays_symmetric() {
    let scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();

    for i in 0..25 {
        let t = epoch(3600.0 + i as f64 * SAMPLING_S);
        solver
            .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
            .unwrap();

        let nav = &solver.nav;
        let n = nav.x.len();
        let scale = nav
            .p
            .iter()
            .fold(0.0_f64, |max, value| max.max(value.abs()));
        for a in 0..n {
            for b in 0..n {
                assert!(
                    (nav.p[(a, b)] - nav.p[(b, a)]).abs() <= 1E-12 * scale,
                    "asymmetry at ({}, {})",
                    a,
                    b
                );
            }
            if nav.is_active(a) {
                assert!(nav.p[(a, a)] > 0.0, "active diagonal {} not positive", a);
            }
        }
    }
}

#[test]
fn static_convergence_from_offset_seed() {
    let mut scenario = Scenario::gps_six();
    scenario.seed = AprioriPosition::from_ecef(
        scenario.truth.ecef() + Vector3::new(3.0, -2.0, 4.0),
    );
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();

    let mut first = None;
    let mut last = 0.0;
    for i in 0..40 {
        let t = epoch(3600.0 + i as f64 * SAMPLING_S);
        let solution = solver
            .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
            .unwrap();
        last = position_error(&scenario, &solution);
        if first.is_none() {
            first = Some(last);
        }
    }
    assert!(last < 1E-3, "no convergence: {:.4}m", last);
    assert!(last <= first.unwrap() + 1E-9);
}

#[test]
fn noisy_measurements_stay_bounded() {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    let scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();
    let mut rng = SmallRng::seed_from_u64(7);

    for i in 0..20 {
        let t = epoch(3600.0 + i as f64 * SAMPLING_S);
        let mut pool = scenario.candidates(t);
        for cd in pool.iter_mut() {
            for obs in cd.observations.iter_mut() {
                let lambda = obs.carrier.wavelength();
                if let Some(phase) = obs.phase_cycles.as_mut() {
                    *phase += rng.random_range(-0.005..0.005) / lambda;
                }
                if let Some(code) = obs.pseudo_range_m.as_mut() {
                    *code += rng.random_range(-0.5..0.5);
                }
            }
        }
        let solution = solver
            .resolve(t, &pool, &tables, &scenario.context())
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::Float);
        assert!(
            position_error(&scenario, &solution) < 1.0,
            "epoch {}: error {:.3}m",
            i,
            position_error(&scenario, &solution)
        );
    }
}

#[test]
fn status_stream_records() {
    let scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();

    let t = epoch(3600.0);
    let solution = solver
        .resolve(t, &scenario.candidates(t), &tables, &scenario.context())
        .unwrap();

    let report = solver.status_report(&solution);
    assert!(report.contains("$POS,2300,3600.000,2,"));
    assert!(report.contains("$CLK,"));
    assert!(report.contains("$AMB,"));
    // no troposphere estimation in this session
    assert!(!report.contains("$TROP,"));
    assert_eq!(report.matches("$AMB,").count(), 6);
}

#[test]
fn empty_pool_rejected() {
    let scenario = Scenario::gps_six();
    let cfg = scenario.config();
    let mut solver = Solver::new(&cfg).unwrap();
    let tables = NavTables::default();

    let result = solver.resolve(epoch(3600.0), &[], &tables, &scenario.context());
    assert!(matches!(result, Err(Error::NotEnoughCandidates)));
}
