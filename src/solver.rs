//! PPP solver

use std::fmt::Write;

use log::{debug, info, warn};
use nalgebra::Vector3;

use gnss::prelude::Constellation;

use crate::{
    ambiguity::AmbiguityResolver,
    attitude::{eclipsed, phase_windup, satellite_frame},
    candidate::correction::correct_observables,
    cfg::{ArMode, Config, IonoModel},
    constants::{Constants, MAX_FREQ},
    navigation::{Navigation, Prepared},
    position::{azimuth_elevation, geometric_distance, AprioriPosition},
    prelude::{Candidate, Epoch, Error},
    products::NavTables,
    slip,
    solution::{SatDiagnostics, Solution, SolutionStatus},
    tracker::{sat_slot, slot_sv},
};

/// Per epoch externals, resolved by the caller: single point seed,
/// receiver clock offsets and the sun position.
#[derive(Debug, Clone)]
pub struct EpochContext {
    /// Position seed, typically the single point solution
    pub apriori: AprioriPosition,
    /// Single point receiver clock offsets [s], per constellation
    pub clocks_s: Vec<(Constellation, f64)>,
    /// Sun ECEF position [m], for attitude, eclipse and windup
    pub sun_position_m: Vector3<f64>,
}

/// [Solver] to resolve PPP [Solution]s. One instance per receiver
/// stream: an epoch call owns the session state for its whole duration
/// and commits atomically.
pub struct Solver {
    /// Solver parametrization
    pub cfg: Config,
    /// Filter state
    pub(crate) nav: Navigation,
    /// External integer ambiguity search
    resolver: Option<Box<dyn AmbiguityResolver>>,
}

impl Solver {
    /// Creates a new [Solver] for this session [Config]. The filter
    /// state layout is fixed here and never changes afterwards.
    pub fn new(cfg: &Config) -> Result<Self, Error> {
        if cfg.frequencies == 0 || cfg.frequencies > MAX_FREQ {
            return Err(Error::InvalidConfiguration(format!(
                "{} frequencies",
                cfg.frequencies
            )));
        }
        if cfg.constellations.is_empty() {
            return Err(Error::InvalidConfiguration("no constellation".to_string()));
        }
        if cfg.iono == IonoModel::IonoFree && cfg.frequencies < 2 {
            return Err(Error::InvalidConfiguration(
                "iono-free combination requires two frequencies".to_string(),
            ));
        }
        info!(
            "session: {} profile, {} frequencies, iono {:?}, tropo {:?}",
            cfg.profile, cfg.frequencies, cfg.iono, cfg.tropo
        );
        Ok(Self {
            cfg: cfg.clone(),
            nav: Navigation::new(cfg),
            resolver: None,
        })
    }

    /// Attaches an external integer ambiguity search, enabling the
    /// fixed solution path when [Config::ar_mode] requests it.
    pub fn with_ambiguity_resolver(mut self, resolver: Box<dyn AmbiguityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// [Solution] resolution attempt.
    /// ## Inputs
    /// - t: sampling [Epoch]
    /// - pool: list of [Candidate]
    /// - tables: precise products for the session
    /// - ctx: per epoch externals
    pub fn resolve(
        &mut self,
        t: Epoch,
        pool: &[Candidate],
        tables: &NavTables,
        ctx: &EpochContext,
    ) -> Result<Solution, Error> {
        if pool.is_empty() {
            return Err(Error::NotEnoughCandidates);
        }

        let cfg = self.cfg.clone();

        // cycle slips observe the raw observations and the previous
        // committed state
        slip::detect(&cfg, tables, pool, &mut self.nav.trackers);

        let mut prepared = self.prepare(t, pool, tables, ctx);
        if prepared.is_empty() {
            return Err(Error::NotEnoughPreFitCandidates);
        }

        self.nav
            .time_update(t, &cfg, tables, &ctx.apriori, &ctx.clocks_s, &prepared);

        let mut status = self.nav.iterate(t, &cfg, tables, &mut prepared)?;

        // fixed solution attempt
        let mut fixed_state = None;
        if cfg.ar_mode != ArMode::Off {
            if let Some(resolver) = self.resolver.as_mut() {
                match self.nav.try_fix(&cfg, &prepared, resolver.as_mut()) {
                    Some((xa, pa)) => {
                        let std_3d = (pa[(0, 0)] + pa[(1, 1)] + pa[(2, 2)]).sqrt();
                        if std_3d < Constants::MAX_STD_FIX {
                            self.nav.nfix += 1;
                            if self.nav.hold(&xa, &pa, &cfg) {
                                info!("{} fixed states held", t);
                            }
                            fixed_state = Some((xa, pa));
                            status = SolutionStatus::Fixed;
                        } else {
                            debug!("{} fix rejected: std {:.3}m", t, std_3d);
                            self.nav.nfix = 0;
                        }
                    },
                    None => self.nav.nfix = 0,
                }
            }
        }

        let nsat = self.nav.commit(t, &cfg, &prepared);
        if nsat < Constants::MIN_NSAT_SOL {
            warn!("{} only {} valid satellites", t, nsat);
            status = SolutionStatus::None;
        }

        let (position, velocity, covariance) = match &fixed_state {
            Some((xa, pa)) => (
                Vector3::new(xa[0], xa[1], xa[2]),
                self.velocity_of(xa),
                [
                    pa[(0, 0)],
                    pa[(1, 1)],
                    pa[(2, 2)],
                    pa[(0, 1)],
                    pa[(1, 2)],
                    pa[(2, 0)],
                ],
            ),
            None => (
                Vector3::new(self.nav.x[0], self.nav.x[1], self.nav.x[2]),
                self.velocity_of(&self.nav.x),
                self.nav.position_covariance(),
            ),
        };

        let clocks_s = self
            .nav
            .index
            .systems()
            .iter()
            .filter_map(|sys| {
                let ic = self.nav.index.clock(*sys)?;
                Some((*sys, self.nav.x[ic] / Constants::SPEED_OF_LIGHT_M_S))
            })
            .collect();

        Ok(Solution {
            t,
            status,
            position,
            velocity,
            covariance,
            clocks_s,
            nsat,
        })
    }

    /// Screens and prepares the candidate pool: arena slots, attitude,
    /// eclipse exclusion, phase windup and observable corrections.
    fn prepare(
        &mut self,
        t: Epoch,
        pool: &[Candidate],
        tables: &NavTables,
        ctx: &EpochContext,
    ) -> Vec<Prepared> {
        let cfg = &self.cfg;
        let mut out = Vec::<Prepared>::with_capacity(pool.len());

        for cd in pool.iter() {
            if !cd.is_usable(&cfg.excluded) {
                debug!("{} ({}) unusable candidate", t, cd.sv);
                continue;
            }
            let Some(slot) = sat_slot(cd.sv) else {
                debug!("{} ({}) out of arena range", t, cd.sv);
                continue;
            };
            if self.nav.index.clock(cd.sv.constellation).is_none() {
                debug!("{} ({}) constellation not processed", t, cd.sv);
                continue;
            }

            let mut cd = cd.clone();
            let mut state = cd.state.expect("screened above");

            // Block IIA eclipse: zero the position, downstream skips it
            if cfg.posopt[3] {
                if let Some(vehicle) = cd.vehicle.as_deref() {
                    if eclipsed(&state.position_m, &ctx.sun_position_m, vehicle) {
                        warn!("{} ({}) eclipsed: excluded", t, cd.sv);
                        state.position_m = Vector3::zeros();
                        cd.state = Some(state);
                        out.push(Prepared {
                            cd,
                            slot,
                            corrected: Default::default(),
                            excluded: true,
                        });
                        continue;
                    }
                }
            }

            let (_, e) = geometric_distance(&state.position_m, &ctx.apriori.ecef());
            let (_, elevation) = azimuth_elevation(&e, &ctx.apriori.geodetic());

            let frame = if cfg.posopt[0] || cfg.posopt[2] {
                satellite_frame(&state.position_m, &state.velocity_m_s, &ctx.sun_position_m).map(
                    |(ex, ey)| {
                        let ez = -state.position_m.normalize();
                        (ex, ey, ez)
                    },
                )
            } else {
                None
            };

            if cfg.posopt[2] {
                if let Some((ex, ey, _)) = frame {
                    let previous = self.nav.trackers[slot].windup_cycles;
                    let windup = phase_windup(
                        &state.position_m,
                        (ex, ey),
                        &ctx.apriori.ecef(),
                        &ctx.apriori.geodetic(),
                        previous,
                    );
                    self.nav.trackers[slot].windup_cycles = windup;
                }
            }

            let corrected = correct_observables(
                &cd,
                cfg,
                tables,
                elevation,
                &e,
                &ctx.apriori.geodetic(),
                frame,
                self.nav.trackers[slot].windup_cycles,
            );

            out.push(Prepared {
                cd,
                slot,
                corrected,
                excluded: false,
            });
        }
        out
    }

    fn velocity_of(&self, x: &nalgebra::DVector<f64>) -> Vector3<f64> {
        match self.nav.index.velocity() {
            Some(iv) => Vector3::new(x[iv], x[iv + 1], x[iv + 2]),
            None => Vector3::zeros(),
        }
    }

    /// Per satellite diagnostics of the last committed epoch.
    pub fn diagnostics(&self, sv: gnss::prelude::SV) -> Option<SatDiagnostics> {
        let slot = sat_slot(sv)?;
        let tracker = &self.nav.trackers[slot];
        let mut ambiguity = [None; 3];
        for (freq, amb) in ambiguity.iter_mut().enumerate() {
            if let Some(ib) = self.nav.index.bias(slot, freq) {
                if self.nav.is_active(ib) {
                    *amb = Some((self.nav.x[ib], self.nav.p[(ib, ib)].sqrt()));
                }
            }
        }
        Some(SatDiagnostics {
            azimuth_rad: tracker.azimuth_rad,
            elevation_rad: tracker.elevation_rad,
            phase_residuals: tracker.postfit_phase,
            code_residuals: tracker.postfit_code,
            slip: tracker.slip,
            lock: tracker.lock,
            outage: tracker.outage,
            mw_mean: tracker.mw_mean,
            mw_arc: tracker.mw_arc,
            ambiguity,
        })
    }

    /// Line oriented status report of the committed state:
    /// `$POS`, `$VELACC`, `$CLK`, `$TROP`, `$TRPG`, `$ION`, `$DCB` and
    /// `$AMB` records (week, tow, status, values, stds).
    pub fn status_report(&self, solution: &Solution) -> String {
        let mut out = String::with_capacity(512);
        let (week, tow) = solution.week_tow();
        let stat = solution.status.code();
        let nav = &self.nav;

        let _ = writeln!(
            out,
            "$POS,{},{:.3},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            week,
            tow,
            stat,
            solution.position[0],
            solution.position[1],
            solution.position[2],
            solution.covariance[0].max(0.0).sqrt(),
            solution.covariance[1].max(0.0).sqrt(),
            solution.covariance[2].max(0.0).sqrt(),
        );

        if let Some(iv) = nav.index.velocity() {
            let ia = nav.index.acceleration().unwrap_or(iv);
            let _ = writeln!(
                out,
                "$VELACC,{},{:.3},{},{:.4},{:.4},{:.4},{:.5},{:.5},{:.5}",
                week,
                tow,
                stat,
                nav.x[iv],
                nav.x[iv + 1],
                nav.x[iv + 2],
                nav.x[ia],
                nav.x[ia + 1],
                nav.x[ia + 2],
            );
        }

        for (sys, dt) in solution.clocks_s.iter() {
            let std = nav
                .index
                .clock(*sys)
                .map(|ic| nav.p[(ic, ic)].max(0.0).sqrt())
                .unwrap_or(0.0);
            let _ = writeln!(
                out,
                "$CLK,{},{:.3},{},{},{:.4},{:.4}",
                week,
                tow,
                stat,
                sys,
                dt * Constants::SPEED_OF_LIGHT_M_S,
                std,
            );
        }

        if let Some(it) = nav.index.tropo() {
            let _ = writeln!(
                out,
                "$TROP,{},{:.3},{},1,{:.4},{:.4}",
                week,
                tow,
                stat,
                nav.x[it],
                nav.p[(it, it)].max(0.0).sqrt(),
            );
            if nav.index.num_tropo() == 3 {
                let _ = writeln!(
                    out,
                    "$TRPG,{},{:.3},{},1,{:.5},{:.5},{:.5},{:.5}",
                    week,
                    tow,
                    stat,
                    nav.x[it + 1],
                    nav.x[it + 2],
                    nav.p[(it + 1, it + 1)].max(0.0).sqrt(),
                    nav.p[(it + 2, it + 2)].max(0.0).sqrt(),
                );
            }
        }

        if self.cfg.iono == IonoModel::Estimate {
            for slot in 0..crate::constants::MAX_SAT {
                let Some(ii) = nav.index.iono(slot) else {
                    continue;
                };
                if !nav.is_active(ii) {
                    continue;
                }
                let Some(sv) = slot_sv(slot) else {
                    continue;
                };
                let tracker = &nav.trackers[slot];
                let _ = writeln!(
                    out,
                    "$ION,{},{:.3},{},{},{:.1},{:.1},{:.4},{:.4}",
                    week,
                    tow,
                    stat,
                    sv,
                    tracker.azimuth_rad.to_degrees(),
                    tracker.elevation_rad.to_degrees(),
                    nav.x[ii],
                    nav.p[(ii, ii)].max(0.0).sqrt(),
                );
            }
        }

        if let Some(id) = nav.index.dcb() {
            if nav.is_active(id) {
                let _ = writeln!(
                    out,
                    "$DCB,{},{:.3},{},{:.4},{:.4}",
                    week,
                    tow,
                    stat,
                    nav.x[id],
                    nav.p[(id, id)].max(0.0).sqrt(),
                );
            }
        }

        for slot in 0..crate::constants::MAX_SAT {
            for freq in 0..nav.index.amb_frequencies() {
                let Some(ib) = nav.index.bias(slot, freq) else {
                    continue;
                };
                if !nav.is_active(ib) {
                    continue;
                }
                let Some(sv) = slot_sv(slot) else {
                    continue;
                };
                let _ = writeln!(
                    out,
                    "$AMB,{},{:.3},{},{},{},{:.4},{:.4}",
                    week,
                    tow,
                    stat,
                    sv,
                    freq + 1,
                    nav.x[ib],
                    nav.p[(ib, ib)].max(0.0).sqrt(),
                );
            }
        }

        out
    }
}
