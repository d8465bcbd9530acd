//! Extended Kalman filter core

pub(crate) mod filter;
pub(crate) mod index;
pub(crate) mod measurement;
pub(crate) mod timeupdate;

pub use index::Param;
pub(crate) use index::StateIndex;

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::{
    candidate::Corrected,
    cfg::Config,
    constants::{Constants, MAX_SAT},
    prelude::{Candidate, Epoch, Error},
    solution::SolutionStatus,
    tracker::SatTracker,
};

/// Candidate prepared for the epoch: arena slot resolved, observables
/// corrected. The exclusion flag accumulates across filter iterations.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub cd: Candidate,
    pub slot: usize,
    pub corrected: Corrected,
    pub excluded: bool,
}

/// Filter state and its per satellite companions. Owned by one epoch
/// call at a time: commits are atomic from the caller's point of view.
pub(crate) struct Navigation {
    /// State layout, fixed at session start
    pub index: StateIndex,
    /// Parameter vector
    pub x: DVector<f64>,
    /// Covariance, symmetric, maintained in lockstep with x
    pub p: DMatrix<f64>,
    /// Per satellite tracking arena
    pub trackers: Vec<SatTracker>,
    /// Last committed epoch
    pub last_epoch: Option<Epoch>,
    /// Consecutive fixed epochs (fix-and-hold)
    pub nfix: u32,
}

impl Navigation {
    pub fn new(cfg: &Config) -> Self {
        let index = StateIndex::new(cfg);
        let size = index.size();
        Self {
            index,
            x: DVector::zeros(size),
            p: DMatrix::zeros(size, size),
            trackers: vec![SatTracker::default(); MAX_SAT],
            last_epoch: None,
            nfix: 0,
        }
    }

    /// (Re)initializes one parameter: value and variance set, the rest
    /// of the row/column cleared. Deactivation is `init_param(i, 0, 0)`.
    pub fn init_param(&mut self, i: usize, value: f64, variance: f64) {
        self.x[i] = value;
        for j in 0..self.x.len() {
            self.p[(i, j)] = 0.0;
            self.p[(j, i)] = 0.0;
        }
        self.p[(i, i)] = variance;
    }

    pub fn is_active(&self, i: usize) -> bool {
        filter::is_active(&self.x, &self.p, i)
    }

    /// Measurement iteration: prefit residuals, linear update, postfit
    /// screening. The worst post-fit outlier is excluded and the
    /// iteration restarts from the time-updated state, a bounded number
    /// of times.
    pub fn iterate(
        &mut self,
        t: Epoch,
        cfg: &Config,
        tables: &crate::products::NavTables,
        pool: &mut [Prepared],
    ) -> Result<SolutionStatus, Error> {
        let mut accepted = false;

        for iteration in 0..Constants::MAX_ITER {
            let mut xp = self.x.clone();
            let mut pp = self.p.clone();

            let prefit = measurement::residuals(
                0,
                cfg,
                tables,
                &self.index,
                &mut self.trackers,
                pool,
                &xp,
                t,
            );
            if prefit.nv == 0 {
                warn!("{} no valid observation", t);
                return Err(Error::NoValidObservation);
            }

            filter::measurement_update(&mut xp, &mut pp, &prefit.h, &prefit.v, &prefit.var)?;

            let postfit = measurement::residuals(
                iteration + 1,
                cfg,
                tables,
                &self.index,
                &mut self.trackers,
                pool,
                &xp,
                t,
            );
            if postfit.nv > 0 && !postfit.rejected {
                debug!("{} converged after {} iteration(s)", t, iteration + 1);
                self.x = xp;
                self.p = pp;
                accepted = true;
                break;
            }
        }

        if accepted {
            Ok(SolutionStatus::Float)
        } else {
            warn!("{} no convergence within {} iterations", t, Constants::MAX_ITER);
            Err(Error::NoValidObservation)
        }
    }

    /// Commit step: valid satellite accounting, lock/outage counters,
    /// epoch bookkeeping. Returns the number of valid satellites.
    pub fn commit(&mut self, t: Epoch, cfg: &Config, pool: &[Prepared]) -> usize {
        use itertools::Itertools;

        let nsat = pool
            .iter()
            .filter(|prepared| self.trackers[prepared.slot].vsat[0])
            .map(|prepared| prepared.slot)
            .unique()
            .count();

        for prepared in pool.iter() {
            let tracker = &mut self.trackers[prepared.slot];
            for freq in 0..cfg.num_amb_frequencies() {
                if tracker.vsat[freq] {
                    tracker.lock[freq] += 1;
                    tracker.outage[freq] = 0;
                    if tracker.slipped(freq) {
                        tracker.slip_count[freq] += 1;
                    }
                }
            }
        }

        self.last_epoch = Some(t);
        nsat
    }

    /// Position covariance in the 6 component (xx, yy, zz, xy, yz, zx)
    /// convention.
    pub fn position_covariance(&self) -> [f64; 6] {
        let p = &self.p;
        [
            p[(0, 0)],
            p[(1, 1)],
            p[(2, 2)],
            p[(0, 1)],
            p[(1, 2)],
            p[(2, 0)],
        ]
    }
}
