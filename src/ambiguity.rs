//! Integer ambiguity resolution interface
//!
//! The integer search itself (LAMBDA and friends) is an external
//! collaborator: the estimator hands out the float ambiguity sub-vector
//! with its covariance and receives a candidate integer vector with the
//! ratio test value. Accepted fixes constrain a copy of the filter
//! state; fix-and-hold folds that copy back into the float filter.

use log::{debug, info};
use nalgebra::{DMatrix, DVector};

use crate::{
    cfg::{ArMode, Config},
    navigation::{filter, Navigation, Prepared},
};

/// External integer ambiguity search.
pub trait AmbiguityResolver {
    /// Searches an integer candidate for the float ambiguities `float`
    /// with covariance `covariance`. Returns the fixed vector and the
    /// ratio test value, `None` when the search fails.
    fn search(
        &mut self,
        float: &DVector<f64>,
        covariance: &DMatrix<f64>,
    ) -> Option<(DVector<f64>, f64)>;
}

impl Navigation {
    /// Attempts to fix the carrier phase ambiguities of the valid
    /// satellites. On success returns the constrained (x, P) copy; the
    /// float state is left untouched (the hold decision is the caller's).
    pub(crate) fn try_fix(
        &mut self,
        cfg: &Config,
        pool: &[Prepared],
        resolver: &mut dyn AmbiguityResolver,
    ) -> Option<(DVector<f64>, DMatrix<f64>)> {
        let mut indices = Vec::<(usize, usize)>::new(); // (state index, slot)
        for prepared in pool.iter() {
            if prepared.excluded {
                continue;
            }
            for freq in 0..self.index.amb_frequencies() {
                let Some(ib) = self.index.bias(prepared.slot, freq) else {
                    continue;
                };
                let tracker = &self.trackers[prepared.slot];
                if tracker.vsat[freq] && tracker.lock[freq] > 0 && self.is_active(ib) {
                    indices.push((ib, prepared.slot));
                }
            }
        }
        if indices.len() < 2 {
            return None;
        }

        let n = indices.len();
        let float = DVector::<f64>::from_fn(n, |i, _| self.x[indices[i].0]);
        let q = DMatrix::<f64>::from_fn(n, n, |i, j| self.p[(indices[i].0, indices[j].0)]);

        let (fixed, ratio) = resolver.search(&float, &q)?;
        if fixed.len() != n {
            return None;
        }
        if ratio < cfg.ar_ratio {
            debug!("ambiguity ratio {:.2} below {:.2}", ratio, cfg.ar_ratio);
            return None;
        }
        info!("ambiguities fixed, ratio {:.2}", ratio);

        // constrain a state copy with the fixed values
        let mut xa = self.x.clone();
        let mut pa = self.p.clone();
        let nx = xa.len();

        let mut h = DMatrix::<f64>::zeros(n, nx);
        let mut v = DVector::<f64>::zeros(n);
        let var = DVector::<f64>::from_element(n, 1E-8);
        for (i, (ib, _)) in indices.iter().enumerate() {
            h[(i, *ib)] = 1.0;
            v[i] = fixed[i] - self.x[*ib];
        }
        filter::measurement_update(&mut xa, &mut pa, &h, &v, &var).ok()?;

        // pairing bookkeeping: reference satellite against the others
        let reference = indices[0].1;
        for (_, slot) in indices.iter().skip(1) {
            let (low, high) = if reference < *slot {
                (reference, *slot)
            } else {
                (*slot, reference)
            };
            self.trackers[low].pair[high] = 1;
        }

        Some((xa, pa))
    }

    /// Fix-and-hold: the fixed state becomes the float state.
    pub(crate) fn hold(&mut self, xa: &DVector<f64>, pa: &DMatrix<f64>, cfg: &Config) -> bool {
        if cfg.ar_mode != ArMode::FixAndHold || self.nfix < cfg.min_fix_to_hold {
            return false;
        }
        self.x.copy_from(xa);
        self.p.copy_from(pa);
        true
    }
}
