//! Linearized Kalman measurement update

use nalgebra::{DMatrix, DVector};

use crate::prelude::Error;

/// True when this parameter participates in the update: estimated
/// value set and positive variance.
pub(crate) fn is_active(x: &DVector<f64>, p: &DMatrix<f64>, i: usize) -> bool {
    x[i] != 0.0 && p[(i, i)] > 0.0
}

/// Applies the measurement update `x ← x + K v`, `P ← (I − K H) P` over
/// the active parameters only. `h` holds one row per measurement, `v`
/// the innovations and `var` the measurement variances (diagonal R).
///
/// Inactive parameters are left untouched: the gain never leaks into
/// them. The updated covariance is symmetrized before scatter.
pub(crate) fn measurement_update(
    x: &mut DVector<f64>,
    p: &mut DMatrix<f64>,
    h: &DMatrix<f64>,
    v: &DVector<f64>,
    var: &DVector<f64>,
) -> Result<(), Error> {
    let nx = x.len();
    let nv = v.len();

    let ix: Vec<usize> = (0..nx).filter(|&i| is_active(x, p, i)).collect();
    let k = ix.len();
    if k == 0 || nv == 0 {
        return Ok(());
    }

    let mut x_ = DVector::<f64>::zeros(k);
    let mut p_ = DMatrix::<f64>::zeros(k, k);
    let mut h_ = DMatrix::<f64>::zeros(nv, k);

    for (a, &i) in ix.iter().enumerate() {
        x_[a] = x[i];
        for (b, &j) in ix.iter().enumerate() {
            p_[(a, b)] = p[(i, j)];
        }
        for row in 0..nv {
            h_[(row, a)] = h[(row, i)];
        }
    }

    let hp = &h_ * &p_;
    let s = &hp * h_.transpose() + DMatrix::from_diagonal(var);
    let s_inv = s.try_inverse().ok_or(Error::MatrixInversion)?;
    let gain = &p_ * h_.transpose() * s_inv;

    x_ += &gain * v;
    let mut p_new = p_ - &gain * hp;

    // absorb the floating point asymmetry
    for a in 0..k {
        for b in (a + 1)..k {
            let mean = 0.5 * (p_new[(a, b)] + p_new[(b, a)]);
            p_new[(a, b)] = mean;
            p_new[(b, a)] = mean;
        }
    }

    if x_.iter().any(|value| !value.is_finite()) {
        return Err(Error::StateUpdate);
    }

    for (a, &i) in ix.iter().enumerate() {
        x[i] = x_[a];
        for (b, &j) in ix.iter().enumerate() {
            p[(i, j)] = p_new[(a, b)];
        }
    }

    Ok(())
}
