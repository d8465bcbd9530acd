//! Dual frequency signal combinations

/// Ionosphere free combination coefficients for wavelengths (λ1, λk).
/// c1 applies to the slot 0 signal, c2 to the slot k signal.
pub(crate) fn iono_free_coefficients(lambda_1: f64, lambda_k: f64) -> (f64, f64) {
    let denom = lambda_k.powi(2) - lambda_1.powi(2);
    (lambda_k.powi(2) / denom, -lambda_1.powi(2) / denom)
}

/// Geometry free phase combination [m], from phases in cycles.
/// Free of geometry and clocks, sensitive to ionosphere and slips.
pub(crate) fn geometry_free(l1_cycles: f64, lk_cycles: f64, lambda_1: f64, lambda_k: f64) -> f64 {
    lambda_1 * l1_cycles - lambda_k * lk_cycles
}

/// Melbourne-Wübbena wide lane combination [m], from phases in cycles
/// and pseudo ranges in meters. Free of geometry, clocks and (first order)
/// ionosphere: a jump is a cycle slip.
pub(crate) fn melbourne_wubbena(
    l1_cycles: f64,
    lk_cycles: f64,
    p1_m: f64,
    pk_m: f64,
    lambda_1: f64,
    lambda_k: f64,
) -> f64 {
    lambda_1 * lambda_k * (l1_cycles - lk_cycles) / (lambda_k - lambda_1)
        - (lambda_k * p1_m + lambda_1 * pk_m) / (lambda_1 + lambda_k)
}

/// Wide lane wavelength [m]
pub(crate) fn wide_lane_wavelength(lambda_1: f64, lambda_k: f64) -> f64 {
    lambda_1 * lambda_k / (lambda_k - lambda_1)
}
