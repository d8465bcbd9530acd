//! Atmospheric delay models

use hifitime::TimeScale;
use nalgebra::Vector3;

use crate::{
    constants::Constants,
    prelude::Epoch,
};

/// Zenith hydrostatic and wet delays [m] of the Saastamoinen model with
/// a standard atmosphere, at geodetic (lat [rad], lon [rad], height [m]).
pub(crate) fn zenith_delays(geodetic: &Vector3<f64>, humidity: f64) -> (f64, f64) {
    let (lat, hgt) = (geodetic[0], geodetic[2].max(0.0));
    if geodetic[2] < -100.0 || geodetic[2] > 1E4 {
        return (0.0, 0.0);
    }
    let pres = 1013.25 * (1.0 - 2.2557E-5 * hgt).powf(5.2568);
    let temp = 15.0 - 6.5E-3 * hgt + 273.16;
    let e = 6.108 * humidity * ((17.15 * temp - 4684.0) / (temp - 38.45)).exp();

    let zhd = 0.0022768 * pres / (1.0 - 0.00266 * (2.0 * lat).cos() - 0.00028 * hgt / 1E3);
    let zwd = 0.002277 * (1255.0 / temp + 0.05) * e;
    (zhd, zwd)
}

/// Elevation mapping function applied to zenith delays.
pub(crate) fn mapping_function(elevation_rad: f64) -> f64 {
    let sin_el = elevation_rad.sin();
    1.001 / (0.002001 + sin_el * sin_el).sqrt()
}

/// Modeled slant tropospheric delay [m] and its variance, Saastamoinen.
pub(crate) fn tropo_saastamoinen(geodetic: &Vector3<f64>, elevation_rad: f64) -> (f64, f64) {
    if elevation_rad <= 0.0 {
        return (0.0, Constants::ERR_SAAS.powi(2));
    }
    let (zhd, zwd) = zenith_delays(geodetic, Constants::REL_HUMI);
    let m = mapping_function(elevation_rad);
    (
        m * (zhd + zwd),
        (Constants::ERR_SAAS / (elevation_rad.sin() + 0.1)).powi(2),
    )
}

/// Slant delay [m] of the estimated troposphere states `x_trop`
/// (ZWD [m], optional north and east gradients), and the partial
/// derivatives with respect to each state.
pub(crate) fn tropo_estimated(
    x_trop: &[f64],
    geodetic: &Vector3<f64>,
    azimuth_rad: f64,
    elevation_rad: f64,
) -> (f64, [f64; 3]) {
    let (zhd, _) = zenith_delays(geodetic, 0.0);
    let m_h = mapping_function(elevation_rad);
    let m_w = m_h;

    let mut grad = 0.0;
    let mut dtdx = [m_w, 0.0, 0.0];
    if x_trop.len() >= 3 && elevation_rad > 0.0 {
        let cot = 1.0 / elevation_rad.tan();
        dtdx[1] = m_w * cot * azimuth_rad.cos();
        dtdx[2] = m_w * cot * azimuth_rad.sin();
        grad = dtdx[1] * x_trop[1] + dtdx[2] * x_trop[2];
    }
    (m_h * zhd + m_w * x_trop[0] + grad, dtdx)
}

/// Klobuchar broadcast model: L1 slant ionospheric delay [m].
pub(crate) fn iono_klobuchar(
    t: Epoch,
    params: &[f64; 8],
    geodetic: &Vector3<f64>,
    azimuth_rad: f64,
    elevation_rad: f64,
) -> f64 {
    use std::f64::consts::PI;

    if geodetic[2] < -1E3 || elevation_rad <= 0.0 {
        return 0.0;
    }

    // Earth centered angle and subionospheric point (semi-circles)
    let psi = 0.0137 / (elevation_rad / PI + 0.11) - 0.022;
    let mut phi = geodetic[0] / PI + psi * azimuth_rad.cos();
    phi = phi.clamp(-0.416, 0.416);
    let lam = geodetic[1] / PI + psi * azimuth_rad.sin() / (phi * PI).cos();
    phi += 0.064 * ((lam - 1.617) * PI).cos();

    let (_, tow_ns) = t.to_time_scale(TimeScale::GPST).to_time_of_week();
    let mut tt = 43200.0 * lam + tow_ns as f64 * 1E-9;
    tt -= (tt / 86400.0).floor() * 86400.0;

    let f = 1.0 + 16.0 * (0.53 - elevation_rad / PI).powi(3);

    let amp = (params[0] + phi * (params[1] + phi * (params[2] + phi * params[3]))).max(0.0);
    let per = (params[4] + phi * (params[5] + phi * (params[6] + phi * params[7]))).max(72000.0);
    let x = 2.0 * PI * (tt - 50400.0) / per;

    Constants::SPEED_OF_LIGHT_M_S
        * f
        * if x.abs() < 1.57 {
            5E-9 + amp * (1.0 + x * x * (-0.5 + x * x / 24.0))
        } else {
            5E-9
        }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn saastamoinen_sea_level() {
        let geo = Vector3::new(45.0_f64.to_radians(), 0.0, 0.0);
        let (zhd, zwd) = zenith_delays(&geo, Constants::REL_HUMI);
        // dry component near 2.3 m, wet a decimeter level term
        assert!((zhd - 2.3).abs() < 0.1, "zhd={}", zhd);
        assert!(zwd > 0.0 && zwd < 0.5, "zwd={}", zwd);
        // slant grows towards the horizon
        let (zenith, _) = tropo_saastamoinen(&geo, 90.0_f64.to_radians());
        let (low, _) = tropo_saastamoinen(&geo, 10.0_f64.to_radians());
        assert!(low > 4.0 * zenith);
    }

    #[test]
    fn estimated_gradients() {
        let geo = Vector3::new(0.7, 0.1, 50.0);
        let states = [0.15, 1E-3, -1E-3];
        let (delay, dtdx) = tropo_estimated(&states, &geo, 0.3, 0.5);
        assert!(delay > 0.0);
        assert!(dtdx[0] > 1.0); // wet mapping above 1 at 28° elevation
        assert!(dtdx[1] != 0.0 && dtdx[2] != 0.0);
        // zenith: gradients vanish
        let (_, dtdx) = tropo_estimated(&states, &geo, 0.3, std::f64::consts::FRAC_PI_2);
        assert!(dtdx[1].abs() < 1E-12);
    }
}
