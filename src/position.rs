//! Receiver position and local geometry

use map_3d::{ecef2geodetic, geodetic2ecef, Ellipsoid};
use nalgebra::{Matrix3, Vector3};

use crate::constants::Constants;

/// Position seed for the epoch, typically the single point solution.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct AprioriPosition {
    /// ECEF coordinates
    pub(crate) ecef: Vector3<f64>,
    /// Geodetic coordinates
    pub(crate) geodetic: Vector3<f64>,
}

impl AprioriPosition {
    /// Builds Self from ECEF coordinates [m]
    pub fn from_ecef(ecef: Vector3<f64>) -> Self {
        let (x, y, z) = (ecef[0], ecef[1], ecef[2]);
        let (lat, lon, h) = ecef2geodetic(x, y, z, Ellipsoid::WGS84);
        Self {
            ecef,
            geodetic: Vector3::new(lat, lon, h),
        }
    }

    /// Builds Self from Geodetic coordinates:
    /// latitude [rad], longitude [rad] and altitude above sea [m].
    pub fn from_geo(geodetic: Vector3<f64>) -> Self {
        let (lat, lon, alt) = (geodetic[0], geodetic[1], geodetic[2]);
        let (x, y, z) = geodetic2ecef(lat, lon, alt, Ellipsoid::WGS84);
        Self {
            geodetic,
            ecef: Vector3::new(x, y, z),
        }
    }

    /// Returns ECEF coordinates
    pub fn ecef(&self) -> Vector3<f64> {
        self.ecef
    }

    /// Returns Geodetic coordinates
    pub fn geodetic(&self) -> Vector3<f64> {
        self.geodetic
    }
}

/// Geodetic coordinates (lat [rad], lon [rad], height [m]) of an ECEF point.
pub(crate) fn ecef_to_geodetic(ecef: &Vector3<f64>) -> Vector3<f64> {
    let (lat, lon, h) = ecef2geodetic(ecef[0], ecef[1], ecef[2], Ellipsoid::WGS84);
    Vector3::new(lat, lon, h)
}

/// Rotation from ECEF into the local East/North/Up frame at geodetic
/// (lat [rad], lon [rad]). Rows are the E, N, U unit vectors.
pub(crate) fn enu_rotation(lat: f64, lon: f64) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}

/// Geometric range [m] with the Sagnac correction, and the receiver
/// to satellite unit line of sight in ECEF.
pub(crate) fn geometric_distance(
    sat_m: &Vector3<f64>,
    rcv_m: &Vector3<f64>,
) -> (f64, Vector3<f64>) {
    let diff = sat_m - rcv_m;
    let r = diff.norm();
    let e = diff / r;
    let sagnac = Constants::EARTH_OMEGA_E_WGS84
        * (sat_m[0] * rcv_m[1] - sat_m[1] * rcv_m[0])
        / Constants::SPEED_OF_LIGHT_M_S;
    (r + sagnac, e)
}

/// Azimuth and elevation [rad] of the line of sight `e` (ECEF unit,
/// receiver to satellite) at receiver geodetic coordinates.
pub(crate) fn azimuth_elevation(e: &Vector3<f64>, geodetic: &Vector3<f64>) -> (f64, f64) {
    let enu = enu_rotation(geodetic[0], geodetic[1]) * e;
    let azimuth = enu[0].atan2(enu[1]).rem_euclid(2.0 * std::f64::consts::PI);
    let elevation = enu[2].asin();
    (azimuth, elevation)
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn enu_rotation_is_orthonormal() {
        let r = enu_rotation(0.8_f64, -1.2_f64);
        let should_be_identity = r * r.transpose();
        assert!((should_be_identity - nalgebra::Matrix3::identity()).norm() < 1E-12);
    }

    #[test]
    fn zenith_elevation() {
        let apriori = AprioriPosition::from_geo(Vector3::new(0.7, 0.1, 100.0));
        let r = enu_rotation(apriori.geodetic()[0], apriori.geodetic()[1]);
        let up = Vector3::new(r[(2, 0)], r[(2, 1)], r[(2, 2)]);
        let (_, el) = azimuth_elevation(&up, &apriori.geodetic());
        assert!((el - std::f64::consts::FRAC_PI_2).abs() < 1E-9);

        let north = Vector3::new(r[(1, 0)], r[(1, 1)], r[(1, 2)]);
        let (az, el) = azimuth_elevation(&north, &apriori.geodetic());
        assert!(az.abs() < 1E-9);
        assert!(el.abs() < 1E-9);
    }
}
