//! Satellite attitude: nominal yaw model, eclipse condition,
//! phase windup and vehicle specific code biases.

use nalgebra::Vector3;

use crate::{
    constants::Constants,
    position::enu_rotation,
};

/// Nominal yaw angle [rad] from the sun-orbit plane angle β and the
/// orbit angle μ counted from orbit midnight.
pub(crate) fn nominal_yaw(beta: f64, mu: f64) -> f64 {
    if beta.abs() < 1E-12 && mu.abs() < 1E-12 {
        return std::f64::consts::PI;
    }
    (-beta.tan()).atan2(mu.sin()) + std::f64::consts::PI
}

/// Yaw-steered satellite body frame (êx, êy) in ECEF, `None` when the
/// orbital state degenerates. `velocity` is the ECEF velocity; the Earth
/// rotation term is restored internally to work in an inertial frame.
pub(crate) fn satellite_frame(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    sun: &Vector3<f64>,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let omega = Constants::EARTH_OMEGA_E_WGS84;
    let vi = Vector3::new(
        velocity[0] - omega * position[1],
        velocity[1] + omega * position[0],
        velocity[2],
    );

    let n = position.cross(&vi);
    let p = sun.cross(&n);
    if n.norm() == 0.0 || p.norm() == 0.0 || position.norm() == 0.0 || sun.norm() == 0.0 {
        return None;
    }

    let es = position.normalize();
    let esun = sun.normalize();
    let en = n.normalize();
    let ep = p.normalize();

    let beta = std::f64::consts::FRAC_PI_2 - esun.dot(&en).clamp(-1.0, 1.0).acos();
    let e = es.dot(&ep).clamp(-1.0, 1.0).acos();
    let mut mu = std::f64::consts::FRAC_PI_2 + if es.dot(&esun) <= 0.0 { -e } else { e };
    if mu < -std::f64::consts::FRAC_PI_2 {
        mu += 2.0 * std::f64::consts::PI;
    } else if mu >= std::f64::consts::FRAC_PI_2 {
        mu -= 2.0 * std::f64::consts::PI;
    }

    let yaw = nominal_yaw(beta, mu);
    let (sin_yaw, cos_yaw) = yaw.sin_cos();

    let ex_orb = en.cross(&es);
    let ex = -sin_yaw * en + cos_yaw * ex_orb;
    let ey = -cos_yaw * en - sin_yaw * ex_orb;
    Some((ex, ey))
}

/// Block IIA vehicles lose attitude control in Earth shadow: true when
/// this vehicle must be excluded from the epoch.
pub(crate) fn eclipsed(position: &Vector3<f64>, sun: &Vector3<f64>, vehicle: &str) -> bool {
    if !vehicle.contains("BLOCK IIA") {
        return false;
    }
    let r = position.norm();
    if r == 0.0 || sun.norm() == 0.0 {
        return false;
    }
    let cos_a = position.dot(sun) / (r * sun.norm());
    let alpha = cos_a.clamp(-1.0, 1.0).acos();
    // sunlight: on the sun side, or outside the shadow cylinder
    let sunlit = alpha < std::f64::consts::FRAC_PI_2
        || r * alpha.sin() > Constants::EARTH_RADIUS_M;
    !sunlit
}

/// Carrier phase windup [cycles], unwrapped against the previous value.
/// `ek` follows the satellite to receiver direction.
pub(crate) fn phase_windup(
    sat_position: &Vector3<f64>,
    sat_frame: (Vector3<f64>, Vector3<f64>),
    rcv_position: &Vector3<f64>,
    rcv_geodetic: &Vector3<f64>,
    previous_cycles: f64,
) -> f64 {
    let (exs, eys) = sat_frame;

    let enu = enu_rotation(rcv_geodetic[0], rcv_geodetic[1]);
    let exr = Vector3::new(enu[(0, 0)], enu[(0, 1)], enu[(0, 2)]);
    let eyr = -Vector3::new(enu[(1, 0)], enu[(1, 1)], enu[(1, 2)]);

    let ek = (rcv_position - sat_position).normalize();

    let ds = exs - ek * ek.dot(&exs) - ek.cross(&eys);
    let dr = exr - ek * ek.dot(&exr) + ek.cross(&eyr);

    let cosp = (ds.dot(&dr) / (ds.norm() * dr.norm())).clamp(-1.0, 1.0);
    let mut ph = cosp.acos() / (2.0 * std::f64::consts::PI);
    if ek.dot(&ds.cross(&dr)) < 0.0 {
        ph = -ph;
    }
    ph + (previous_cycles - ph).round()
}

/// Elevation dependent BDS-2 code multipath [m], per frequency slot
/// (B1, B3, B2), from the published wide-area corrections. GEO vehicles
/// are not corrected. Linear interpolation within the 10° elevation
/// bins, first and last rows beyond the grid.
pub(crate) fn bds2_multipath(vehicle: &str, elevation_rad: f64) -> Option<[f64; 3]> {
    // rows: elevation 0..90° by 10°, columns: IGSO B1/B3/B2, MEO B1/B3/B2
    const TABLE: [[f64; 6]; 10] = [
        [-0.55, -0.27, -0.71, -0.47, -0.22, -0.40],
        [-0.40, -0.23, -0.36, -0.38, -0.15, -0.31],
        [-0.34, -0.21, -0.33, -0.32, -0.13, -0.26],
        [-0.23, -0.15, -0.19, -0.23, -0.10, -0.18],
        [-0.15, -0.11, -0.14, -0.11, -0.04, -0.06],
        [-0.04, -0.04, -0.03, 0.06, 0.05, 0.09],
        [0.09, 0.05, 0.08, 0.34, 0.14, 0.28],
        [0.19, 0.14, 0.17, 0.69, 0.27, 0.48],
        [0.27, 0.19, 0.24, 0.97, 0.36, 0.64],
        [0.35, 0.32, 0.33, 1.05, 0.47, 0.69],
    ];

    let base = if vehicle.contains("BEIDOU-2I") {
        0
    } else if vehicle.contains("BEIDOU-2M") {
        3
    } else {
        return None;
    };

    let el_deg = elevation_rad.to_degrees();
    let pos = el_deg / 10.0;
    let mut out = [0.0_f64; 3];
    for (f, value) in out.iter_mut().enumerate() {
        *value = if pos <= 0.0 {
            TABLE[0][base + f]
        } else if pos >= 9.0 {
            TABLE[9][base + f]
        } else {
            let i = pos.floor() as usize;
            let frac = pos - i as f64;
            TABLE[i][base + f] * (1.0 - frac) + TABLE[i + 1][base + f] * frac
        };
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn yaw_singularity() {
        assert_eq!(nominal_yaw(0.0, 0.0), std::f64::consts::PI);
        assert_eq!(nominal_yaw(1E-15, -1E-15), std::f64::consts::PI);
    }

    #[test]
    fn block_iia_shadow() {
        let sun = Vector3::new(1.496E11, 0.0, 0.0);
        // opposite the sun, within the shadow cylinder
        let shadowed = Vector3::new(-26_560_000.0, 1_000_000.0, 0.0);
        assert!(eclipsed(&shadowed, &sun, "BLOCK IIA"));
        // same geometry, attitude control is fine on later blocks
        assert!(!eclipsed(&shadowed, &sun, "BLOCK IIR-M"));
        // sun side
        let sunlit = Vector3::new(26_560_000.0, 0.0, 0.0);
        assert!(!eclipsed(&sunlit, &sun, "BLOCK IIA"));
        // opposite the sun but far from the cylinder axis
        let offset = Vector3::new(-10_000_000.0, 24_600_000.0, 0.0);
        assert!(!eclipsed(&offset, &sun, "BLOCK IIA"));
    }

    #[test]
    fn windup_unwraps() {
        let rcv = Vector3::new(6_378_137.0, 0.0, 0.0);
        let geo = Vector3::new(0.0, 0.0, 0.0);
        let sat = Vector3::new(26_500_000.0, 3_000_000.0, 2_000_000.0);
        let frame = (
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let phw = phase_windup(&sat, frame, &rcv, &geo, 0.0);
        assert!(phw.abs() <= 0.5);
        // continuity: the unwrapped value never moves more than half
        // a cycle away from the previous one
        for prev in [-3.2, -0.4, 0.0, 0.7, 12.3] {
            let next = phase_windup(&sat, frame, &rcv, &geo, prev);
            assert!((next - prev).abs() <= 0.5 + 1E-9, "prev={} next={}", prev, next);
        }
    }

    #[test]
    fn bds2_interpolation() {
        // 45° sits between the 40° and 50° rows
        let igso = bds2_multipath("BEIDOU-2I", 45.0_f64.to_radians()).unwrap();
        assert!((igso[0] - (-0.15 - 0.04) / 2.0).abs() < 1E-9);
        assert!((igso[1] - (-0.11 - 0.04) / 2.0).abs() < 1E-9);
        assert!((igso[2] - (-0.14 - 0.03) / 2.0).abs() < 1E-9);
        // clamped below the grid
        let low = bds2_multipath("BEIDOU-2M", -0.1).unwrap();
        assert!((low[0] - (-0.47)).abs() < 1E-9);
        // GEO not corrected
        assert!(bds2_multipath("BEIDOU-2G", 0.5).is_none());
    }
}
