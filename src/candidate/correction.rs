//! Observable corrections: antenna phase centers, code biases,
//! phase windup and vehicle specific multipath.

use nalgebra::Vector3;

use crate::{
    attitude::bds2_multipath,
    candidate::{combination::iono_free_coefficients, CodeClass},
    cfg::Config,
    constants::MAX_FREQ,
    position::enu_rotation,
    prelude::Candidate,
    products::NavTables,
};

use gnss::prelude::Constellation;

/// Corrected observables of one candidate, in meters.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Corrected {
    /// Phase per frequency slot, 0 when not usable
    pub l: [f64; MAX_FREQ],
    /// Code per frequency slot, 0 when not usable
    pub p: [f64; MAX_FREQ],
    /// Iono-free phase combination, 0 when not formed
    pub lc: f64,
    /// Iono-free code combination, 0 when not formed
    pub pc: f64,
}

/// Applies every observable level correction and forms the iono-free
/// combinations. Frequencies failing the SNR mask, missing phase or
/// code, or without a resolvable wavelength stay zero and simply do
/// not participate.
pub(crate) fn correct_observables(
    cd: &Candidate,
    cfg: &Config,
    tables: &NavTables,
    elevation_rad: f64,
    los: &Vector3<f64>,
    geodetic: &Vector3<f64>,
    sat_frame: Option<(Vector3<f64>, Vector3<f64>, Vector3<f64>)>,
    windup_cycles: f64,
) -> Corrected {
    let mut out = Corrected::default();

    let multipath = if cd.sv.constellation == Constellation::BeiDou {
        cd.vehicle
            .as_deref()
            .and_then(|vehicle| bds2_multipath(vehicle, elevation_rad))
    } else {
        None
    };

    for freq in 0..cfg.frequencies.min(MAX_FREQ) {
        let lambda = tables.wavelength(cd.sv, freq);
        if lambda == 0.0 {
            continue;
        }
        let Some((phase_cycles, mut code_m)) = cd.phase_code(freq, cfg.min_snr) else {
            continue;
        };

        let mut dant = 0.0;

        // satellite antenna, when the yaw frame resolved
        if cfg.posopt[0] {
            if let (Some(antenna), Some((ex, ey, ez))) = (tables.sv_antenna(cd.sv), sat_frame) {
                let pco = antenna.pco(freq);
                let apc = pco[0] * ex + pco[1] * ey + pco[2] * ez;
                let u = -los;
                let nadir_deg = u.dot(&ez).clamp(-1.0, 1.0).acos().to_degrees();
                dant += -apc.dot(&u) + antenna.pcv.variation(freq, nadir_deg);
            }
        }

        // receiver antenna
        if cfg.posopt[1] {
            let antenna = &tables.receiver_antenna;
            let e_enu = enu_rotation(geodetic[0], geodetic[1]) * los;
            let zenith_deg = 90.0 - elevation_rad.to_degrees();
            dant += -antenna.pco(freq).dot(&e_enu) + antenna.pcv.variation(freq, zenith_deg);
        }

        // code bias: SSR differential, or the P1-C1 / P2-C2 DCB for
        // civil code tracking
        if tables.ssr {
            if let Some(bias) = tables.ssr_code_biases.get(&(cd.sv, freq)) {
                code_m += bias;
            }
        } else if let Some(dcb) = tables.code_biases.get(&cd.sv) {
            if cd.observation(freq).map(|obs| obs.code) == Some(CodeClass::CoarseAcquisition) {
                match freq {
                    0 => code_m += dcb.p1_c1_m,
                    1 => code_m += dcb.p2_c2_m,
                    _ => {},
                }
            }
        }

        if let Some(mp) = multipath {
            code_m += mp[freq];
        }

        let windup = if cfg.posopt[2] {
            windup_cycles * lambda
        } else {
            0.0
        };

        out.l[freq] = phase_cycles * lambda - dant - windup;
        out.p[freq] = code_m - dant;
    }

    // iono-free combination on the (0, k) pair
    let k = cfg.second_frequency.slot(cd.sv.constellation);
    let (lambda_1, lambda_k) = (tables.wavelength(cd.sv, 0), tables.wavelength(cd.sv, k));
    if lambda_1 > 0.0 && lambda_k > 0.0 && k < MAX_FREQ {
        let (c1, ck) = iono_free_coefficients(lambda_1, lambda_k);
        if out.l[0] != 0.0 && out.l[k] != 0.0 {
            out.lc = c1 * out.l[0] + ck * out.l[k];
        }
        if out.p[0] != 0.0 && out.p[k] != 0.0 {
            out.pc = c1 * out.p[0] + ck * out.p[k];
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::correct_observables;
    use crate::{
        cfg::{Config, Profile},
        prelude::{Candidate, Carrier, Epoch, Observation, SV},
        products::NavTables,
    };
    use gnss::prelude::Constellation;
    use nalgebra::Vector3;

    #[test]
    fn plain_conversion_and_combination() {
        let cfg = Config::preset(Profile::Static);
        let tables = NavTables::default();
        let (l1, l2) = (Carrier::L1.wavelength(), Carrier::L2.wavelength());
        let range = 22_000_000.0_f64;

        let cd = Candidate::new(
            SV::new(Constellation::GPS, 7),
            Epoch::default(),
            vec![
                Observation::dual(Carrier::L1, range / l1, range, Some(45.0)),
                Observation::dual(Carrier::L2, range / l2, range, Some(40.0)),
            ],
        );

        let corrected = correct_observables(
            &cd,
            &cfg,
            &tables,
            0.8,
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::new(0.7, 0.1, 0.0),
            None,
            0.0,
        );

        assert!((corrected.l[0] - range).abs() < 1E-6);
        assert!((corrected.p[0] - range).abs() < 1E-6);
        // pure geometry: both combinations reproduce the range
        assert!((corrected.lc - range).abs() < 1E-6);
        assert!((corrected.pc - range).abs() < 1E-6);
    }

    #[test]
    fn bds2_code_correction() {
        let mut cfg = Config::preset(Profile::Static);
        cfg.constellations = vec![Constellation::BeiDou];
        cfg.frequencies = 3;
        let tables = NavTables::default();

        let sv = SV::new(Constellation::BeiDou, 8);
        let (b1, b3, b2) = (
            Carrier::B1I.wavelength(),
            Carrier::B3.wavelength(),
            Carrier::B2iB2b.wavelength(),
        );
        let range = 36_000_000.0_f64;
        let mut cd = Candidate::new(
            sv,
            Epoch::default(),
            vec![
                Observation::dual(Carrier::B1I, range / b1, range, Some(40.0)),
                Observation::dual(Carrier::B3, range / b3, range, Some(40.0)),
                Observation::dual(Carrier::B2iB2b, range / b2, range, Some(40.0)),
            ],
        );
        cd.set_vehicle("BEIDOU-2I");

        let corrected = correct_observables(
            &cd,
            &cfg,
            &tables,
            45.0_f64.to_radians(),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::new(0.7, 0.1, 0.0),
            None,
            0.0,
        );

        // rows 40° and 50° of the published table, averaged
        assert!((corrected.p[0] - range - (-0.095)).abs() < 1E-9);
        assert!((corrected.p[1] - range - (-0.075)).abs() < 1E-9);
        assert!((corrected.p[2] - range - (-0.085)).abs() < 1E-9);
        // phases untouched
        assert!((corrected.l[0] - range).abs() < 1E-6);
    }
}
