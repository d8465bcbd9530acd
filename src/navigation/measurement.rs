//! Measurement model
//!
//! Assembles, for each usable (satellite, frequency, phase/code)
//! triplet, the innovation, design row and variance on the current
//! state estimate. Pre-fit innovations beyond the configured limit drop
//! the satellite; post-fit screening excludes the single worst outlier
//! beyond 4σ and asks the caller to iterate.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Vector3};

use gnss::prelude::Constellation;

use crate::{
    bias::{iono_klobuchar, mapping_function, tropo_estimated, tropo_saastamoinen},
    cfg::{Config, ErrorModel, IonoModel, TropoModel},
    constants::Constants,
    navigation::{Prepared, StateIndex},
    position::{azimuth_elevation, ecef_to_geodetic, geometric_distance},
    prelude::Epoch,
    products::NavTables,
    tracker::SatTracker,
};

/// One epoch's linearized measurement set.
pub(crate) struct Residuals {
    /// Innovations
    pub v: DVector<f64>,
    /// Design matrix, one row per innovation
    pub h: DMatrix<f64>,
    /// Measurement variances (diagonal R)
    pub var: DVector<f64>,
    /// Number of measurements
    pub nv: usize,
    /// Post-fit only: a measurement was rejected, iterate again
    pub rejected: bool,
}

struct Row {
    v: f64,
    h: DVector<f64>,
    var: f64,
    pool_index: usize,
    phase: bool,
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn residuals(
    post: usize,
    cfg: &Config,
    tables: &NavTables,
    index: &StateIndex,
    trackers: &mut [SatTracker],
    pool: &mut [Prepared],
    x: &DVector<f64>,
    t: Epoch,
) -> Residuals {
    let nx = index.size();
    let rr = Vector3::new(x[0], x[1], x[2]);
    let geodetic = ecef_to_geodetic(&rr);
    let nf_obs = if cfg.iono == IonoModel::IonoFree {
        1
    } else {
        cfg.frequencies
    };

    if post > 0 {
        for prepared in pool.iter() {
            trackers[prepared.slot].vsat = [false; crate::constants::MAX_FREQ];
        }
    }

    let mut rows = Vec::<Row>::with_capacity(pool.len() * 2 * nf_obs);

    for (pool_index, prepared) in pool.iter_mut().enumerate() {
        if prepared.excluded {
            continue;
        }
        let Some(state) = prepared.cd.state else {
            continue;
        };
        if state.position_m.norm() == 0.0 {
            // eclipsing vehicles have their position zeroed out
            continue;
        }
        let sv = prepared.cd.sv;
        let Some(ic) = index.clock(sv.constellation) else {
            continue;
        };

        let (r, e) = geometric_distance(&state.position_m, &rr);
        let (azimuth, elevation) = azimuth_elevation(&e, &geodetic);
        {
            let tracker = &mut trackers[prepared.slot];
            tracker.azimuth_rad = azimuth;
            tracker.elevation_rad = elevation;
        }

        if elevation < cfg.min_sv_elev.to_radians() {
            debug!("{} ({}) below elevation mask", t, sv);
            continue;
        }

        let (dtrp, var_trp, dtdx) = tropo_delay(cfg, tables, index, x, &geodetic, azimuth, elevation);
        let Some((dion, var_ion)) =
            iono_delay(cfg, tables, index, x, prepared, t, &geodetic, azimuth, elevation)
        else {
            debug!("{} ({}) no ionosphere delay", t, sv);
            continue;
        };

        for j in 0..2 * nf_obs {
            let freq = j / 2;
            let phase = j % 2 == 0;

            let y = if cfg.iono == IonoModel::IonoFree {
                if phase {
                    prepared.corrected.lc
                } else {
                    prepared.corrected.pc
                }
            } else if phase {
                prepared.corrected.l[freq]
            } else {
                prepared.corrected.p[freq]
            };
            if y == 0.0 {
                continue;
            }

            let lambda_1 = tables.wavelength(sv, 0);
            let lambda_f = tables.wavelength(sv, freq);
            if lambda_1 == 0.0 || lambda_f == 0.0 {
                continue;
            }
            let gamma = (lambda_f / lambda_1).powi(2);
            let c_iono = gamma * if phase { -1.0 } else { 1.0 };

            let mut h_row = DVector::<f64>::zeros(nx);
            for i in 0..3 {
                h_row[i] = -e[i];
            }
            h_row[ic] = 1.0;

            let mut model = r + x[ic] - Constants::SPEED_OF_LIGHT_M_S * state.clock_bias_s
                + dtrp
                + c_iono * dion;

            if let Some(it) = index.tropo() {
                for (i, partial) in dtdx.iter().take(index.num_tropo()).enumerate() {
                    h_row[it + i] = *partial;
                }
            }

            if cfg.iono == IonoModel::Estimate {
                if let Some(ii) = index.iono(prepared.slot) {
                    h_row[ii] = c_iono;
                }
            }

            if !phase && freq == 2 {
                if let Some(id) = index.dcb() {
                    model += x[id];
                    h_row[id] = 1.0;
                }
            }

            if phase {
                let Some(ib) = index.bias(prepared.slot, freq) else {
                    continue;
                };
                if x[ib] == 0.0 {
                    continue;
                }
                model += x[ib];
                h_row[ib] = 1.0;
            }

            let v = y - model;

            let snr = prepared
                .cd
                .observation(freq)
                .and_then(|obs| obs.snr_dbhz);
            let mut var = measurement_variance(cfg, sv.constellation, elevation, snr, freq, phase)
                + state.variance_m2
                + var_trp
                + gamma.powi(2) * var_ion;
            if !phase && sv.constellation == Constellation::Glonass {
                var += Constants::VAR_GLO_IFB;
            }

            let tracker = &mut trackers[prepared.slot];
            if post == 0 {
                if phase {
                    tracker.prefit_phase[freq] = v;
                } else {
                    tracker.prefit_code[freq] = v;
                }
            } else if phase {
                tracker.postfit_phase[freq] = v;
            } else {
                tracker.postfit_code[freq] = v;
            }

            // pre-fit innovation screening drops the whole satellite
            if cfg.max_innovation > 0.0 && v.abs() > cfg.max_innovation {
                warn!(
                    "{} ({}) innovation outlier: {:.3}m ({})",
                    t,
                    sv,
                    v,
                    if phase { "phase" } else { "code" }
                );
                prepared.excluded = true;
                if phase {
                    tracker.reject_phase += 1;
                } else {
                    tracker.reject_code += 1;
                }
                rows.retain(|row| row.pool_index != pool_index);
                break;
            }

            if post > 0 && phase {
                tracker.vsat[freq] = true;
            }

            debug!(
                "{} ({}) f={} {} v={:.4}m var={:.4}m²",
                t,
                sv,
                freq,
                if phase { "L" } else { "P" },
                v,
                var
            );

            rows.push(Row {
                v,
                h: h_row,
                var,
                pool_index,
                phase,
            });
        }
    }

    // post-fit screening: exclude the single worst outlier beyond 4σ
    let mut rejected = false;
    if post > 0 {
        let mut worst: Option<(usize, f64)> = None;
        for (i, row) in rows.iter().enumerate() {
            let ratio = row.v.abs() / row.var.sqrt();
            if ratio > Constants::THRES_REJECT {
                match worst {
                    Some((_, max_ratio)) if ratio <= max_ratio => {},
                    _ => worst = Some((i, ratio)),
                }
            }
        }
        if let Some((i, ratio)) = worst {
            let pool_index = rows[i].pool_index;
            let slot = pool[pool_index].slot;
            warn!(
                "{} ({}) post-fit outlier {:.1}σ: excluded",
                t, pool[pool_index].cd.sv, ratio
            );
            pool[pool_index].excluded = true;
            if rows[i].phase {
                trackers[slot].reject_phase += 1;
            } else {
                trackers[slot].reject_code += 1;
            }
            trackers[slot].vsat = [false; crate::constants::MAX_FREQ];
            rejected = true;
        }
    }

    let nv = rows.len();
    let mut v = DVector::<f64>::zeros(nv);
    let mut var = DVector::<f64>::zeros(nv);
    let mut h = DMatrix::<f64>::zeros(nv, nx);
    for (i, row) in rows.iter().enumerate() {
        v[i] = row.v;
        var[i] = row.var;
        h.set_row(i, &row.h.transpose());
    }

    Residuals {
        v,
        h,
        var,
        nv,
        rejected,
    }
}

/// Slant tropospheric delay [m], its variance and the partial
/// derivatives towards the estimated states.
fn tropo_delay(
    cfg: &Config,
    tables: &NavTables,
    index: &StateIndex,
    x: &DVector<f64>,
    geodetic: &Vector3<f64>,
    azimuth: f64,
    elevation: f64,
) -> (f64, f64, [f64; 3]) {
    match cfg.tropo {
        TropoModel::Off => (0.0, 0.0, [0.0; 3]),
        TropoModel::Saastamoinen | TropoModel::Sbas => {
            let (delay, var) = tropo_saastamoinen(geodetic, elevation);
            (delay, var, [0.0; 3])
        },
        TropoModel::Estimate | TropoModel::EstimateGradients => {
            let it = index.tropo().expect("troposphere state layout");
            let mut states = [0.0_f64; 3];
            for i in 0..index.num_tropo() {
                states[i] = x[it + i];
            }
            let (delay, dtdx) = tropo_estimated(&states[..index.num_tropo()], geodetic, azimuth, elevation);
            (delay, 0.0, dtdx)
        },
        TropoModel::Ztd => match tables.ztd {
            Some((ztd, var)) => {
                let m = mapping_function(elevation);
                (m * ztd, m.powi(2) * var, [0.0; 3])
            },
            None => {
                let (delay, var) = tropo_saastamoinen(geodetic, elevation);
                (delay, var, [0.0; 3])
            },
        },
    }
}

/// L1 referenced slant ionospheric delay [m] and variance. `None` drops
/// the satellite for this epoch (missing product or uninitialized state).
fn iono_delay(
    cfg: &Config,
    tables: &NavTables,
    index: &StateIndex,
    x: &DVector<f64>,
    prepared: &Prepared,
    t: Epoch,
    geodetic: &Vector3<f64>,
    azimuth: f64,
    elevation: f64,
) -> Option<(f64, f64)> {
    match cfg.iono {
        IonoModel::Off | IonoModel::IonoFree => Some((0.0, 0.0)),
        IonoModel::Klobuchar => {
            let params = tables.klobuchar?;
            let delay = iono_klobuchar(t, &params, geodetic, azimuth, elevation);
            Some((delay, (Constants::ERR_BRDCI * delay).powi(2)))
        },
        IonoModel::Estimate => {
            let ii = index.iono(prepared.slot)?;
            if x[ii] == 0.0 {
                None
            } else {
                Some((x[ii], 0.0))
            }
        },
        IonoModel::TecMap | IonoModel::Stec | IonoModel::Sbas => {
            tables.stec.get(&prepared.cd.sv).copied()
        },
    }
}

/// Elevation or SNR weighted measurement variance [m²].
fn measurement_variance(
    cfg: &Config,
    constellation: Constellation,
    elevation: f64,
    snr_dbhz: Option<f64>,
    freq: usize,
    phase: bool,
) -> f64 {
    let mut fact = cfg.error_factor(constellation);
    if !phase {
        fact *= cfg.code_phase_ratio[freq.min(2)];
    }

    let a = fact * cfg.error_terms[1];
    let b = fact * cfg.error_terms[2];

    let mut var = match cfg.error_model {
        ErrorModel::Elevation => {
            let sin_el = elevation.sin();
            a.powi(2) + b.powi(2) / (sin_el * sin_el)
        },
        ErrorModel::SnrWeighted => {
            let snr_max = cfg.error_terms[3];
            let snr = snr_dbhz.unwrap_or(snr_max);
            a.powi(2) * 10.0_f64.powf(0.1 * (snr_max - snr).max(0.0))
        },
    };

    if cfg.iono == IonoModel::IonoFree {
        var *= Constants::IFLC_VAR_FACTOR;
    }
    var
}
