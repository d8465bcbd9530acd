//! Estimator configuration

use gnss::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::constants::Constants;

/// Receiver motion profile
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum Profile {
    /// Receiver is moving: position is reinitialized every epoch,
    /// unless `dynamics` is turned on.
    Kinematic,
    /// Receiver is static: position is estimated with a small random walk.
    #[default]
    Static,
    /// Receiver position is known ground truth and pinned.
    Fixed,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Kinematic => write!(fmt, "kinematic"),
            Self::Static => write!(fmt, "static"),
            Self::Fixed => write!(fmt, "fixed"),
        }
    }
}

/// Ionospheric delay handling
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum IonoModel {
    /// No correction
    Off,
    /// Klobuchar model, using broadcast parameters
    Klobuchar,
    /// First order delay cancelled by the ionosphere free combination
    #[default]
    IonoFree,
    /// Per-satellite slant delay estimated as filter states
    Estimate,
    /// Slant delays interpolated from an external TEC product
    TecMap,
    /// Externally provided slant delays (SSR)
    Stec,
    /// SBAS broadcast grid
    Sbas,
}

/// Tropospheric delay handling
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum TropoModel {
    /// No correction
    Off,
    /// Saastamoinen model
    #[default]
    Saastamoinen,
    /// SBAS broadcast model
    Sbas,
    /// Zenith wet delay estimated as a filter state
    Estimate,
    /// Zenith wet delay and two horizontal gradients estimated
    EstimateGradients,
    /// Externally provided zenith total delay
    Ztd,
}

impl TropoModel {
    /// Number of tropospheric states
    pub(crate) fn num_states(&self) -> usize {
        match self {
            Self::Estimate => 1,
            Self::EstimateGradients => 3,
            _ => 0,
        }
    }
}

/// Ambiguity resolution strategy
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum ArMode {
    /// Ambiguities remain float
    #[default]
    Off,
    /// Continuous resolution over the tracking arc
    Continuous,
    /// Ambiguities reinitialized every epoch
    Instantaneous,
    /// Continuous resolution, fixed states folded back into the
    /// float filter after enough consecutive fixes
    FixAndHold,
}

/// Measurement error model
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum ErrorModel {
    /// a² + b²/sin²(elevation)
    #[default]
    Elevation,
    /// a² · 10^(0.1·max(snr_max − snr, 0))
    SnrWeighted,
}

/// Second frequency selection for the ionosphere free combination.
/// The source behavior distinguishes by constellation only; pinning
/// the pair is exposed for receivers that track unusual signal sets.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum SecondFrequency {
    /// Slot 1 for GPS/QZSS/Glonass, slot 2 for Galileo/SBAS/BDS
    #[default]
    Auto,
    /// Always combine slots (0, 1)
    Slot1,
}

impl SecondFrequency {
    /// Index of the second frequency slot for this constellation.
    pub(crate) fn slot(&self, constellation: Constellation) -> usize {
        match self {
            Self::Slot1 => 1,
            Self::Auto => match constellation {
                Constellation::Galileo | Constellation::SBAS | Constellation::BeiDou => 2,
                _ => 1,
            },
        }
    }
}

fn default_frequencies() -> usize {
    2
}

fn default_constellations() -> Vec<Constellation> {
    vec![Constellation::GPS]
}

fn default_elevation_mask_deg() -> f64 {
    10.0
}

fn default_process_noise() -> [f64; 6] {
    // ambiguity, iono, tropo, horizontal accel, vertical accel, static position
    [1.0E-4, 1.0E-3, 1.0E-4, 1.0E-1, 1.0E-2, 0.0]
}

fn default_error_terms() -> [f64; 5] {
    // reserved, a, b, snr(max), doppler
    [100.0, 0.003, 0.003, 52.0, 1.0]
}

fn default_eratio() -> [f64; 3] {
    [100.0, 100.0, 100.0]
}

fn default_max_outage() -> u32 {
    5
}

fn default_max_innovation() -> f64 {
    30.0
}

fn default_thres_slip() -> f64 {
    Constants::THRES_SLIP_GF
}

fn default_ar_ratio() -> f64 {
    3.0
}

fn default_min_fix_to_hold() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Receiver motion [Profile]
    #[cfg_attr(feature = "serde", serde(default))]
    pub profile: Profile,
    /// Estimate velocity and acceleration states (receiver dynamics)
    #[cfg_attr(feature = "serde", serde(default))]
    pub dynamics: bool,
    /// Number of frequency slots to process (1..=3)
    #[cfg_attr(feature = "serde", serde(default = "default_frequencies"))]
    pub frequencies: usize,
    /// Constellations to process. Order is significant: it fixes the
    /// per-system receiver clock state layout for the session.
    #[cfg_attr(feature = "serde", serde(default = "default_constellations"))]
    pub constellations: Vec<Constellation>,
    /// Ionospheric delay handling
    #[cfg_attr(feature = "serde", serde(default))]
    pub iono: IonoModel,
    /// Tropospheric delay handling
    #[cfg_attr(feature = "serde", serde(default))]
    pub tropo: TropoModel,
    /// Ambiguity resolution strategy
    #[cfg_attr(feature = "serde", serde(default))]
    pub ar_mode: ArMode,
    /// Second frequency selection for the iono-free combination
    #[cfg_attr(feature = "serde", serde(default))]
    pub second_frequency: SecondFrequency,
    /// Process noise stds: [ambiguity m/√s, iono m/√s, tropo m/√s,
    /// horizontal accel m/s²/√s, vertical accel m/s²/√s, static position m/√s]
    #[cfg_attr(feature = "serde", serde(default = "default_process_noise"))]
    pub process_noise: [f64; 6],
    /// Measurement error terms: [reserved, a m, b m, snr max dB-Hz, doppler]
    #[cfg_attr(feature = "serde", serde(default = "default_error_terms"))]
    pub error_terms: [f64; 5],
    /// Code/phase error std ratio per frequency slot
    #[cfg_attr(feature = "serde", serde(default = "default_eratio"))]
    pub code_phase_ratio: [f64; 3],
    /// Measurement error model
    #[cfg_attr(feature = "serde", serde(default))]
    pub error_model: ErrorModel,
    /// Minimal elevation angle [°]. SV below that angle will not be considered.
    #[cfg_attr(feature = "serde", serde(default = "default_elevation_mask_deg"))]
    pub min_sv_elev: f64,
    /// Minimal SNR [dB-Hz] for a signal to be considered.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_snr: Option<f64>,
    /// Maximal tracking outage [epochs] before an ambiguity is reset
    #[cfg_attr(feature = "serde", serde(default = "default_max_outage"))]
    pub max_outage: u32,
    /// Maximal pre-fit innovation [m], 0 disables the check
    #[cfg_attr(feature = "serde", serde(default = "default_max_innovation"))]
    pub max_innovation: f64,
    /// Geometry-free cycle slip threshold [m]
    #[cfg_attr(feature = "serde", serde(default = "default_thres_slip"))]
    pub thres_slip: f64,
    /// Minimal ambiguity search ratio to accept a fix
    #[cfg_attr(feature = "serde", serde(default = "default_ar_ratio"))]
    pub ar_ratio: f64,
    /// Consecutive fixes required before holding (fix-and-hold)
    #[cfg_attr(feature = "serde", serde(default = "default_min_fix_to_hold"))]
    pub min_fix_to_hold: u32,
    /// Satellites excluded by the user
    #[cfg_attr(feature = "serde", serde(default))]
    pub excluded: Vec<SV>,
    /// Positioning options: [satellite PCV, receiver PCV, phase windup,
    /// eclipse exclusion, reserved, reserved]
    #[cfg_attr(feature = "serde", serde(default))]
    pub posopt: [bool; 6],
    /// Ground truth ECEF position [m], pinned in [Profile::Fixed]
    #[cfg_attr(feature = "serde", serde(default))]
    pub ground_truth: Option<(f64, f64, f64)>,
    /// Free-form sub-options, e.g. `-GAP_RESION=300`
    #[cfg_attr(feature = "serde", serde(default))]
    pub ppp_options: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(Profile::Static)
    }
}

impl Config {
    /// Configuration preset for a motion [Profile], dual frequency
    /// iono-free processing on GPS.
    pub fn preset(profile: Profile) -> Self {
        Self {
            profile,
            dynamics: false,
            frequencies: default_frequencies(),
            constellations: default_constellations(),
            iono: IonoModel::default(),
            tropo: TropoModel::default(),
            ar_mode: ArMode::default(),
            second_frequency: SecondFrequency::default(),
            process_noise: default_process_noise(),
            error_terms: default_error_terms(),
            code_phase_ratio: default_eratio(),
            error_model: ErrorModel::default(),
            min_sv_elev: default_elevation_mask_deg(),
            min_snr: None,
            max_outage: default_max_outage(),
            max_innovation: default_max_innovation(),
            thres_slip: default_thres_slip(),
            ar_ratio: default_ar_ratio(),
            min_fix_to_hold: default_min_fix_to_hold(),
            excluded: vec![],
            posopt: [false; 6],
            ground_truth: None,
            ppp_options: String::new(),
        }
    }

    /// Number of ambiguity states per satellite.
    pub(crate) fn num_amb_frequencies(&self) -> usize {
        if self.iono == IonoModel::IonoFree {
            1
        } else {
            self.frequencies
        }
    }

    /// True if the third frequency receiver DCB is estimated.
    pub(crate) fn estimates_dcb(&self) -> bool {
        self.frequencies >= 3
    }

    /// Ionosphere reset gap [epochs], possibly overriden by the
    /// `-GAP_RESION=NNN` sub-option.
    pub(crate) fn gap_resion(&self) -> u32 {
        for opt in self.ppp_options.split_whitespace() {
            if let Some(value) = opt.strip_prefix("-GAP_RESION=") {
                if let Ok(parsed) = value.parse::<u32>() {
                    return parsed;
                }
            }
        }
        Constants::GAP_RESION
    }

    /// Measurement error factor of this constellation.
    pub(crate) fn error_factor(&self, constellation: Constellation) -> f64 {
        match constellation {
            Constellation::Glonass => Constants::EFACT_GLO,
            Constellation::SBAS => Constants::EFACT_SBS,
            _ => 1.0,
        }
    }
}
