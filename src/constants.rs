//! Physical and estimator constants

/// Estimator constants, shared by the state machine and the measurement models.
pub struct Constants;

impl Constants {
    /// Speed of light [m/s]
    pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

    /// Earth rotation rate (WGS84) [rad/s]
    pub const EARTH_OMEGA_E_WGS84: f64 = 7.2921151467E-5;

    /// Mean Earth radius [m], shadow cylinder test
    pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

    /// Initial position variance [m²]
    pub const VAR_POS: f64 = 60.0 * 60.0;

    /// Initial velocity variance [m²/s²]
    pub const VAR_VEL: f64 = 10.0 * 10.0;

    /// Initial acceleration variance [m²/s⁴]
    pub const VAR_ACC: f64 = 10.0 * 10.0;

    /// Receiver clock variance (reset every epoch) [m²]
    pub const VAR_CLK: f64 = 60.0 * 60.0;

    /// Initial zenith tropospheric delay variance [m²]
    pub const VAR_ZTD: f64 = 0.6 * 0.6;

    /// Initial tropospheric gradient variance [m²]
    pub const VAR_GRA: f64 = 0.01 * 0.01;

    /// Initial receiver DCB variance [m²]
    pub const VAR_DCB: f64 = 30.0 * 30.0;

    /// Initial carrier phase bias variance [m²]
    pub const VAR_BIAS: f64 = 60.0 * 60.0;

    /// Initial slant ionospheric delay variance [m²]
    pub const VAR_IONO: f64 = 60.0 * 60.0;

    /// GLONASS inter-frequency code bias variance [m²]
    pub const VAR_GLO_IFB: f64 = 0.6 * 0.6;

    /// Saastamoinen model error std [m]
    pub const ERR_SAAS: f64 = 0.3;

    /// Broadcast ionosphere model error ratio
    pub const ERR_BRDCI: f64 = 0.5;

    /// Code bias error std [m]
    pub const ERR_CBIAS: f64 = 0.3;

    /// Relative humidity for the Saastamoinen model
    pub const REL_HUMI: f64 = 0.7;

    /// Ionosphere reset gap [epochs], unless overriden by `-GAP_RESION`
    pub const GAP_RESION: u32 = 120;

    /// Maximal number of filter iterations per epoch
    pub const MAX_ITER: usize = 8;

    /// Post-fit residual rejection threshold [σ]
    pub const THRES_REJECT: f64 = 4.0;

    /// Geometry-free slip default threshold [m]
    pub const THRES_SLIP_GF: f64 = 0.05;

    /// Melbourne-Wübbena instantaneous gap limit [m]
    pub const MW_GAP_MAX: f64 = 10.0;

    /// Melbourne-Wübbena minimal detection threshold [m]
    pub const MW_CS_MIN: f64 = 0.8;

    /// Melbourne-Wübbena running statistics saturation [epochs]
    pub const MW_ARC_MAX: u32 = 100;

    /// Minimal number of valid SV to form a solution
    pub const MIN_NSAT_SOL: usize = 4;

    /// Maximal 3D position std to accept a fixed solution [m]
    pub const MAX_STD_FIX: f64 = 0.15;

    /// GLONASS measurement error factor
    pub const EFACT_GLO: f64 = 1.5;

    /// SBAS measurement error factor
    pub const EFACT_SBS: f64 = 3.0;

    /// Phase/code coherency jump threshold [s]
    pub const CLOCK_JUMP_THRESHOLD_S: f64 = 0.0005;

    /// Ionosphere-free combination variance inflation
    pub const IFLC_VAR_FACTOR: f64 = 9.0;

    /// Elevation clamp used by the ionosphere process noise [rad]
    pub const MIN_EL_IONO_RAD: f64 = 5.0_f64 * std::f64::consts::PI / 180.0;
}

/// One tracker slot per possible satellite identity.
pub(crate) const MAX_SAT: usize = 189;

/// Supported frequency slots per constellation.
pub(crate) const MAX_FREQ: usize = 3;
