//! Filter state layout
//!
//! The parameter vector is heterogeneous and its layout is fixed at
//! session start: position (velocity, acceleration), one receiver clock
//! per constellation, troposphere, per satellite ionosphere, receiver
//! DCB, then per satellite per frequency carrier phase biases. The
//! block ordering is normative: time update loops and status consumers
//! rely on contiguous blocks.

use gnss::prelude::Constellation;

use crate::{
    cfg::{Config, IonoModel},
    constants::MAX_SAT,
};

/// Semantic state parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param {
    /// Position component (0..3)
    Position(usize),
    /// Velocity component (0..3), dynamics only
    Velocity(usize),
    /// Acceleration component (0..3), dynamics only
    Acceleration(usize),
    /// Receiver clock bias of this constellation [m]
    Clock(Constellation),
    /// Zenith wet tropospheric delay [m]
    TropoWet,
    /// Tropospheric gradient, 0 north 1 east
    TropoGradient(usize),
    /// Slant ionospheric delay of this satellite slot [m]
    Iono(usize),
    /// Third frequency receiver code bias [m]
    Dcb,
    /// Carrier phase bias of (satellite slot, frequency) [m]
    Bias(usize, usize),
}

/// Deterministic parameter to flat index mapping, pure function of the
/// session [Config].
#[derive(Debug, Clone)]
pub(crate) struct StateIndex {
    dynamics: bool,
    systems: Vec<Constellation>,
    tropo_states: usize,
    iono_states: bool,
    dcb_state: bool,
    amb_frequencies: usize,
}

impl StateIndex {
    pub fn new(cfg: &Config) -> Self {
        Self {
            dynamics: cfg.dynamics,
            systems: cfg.constellations.clone(),
            tropo_states: cfg.tropo.num_states(),
            iono_states: cfg.iono == IonoModel::Estimate,
            dcb_state: cfg.estimates_dcb(),
            amb_frequencies: cfg.num_amb_frequencies(),
        }
    }

    /// Position/velocity/acceleration block length
    pub fn np(&self) -> usize {
        if self.dynamics {
            9
        } else {
            3
        }
    }

    pub fn num_systems(&self) -> usize {
        self.systems.len()
    }

    pub fn systems(&self) -> &[Constellation] {
        &self.systems
    }

    pub fn num_tropo(&self) -> usize {
        self.tropo_states
    }

    pub fn amb_frequencies(&self) -> usize {
        self.amb_frequencies
    }

    fn num_iono(&self) -> usize {
        if self.iono_states {
            MAX_SAT
        } else {
            0
        }
    }

    fn num_dcb(&self) -> usize {
        self.dcb_state as usize
    }

    /// Total state vector length
    pub fn size(&self) -> usize {
        self.np()
            + self.num_systems()
            + self.tropo_states
            + self.num_iono()
            + self.num_dcb()
            + self.amb_frequencies * MAX_SAT
    }

    pub fn position(&self) -> usize {
        0
    }

    pub fn velocity(&self) -> Option<usize> {
        self.dynamics.then_some(3)
    }

    pub fn acceleration(&self) -> Option<usize> {
        self.dynamics.then_some(6)
    }

    pub fn clock(&self, constellation: Constellation) -> Option<usize> {
        self.systems
            .iter()
            .position(|c| *c == constellation)
            .map(|i| self.np() + i)
    }

    pub fn tropo(&self) -> Option<usize> {
        (self.tropo_states > 0).then(|| self.np() + self.num_systems())
    }

    pub fn iono(&self, slot: usize) -> Option<usize> {
        if !self.iono_states || slot >= MAX_SAT {
            return None;
        }
        Some(self.np() + self.num_systems() + self.tropo_states + slot)
    }

    pub fn dcb(&self) -> Option<usize> {
        self.dcb_state
            .then(|| self.np() + self.num_systems() + self.tropo_states + self.num_iono())
    }

    pub fn bias(&self, slot: usize, freq: usize) -> Option<usize> {
        if slot >= MAX_SAT || freq >= self.amb_frequencies {
            return None;
        }
        Some(
            self.np()
                + self.num_systems()
                + self.tropo_states
                + self.num_iono()
                + self.num_dcb()
                + freq * MAX_SAT
                + slot,
        )
    }

    /// Flat index of any [Param], `None` when the parameter is not part
    /// of this session's layout.
    pub fn of(&self, param: Param) -> Option<usize> {
        match param {
            Param::Position(i) => (i < 3).then_some(i),
            Param::Velocity(i) => self.velocity().and_then(|v| (i < 3).then(|| v + i)),
            Param::Acceleration(i) => self.acceleration().and_then(|a| (i < 3).then(|| a + i)),
            Param::Clock(c) => self.clock(c),
            Param::TropoWet => self.tropo(),
            Param::TropoGradient(i) => {
                if self.tropo_states < 3 || i >= 2 {
                    None
                } else {
                    self.tropo().map(|t| t + 1 + i)
                }
            },
            Param::Iono(slot) => self.iono(slot),
            Param::Dcb => self.dcb(),
            Param::Bias(slot, freq) => self.bias(slot, freq),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Param, StateIndex};
    use crate::cfg::{Config, IonoModel, Profile, TropoModel};
    use gnss::prelude::Constellation;

    #[test]
    fn iflc_layout() {
        let mut cfg = Config::preset(Profile::Static);
        cfg.constellations = vec![Constellation::GPS, Constellation::Galileo];
        cfg.tropo = TropoModel::EstimateGradients;
        cfg.iono = IonoModel::IonoFree;
        let index = StateIndex::new(&cfg);

        assert_eq!(index.position(), 0);
        assert_eq!(index.clock(Constellation::GPS), Some(3));
        assert_eq!(index.clock(Constellation::Galileo), Some(4));
        assert_eq!(index.clock(Constellation::BeiDou), None);
        assert_eq!(index.tropo(), Some(5));
        assert_eq!(index.of(Param::TropoGradient(1)), Some(7));
        assert_eq!(index.iono(0), None);
        assert_eq!(index.dcb(), None);
        // single combined ambiguity per satellite
        assert_eq!(index.bias(0, 0), Some(8));
        assert_eq!(index.bias(0, 1), None);
        assert_eq!(index.size(), 8 + crate::constants::MAX_SAT);
    }

    #[test]
    fn uncombined_three_frequency_layout() {
        let mut cfg = Config::preset(Profile::Static);
        cfg.frequencies = 3;
        cfg.iono = IonoModel::Estimate;
        cfg.tropo = TropoModel::Estimate;
        cfg.dynamics = true;
        let index = StateIndex::new(&cfg);
        let maxsat = crate::constants::MAX_SAT;

        assert_eq!(index.velocity(), Some(3));
        assert_eq!(index.acceleration(), Some(6));
        assert_eq!(index.clock(Constellation::GPS), Some(9));
        assert_eq!(index.tropo(), Some(10));
        assert_eq!(index.iono(0), Some(11));
        assert_eq!(index.dcb(), Some(11 + maxsat));
        assert_eq!(index.bias(0, 0), Some(12 + maxsat));
        assert_eq!(index.bias(5, 2), Some(12 + maxsat + 2 * maxsat + 5));
        assert_eq!(index.size(), 12 + maxsat + 3 * maxsat);
    }
}
