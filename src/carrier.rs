use crate::constants::Constants;
use gnss::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Carrier {
    /// L1 (GPS/QZSS/SBAS) same frequency as E1 and B1aB1c
    #[default]
    L1,
    /// L2 (GPS/QZSS)
    L2,
    /// L5 (GPS/QZSS/SBAS) same frequency as E5A and B2A
    L5,
    /// E1 (Galileo)
    E1,
    /// E5A (Galileo) same frequency as L5
    E5A,
    /// E5B (Galileo) same frequency as B2iB2b
    E5B,
    /// B1I (BDS)
    B1I,
    /// B2I/B2B (BDS) same frequency as E5b
    B2iB2b,
    /// B3 (BDS)
    B3,
    /// G1 (Glonass) FDMA center frequency
    G1,
    /// G2 (Glonass) FDMA center frequency
    G2,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::L5 => write!(f, "L5"),
            Self::E1 => write!(f, "E1"),
            Self::E5A => write!(f, "E5A"),
            Self::E5B => write!(f, "E5B"),
            Self::B1I => write!(f, "B1I"),
            Self::B2iB2b => write!(f, "B2I/B2B"),
            Self::B3 => write!(f, "B3"),
            Self::G1 => write!(f, "G1"),
            Self::G2 => write!(f, "G2"),
        }
    }
}

impl Carrier {
    pub fn frequency(&self) -> f64 {
        match self {
            Self::L1 | Self::E1 => 1575.42E6_f64,
            Self::L2 => 1227.60E6_f64,
            Self::L5 | Self::E5A => 1176.45E6_f64,
            Self::E5B | Self::B2iB2b => 1207.14E6_f64,
            Self::B1I => 1561.098E6_f64,
            Self::B3 => 1268.52E6_f64,
            Self::G1 => 1602.0E6_f64,
            Self::G2 => 1246.0E6_f64,
        }
    }

    pub fn wavelength(&self) -> f64 {
        Constants::SPEED_OF_LIGHT_M_S / self.frequency()
    }

    /// Carrier attached to a frequency slot of this [Constellation].
    /// Slot 0 is the L1 class, slot 1 the secondary frequency, slot 2 the
    /// L5 class. The B1I/B3/B2I ordering encodes the BDS pairing, the
    /// E1/E5B/E5A ordering the Galileo one: in both cases the L1/L5-class
    /// pair sits on slots (0, 2).
    pub fn from_slot(constellation: Constellation, slot: usize) -> Option<Self> {
        match (constellation, slot) {
            (Constellation::GPS | Constellation::QZSS, 0) => Some(Self::L1),
            (Constellation::GPS | Constellation::QZSS, 1) => Some(Self::L2),
            (Constellation::GPS | Constellation::QZSS, 2) => Some(Self::L5),
            (Constellation::Glonass, 0) => Some(Self::G1),
            (Constellation::Glonass, 1) => Some(Self::G2),
            (Constellation::Galileo, 0) => Some(Self::E1),
            (Constellation::Galileo, 1) => Some(Self::E5B),
            (Constellation::Galileo, 2) => Some(Self::E5A),
            (Constellation::BeiDou, 0) => Some(Self::B1I),
            (Constellation::BeiDou, 1) => Some(Self::B3),
            (Constellation::BeiDou, 2) => Some(Self::B2iB2b),
            (Constellation::SBAS, 0) => Some(Self::L1),
            (Constellation::SBAS, 2) => Some(Self::L5),
            _ => None,
        }
    }

    /// Frequency slot this carrier occupies for this [Constellation].
    pub fn slot(&self, constellation: Constellation) -> Option<usize> {
        (0..crate::constants::MAX_FREQ)
            .find(|slot| Self::from_slot(constellation, *slot) == Some(*self))
    }
}
