#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod ambiguity;
mod attitude;
mod bias;
mod candidate;
mod carrier;
mod cfg;
mod error;
mod navigation;
mod position;
mod products;
mod slip;
mod solution;
mod solver;
mod tracker;

pub(crate) mod constants;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::ambiguity::AmbiguityResolver;
    pub use crate::candidate::{Candidate, CodeClass, Observation, SvState};
    pub use crate::carrier::Carrier;
    pub use crate::cfg::{
        ArMode, Config, ErrorModel, IonoModel, Profile, SecondFrequency, TropoModel,
    };
    pub use crate::constants::Constants;
    pub use crate::error::Error;
    pub use crate::navigation::Param;
    pub use crate::position::AprioriPosition;
    pub use crate::products::{Antenna, CodeBiases, NavTables, PcvTable};
    pub use crate::solution::{SatDiagnostics, Solution, SolutionStatus};
    pub use crate::solver::{EpochContext, Solver};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}
