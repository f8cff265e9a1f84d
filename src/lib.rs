// Copyright 2023 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! # Coarse-grained Monte Carlo folding of bead chains
//!
//! A protein backbone is reduced to one bead per residue (the alpha carbon).
//! Chains are driven towards a native structure by a Metropolis-Hastings sampler
//! scoring a square-well potential over the native contacts, optionally coupled
//! across temperatures by replica exchange.

use nalgebra::Vector3;

pub type Point = Vector3<f64>;
pub type PositionVec = Vec<Point>;

pub mod analysis;
pub mod bitset;
pub mod chain;
pub mod cli;
pub mod config;
pub mod contact_map;
pub mod energy;
pub mod io;
pub mod montecarlo;
pub mod plot;
pub mod replica;
pub mod simulation;
pub mod state;
pub mod transform;

pub use bitset::BitSet;
pub use chain::Chain;
pub use contact_map::ContactMap;
pub use energy::NativePotential;
pub use replica::ReplicaExchange;
pub use simulation::Simulation;

/// Descriptive names for moves, analyses and other concepts
pub trait Info {
    /// Returns a short name for the concept. Use `_` for spaces and avoid weird characters.
    /// This is typically used as keywords in user input and output, e.g. in YAML files.
    fn short_name(&self) -> Option<&'static str> {
        None
    }
    /// Returns a long name for the concept. Spaces are allowed.
    fn long_name(&self) -> Option<&'static str> {
        None
    }
    /// Returns a citation string which should be a
    /// 1. Digital Object Identifier (DOI) in the format `doi:...` (preferred)
    /// 2. URL in the format `https://...`
    fn citation(&self) -> Option<&'static str> {
        None
    }
}

/// A trait for objects that have a temperature
///
/// Temperatures are in reduced units, i.e. in the same unit as the potential energy.
pub trait Temperature {
    /// Get the temperature
    fn temperature(&self) -> f64;
    /// Inverse temperature, β = 1/T
    fn beta(&self) -> f64 {
        self.temperature().recip()
    }
}
