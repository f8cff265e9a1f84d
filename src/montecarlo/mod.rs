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

//! # Support for Monte Carlo sampling
//!
//! Chain moves, acceptance criteria and the generic Metropolis-Hastings engine.
//! Every move works on a copy of the chain; a move that leads to overlapping
//! beads is discarded and leaves the original untouched.

use crate::Chain;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

mod end;
mod metropolis;
mod pivot;
mod shift;
mod spike;

pub use end::ChainEnd;
pub use metropolis::{MetropolisHastings, Outcome, Sampler};

/// Named helper struct to handle `new`, `old` pairs.
///
/// Used e.g. for data before and after a Monte Carlo move
/// and reduces risk mixing up the order or old and new values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOld<T> {
    pub new: T,
    pub old: T,
}

impl<T> NewOld<T> {
    pub fn from(new: T, old: T) -> Self {
        Self { new, old }
    }
}

impl NewOld<f64> {
    /// Difference `new - old`
    pub fn difference(&self) -> f64 {
        self.new - self.old
    }
}

impl Copy for NewOld<f64> {}

/// # Helper class to keep track of accepted and rejected moves
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveStatistics {
    /// Number of trial moves
    pub num_trials: usize,
    /// Number of accepted moves
    pub num_accepted: usize,
    /// Sum of energy changes due to this move
    pub energy_change_sum: f64,
}

impl MoveStatistics {
    /// Register an accepted move and increment counters
    pub fn accept(&mut self, energy_change: f64) {
        self.num_trials += 1;
        self.num_accepted += 1;
        self.energy_change_sum += energy_change;
    }

    /// Register a rejected move and increment counters
    pub fn reject(&mut self) {
        self.num_trials += 1;
    }

    /// Acceptance ratio; zero if no moves have been tried.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.num_trials == 0 {
            return 0.0;
        }
        self.num_accepted as f64 / self.num_trials as f64
    }
}

/// All possible acceptance criteria for Monte Carlo moves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Copy)]
pub enum AcceptanceCriterion {
    /// The score is a positive, unnormalized probability density, π.
    /// Candidates are accepted with probability `min(1, π(new) / π(old))`.
    Density,
    /// The score is an energy in units of the temperature.
    /// Candidates are accepted with probability `min(1, exp(-ΔU / T))`
    /// More information: <https://en.wikipedia.org/wiki/Metropolis%E2%80%93Hastings_algorithm>
    #[serde(alias = "Metropolis")]
    Boltzmann { temperature: f64 },
}

impl AcceptanceCriterion {
    /// Probability of accepting the transition from `score.old` to `score.new`.
    pub fn probability(&self, score: NewOld<f64>) -> f64 {
        match self {
            AcceptanceCriterion::Density => f64::min(1.0, score.new / score.old),
            AcceptanceCriterion::Boltzmann { temperature } => {
                let du = score.difference();
                if du <= 0.0 {
                    return 1.0;
                }
                f64::min(1.0, f64::exp(-du / temperature))
            }
        }
    }

    /// Draw a random number and decide whether to accept the transition.
    pub fn accept(&self, score: NewOld<f64>, rng: &mut impl Rng) -> bool {
        rng.gen::<f64>() < self.probability(score)
    }

    /// Temperature of the Boltzmann criterion; `None` for densities.
    pub fn temperature(&self) -> Option<f64> {
        match self {
            AcceptanceCriterion::Boltzmann { temperature } => Some(*temperature),
            AcceptanceCriterion::Density => None,
        }
    }
}

/// Frequency of a Monte Carlo move or a measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Every `n` steps
    Every(usize),
    /// Once at step `n`
    Once(usize),
}

impl Frequency {
    /// Check if action, typically an analysis, should be performed at given step
    pub fn should_perform(&self, step: usize) -> bool {
        match self {
            Frequency::Every(n) => *n > 0 && step % n == 0,
            Frequency::Once(n) => step == *n,
        }
    }
}

/// Monte Carlo moves of a bead chain.
///
/// All moves are rigid rotations (or translations) of a part of the chain
/// and preserve every bond length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainMove {
    /// Rotate the first bead around the second.
    EndFirst,
    /// Rotate the last bead around the second last.
    EndLast,
    /// Rotate bead `k+1` around bead `k` and translate the rest of the chain along.
    Shift(usize),
    /// Rotate bead `k+1` around the axis through beads `k` and `k+2`.
    Spike(usize),
    /// Rotate beads `k+1..` around the z-axis through bead `k`.
    Pivot(usize),
}

impl ChainMove {
    /// Move that displaces bead `bead` of a chain with `num_beads` beads.
    ///
    /// The chain ends are moved by end moves; inner beads by a random choice
    /// of shift, spike, or pivot moves.
    pub fn natural(bead: usize, num_beads: usize, rng: &mut impl Rng) -> anyhow::Result<Self> {
        if bead >= num_beads {
            anyhow::bail!("Bead {} is outside chain of {} beads", bead, num_beads);
        }
        let movement = match bead {
            0 => ChainMove::EndFirst,
            b if b == num_beads - 1 => ChainMove::EndLast,
            b => match rng.gen_range(0..3) {
                0 => ChainMove::Shift(b - 1),
                1 => ChainMove::Spike(b - 1),
                _ => ChainMove::Pivot(b - 1),
            },
        };
        Ok(movement)
    }

    /// Check that the move is possible for a chain with `num_beads` beads.
    pub fn validate(&self, num_beads: usize) -> anyhow::Result<()> {
        let valid = match *self {
            ChainMove::EndFirst | ChainMove::EndLast => true,
            ChainMove::Shift(k) | ChainMove::Pivot(k) => k + 2 <= num_beads,
            ChainMove::Spike(k) => k + 3 <= num_beads,
        };
        if !valid {
            anyhow::bail!("{} is not possible for a chain of {} beads", self, num_beads);
        }
        Ok(())
    }

    /// Apply the move to a copy of `chain`.
    ///
    /// Returns `None` if the new conformation has overlapping beads or if the
    /// move is geometrically undefined.
    pub fn propose(&self, chain: &Chain, rng: &mut impl Rng) -> anyhow::Result<Option<Chain>> {
        self.validate(chain.len())?;
        let candidate = match *self {
            ChainMove::EndFirst => end::propose(chain, ChainEnd::First, rng),
            ChainMove::EndLast => end::propose(chain, ChainEnd::Last, rng),
            ChainMove::Shift(k) => shift::propose(chain, k, rng),
            ChainMove::Spike(k) => spike::propose(chain, k, rng),
            ChainMove::Pivot(k) => pivot::propose(chain, k, rng),
        };
        if candidate.is_none() {
            log::trace!("{} rejected", self);
        }
        Ok(candidate)
    }

    /// Perform the move in place. Returns `false` and leaves `chain` untouched on rejection.
    pub fn perform(&self, chain: &mut Chain, rng: &mut impl Rng) -> anyhow::Result<bool> {
        match self.propose(chain, rng)? {
            Some(candidate) => {
                *chain = candidate;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Display for ChainMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainMove::EndFirst => write!(f, "end move of the first bead"),
            ChainMove::EndLast => write!(f, "end move of the last bead"),
            ChainMove::Shift(k) => write!(f, "shift move at bead {k}"),
            ChainMove::Spike(k) => write!(f, "spike move at bead {k}"),
            ChainMove::Pivot(k) => write!(f, "pivot move at bead {k}"),
        }
    }
}

impl crate::Info for ChainMove {
    fn short_name(&self) -> Option<&'static str> {
        match self {
            ChainMove::EndFirst | ChainMove::EndLast => Some("end"),
            ChainMove::Shift(_) => Some("shift"),
            ChainMove::Spike(_) => Some("spike"),
            ChainMove::Pivot(_) => Some("pivot"),
        }
    }
    fn long_name(&self) -> Option<&'static str> {
        match self {
            ChainMove::EndFirst | ChainMove::EndLast => Some("Rotation of a terminal bead"),
            ChainMove::Shift(_) => Some("Rotation of a bond with translation of the tail"),
            ChainMove::Spike(_) => Some("Crankshaft rotation of a single bead"),
            ChainMove::Pivot(_) => Some("Pivot rotation of the chain tail"),
        }
    }
}

/// Randomize a chain by `10 N` sweeps of natural moves over all `N` beads.
pub fn scramble(chain: &mut Chain, rng: &mut impl Rng) -> anyhow::Result<()> {
    let n = chain.len();
    let mut num_accepted = 0;
    for _ in 0..10 * n {
        for bead in 0..n {
            if ChainMove::natural(bead, n, rng)?.perform(chain, rng)? {
                num_accepted += 1;
            }
        }
    }
    log::debug!(
        "Scrambled chain of {} beads; {} of {} moves accepted",
        n,
        num_accepted,
        10 * n * n
    );
    Ok(())
}

/// Largest relative change of any bond length between two chains.
#[cfg(test)]
pub(crate) fn max_bond_change(before: &Chain, after: &Chain) -> f64 {
    before
        .bond_lengths()
        .iter()
        .zip(after.bond_lengths())
        .map(|(old, new)| ((new - old) / old).abs())
        .fold(0.0, f64::max)
}
