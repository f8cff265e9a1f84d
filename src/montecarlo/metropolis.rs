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

//! Generic Metropolis-Hastings sampler

use super::{AcceptanceCriterion, MoveStatistics, NewOld};
use average::{Estimate, Mean};
use derive_more::Debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Problem specific part of a Markov chain: how to propose and how to score states.
pub trait Sampler {
    type State: Clone;

    /// Propose a candidate from the current state, or `None` if no valid candidate could be made.
    ///
    /// The proposal must be symmetric.
    fn generate(&mut self, rng: &mut StdRng, state: &Self::State) -> Option<Self::State>;

    /// Energy or probability density of a state, depending on the acceptance criterion.
    fn score(&self, state: &Self::State) -> f64;
}

/// Outcome of a single Metropolis-Hastings step
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Candidate accepted with the given score change
    Accepted(f64),
    /// Candidate rejected by the acceptance criterion
    Rejected,
    /// No valid candidate could be generated
    Invalid,
}

impl Outcome {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

/// # Markov chain driven by the Metropolis-Hastings algorithm
///
/// Holds the current state and its score. Each [`MetropolisHastings::step`]
/// asks the [`Sampler`] for a candidate, scores it, and accepts or rejects it
/// according to the [`AcceptanceCriterion`]. A missing candidate counts as a
/// rejected trial.
#[derive(Debug)]
pub struct MetropolisHastings<S: Sampler> {
    #[debug(skip)]
    sampler: S,
    criterion: AcceptanceCriterion,
    #[debug(skip)]
    state: S::State,
    score: f64,
    statistics: MoveStatistics,
    /// Running average of the score after each step
    #[debug(skip)]
    mean_score: Mean,
    #[debug(skip)]
    rng: StdRng,
}

impl<S: Sampler> MetropolisHastings<S> {
    /// Start a chain in `state` using a random number generator seeded with `seed`.
    pub fn new(sampler: S, criterion: AcceptanceCriterion, state: S::State, seed: u64) -> Self {
        let score = sampler.score(&state);
        Self::with_score(sampler, criterion, state, score, StdRng::seed_from_u64(seed))
    }

    /// Start a chain in `state` with a known score and an existing random number generator.
    pub fn with_score(
        sampler: S,
        criterion: AcceptanceCriterion,
        state: S::State,
        score: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            sampler,
            criterion,
            state,
            score,
            statistics: MoveStatistics::default(),
            mean_score: Mean::new(),
            rng,
        }
    }

    /// Perform a single trial move.
    pub fn step(&mut self) -> Outcome {
        let outcome = match self.sampler.generate(&mut self.rng, &self.state) {
            None => {
                self.statistics.reject();
                Outcome::Invalid
            }
            Some(candidate) => {
                let score = NewOld::from(self.sampler.score(&candidate), self.score);
                if self.criterion.accept(score, &mut self.rng) {
                    self.statistics.accept(score.difference());
                    self.state = candidate;
                    self.score = score.new;
                    Outcome::Accepted(score.difference())
                } else {
                    self.statistics.reject();
                    Outcome::Rejected
                }
            }
        };
        self.mean_score.add(self.score);
        outcome
    }

    /// Perform `n` trial moves and return the number of accepted moves.
    pub fn run(&mut self, n: usize) -> usize {
        (0..n).filter(|_| self.step().is_accepted()).count()
    }

    pub const fn state(&self) -> &S::State {
        &self.state
    }

    pub const fn score(&self) -> f64 {
        self.score
    }

    pub const fn criterion(&self) -> &AcceptanceCriterion {
        &self.criterion
    }

    pub const fn statistics(&self) -> &MoveStatistics {
        &self.statistics
    }

    /// Fraction of accepted trials; zero if nothing has been tried.
    pub fn acceptance_ratio(&self) -> f64 {
        self.statistics.acceptance_ratio()
    }

    /// Average score over all steps taken.
    pub fn mean_score(&self) -> f64 {
        self.mean_score.mean()
    }

    pub const fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Replace the current state and its score, keeping the statistics.
    pub fn replace_state(&mut self, state: S::State, score: f64) {
        self.state = state;
        self.score = score;
    }

    /// Exchange states and scores with another chain.
    pub fn swap_state(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.state, &mut other.state);
        std::mem::swap(&mut self.score, &mut other.score);
    }
}
