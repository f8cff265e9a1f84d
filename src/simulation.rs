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

//! # Folding simulation at a single temperature
//!
//! A [`Simulation`] couples a working chain to a shared [`ContactMap`] and
//! samples conformations with Metropolis-Hastings at a fixed temperature.
//! Trial moves cycle deterministically through the beads, each bead being
//! displaced by its natural move.

use crate::analysis::{
    output_file, AnalysisCollection, Analyze, EnergyWriter, Observable, OutputKind, StructureWriter,
};
use crate::montecarlo::{
    self, AcceptanceCriterion, ChainMove, Frequency, MetropolisHastings, MoveStatistics, Outcome,
    Sampler,
};
use crate::{Chain, ContactMap, Info, NativePotential, Temperature};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Largest energy difference to the reference for a folded chain
pub const CONVERGENCE_TOLERANCE: f64 = 1e-3;

/// Proposes natural moves bead by bead and scores chains by the native potential
#[derive(Debug, Clone)]
pub struct FoldingSampler {
    contacts: Arc<ContactMap>,
    potential: NativePotential,
    /// Bead to be moved in the next trial
    next_bead: usize,
    /// Most recently proposed move
    last_move: Option<ChainMove>,
}

impl FoldingSampler {
    pub fn new(contacts: Arc<ContactMap>, potential: NativePotential) -> Self {
        Self {
            contacts,
            potential,
            next_bead: 0,
            last_move: None,
        }
    }

    pub const fn last_move(&self) -> Option<ChainMove> {
        self.last_move
    }
}

impl Sampler for FoldingSampler {
    type State = Chain;

    fn generate(&mut self, rng: &mut StdRng, chain: &Chain) -> Option<Chain> {
        let bead = self.next_bead;
        self.next_bead = (bead + 1) % chain.len();
        ChainMove::natural(bead, chain.len(), rng)
            .and_then(|movement| {
                self.last_move = Some(movement);
                movement.propose(chain, rng)
            })
            .unwrap_or_else(|err| {
                log::error!("{}", err);
                None
            })
    }

    fn score(&self, chain: &Chain) -> f64 {
        self.potential.energy(chain, &self.contacts)
    }
}

/// Markov chain of conformations at a fixed temperature
#[derive(Debug)]
pub struct Walker {
    temperature: f64,
    metropolis: MetropolisHastings<FoldingSampler>,
}

impl Walker {
    pub fn acceptance_ratio(&self) -> f64 {
        self.metropolis.acceptance_ratio()
    }

    /// Average energy over all iterations
    pub fn mean_energy(&self) -> f64 {
        self.metropolis.mean_score()
    }
}

impl Temperature for Walker {
    fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl Observable for Walker {
    fn chain(&self) -> &Chain {
        self.metropolis.state()
    }
    fn energy(&self) -> f64 {
        self.metropolis.score()
    }
}

/// Life cycle of a [`Simulation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No chain has been assigned yet
    Uninitialized,
    /// A chain and its energy are set but no iterations are done
    Initialized,
    /// Iterations are in progress
    Running,
}

/// # Folding simulation
///
/// Created without a chain; [`Simulation::first_iteration`] or
/// [`Simulation::initialize`] assign one before iterating.
#[derive(Debug)]
pub struct Simulation {
    contacts: Arc<ContactMap>,
    potential: NativePotential,
    temperature: f64,
    seed: u64,
    walker: Option<Walker>,
    /// Number of completed iterations
    step: usize,
    /// Trial and acceptance counts per move kind
    statistics: BTreeMap<&'static str, MoveStatistics>,
    analyses: AnalysisCollection<Walker>,
}

impl Simulation {
    /// New simulation at `temperature` with tolerance `a` of the native potential.
    pub fn new(contacts: Arc<ContactMap>, tolerance: f64, temperature: f64, seed: u64) -> anyhow::Result<Self> {
        if !(temperature > 0.0 && temperature.is_finite()) {
            anyhow::bail!("Temperature must be positive and finite, got {}", temperature);
        }
        Ok(Self {
            contacts,
            potential: NativePotential::new(tolerance)?,
            temperature,
            seed,
            walker: None,
            step: 0,
            statistics: BTreeMap::new(),
            analyses: AnalysisCollection::default(),
        })
    }

    /// Append an analysis to the back of the collection.
    pub fn add_analysis(&mut self, analysis: Box<dyn Analyze<Walker>>) {
        self.analyses.push(analysis)
    }

    /// Append energies and conformations to the templated files in `dir`.
    ///
    /// Frequencies are in iterations.
    pub fn add_output_files(
        &mut self,
        dir: &Path,
        energy_frequency: Frequency,
        trajectory_frequency: Frequency,
    ) -> anyhow::Result<()> {
        let (t, d_max, a) = (self.temperature, self.contacts.d_max(), self.tolerance());
        let energy_file = output_file(dir, OutputKind::Energy, t, d_max, a);
        let trajectory_file = output_file(dir, OutputKind::Trajectory, t, d_max, a);
        log::debug!(
            "Writing {} and {}",
            energy_file.display(),
            trajectory_file.display()
        );
        self.add_analysis(Box::new(EnergyWriter::new(&energy_file, energy_frequency)?));
        self.add_analysis(Box::new(StructureWriter::new(trajectory_file, trajectory_frequency)));
        Ok(())
    }

    /// Scramble `chain` and start sampling from the result.
    pub fn first_iteration(&mut self, chain: &Chain) -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut chain = chain.clone();
        montecarlo::scramble(&mut chain, &mut rng)?;
        let energy = self.potential.checked_energy(&chain, &self.contacts)?;
        self.start(chain, energy, rng)
    }

    /// Seed used by the next call to [`Simulation::first_iteration`] or [`Simulation::initialize`].
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Start sampling from `chain` with known `energy`, e.g. when resuming.
    pub fn initialize(&mut self, chain: Chain, energy: f64) -> anyhow::Result<()> {
        let rng = StdRng::seed_from_u64(self.seed);
        self.start(chain, energy, rng)
    }

    fn start(&mut self, chain: Chain, energy: f64, rng: StdRng) -> anyhow::Result<()> {
        if chain.len() != self.contacts.num_beads() {
            anyhow::bail!(
                "Chain of {} beads does not match contact map of {} beads",
                chain.len(),
                self.contacts.num_beads()
            );
        }
        let sampler = FoldingSampler::new(self.contacts.clone(), self.potential);
        let criterion = AcceptanceCriterion::Boltzmann {
            temperature: self.temperature,
        };
        let walker = Walker {
            temperature: self.temperature,
            metropolis: MetropolisHastings::with_score(sampler, criterion, chain, energy, rng),
        };
        self.analyses.sample(&walker, self.step)?;
        self.walker = Some(walker);
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        match &self.walker {
            None => Phase::Uninitialized,
            Some(walker) if walker.metropolis.statistics().num_trials == 0 => Phase::Initialized,
            Some(_) => Phase::Running,
        }
    }

    /// Current walker; fails before initialization.
    pub fn walker(&self) -> anyhow::Result<&Walker> {
        self.walker
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Simulation at T = {} is not initialized", self.temperature))
    }

    fn walker_mut(&mut self) -> anyhow::Result<&mut Walker> {
        let temperature = self.temperature;
        self.walker
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Simulation at T = {} is not initialized", temperature))
    }

    /// Perform a single Metropolis-Hastings iteration.
    pub fn next_iteration(&mut self) -> anyhow::Result<Outcome> {
        let walker = self
            .walker
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Simulation must be initialized before iterating"))?;
        let outcome = walker.metropolis.step();
        if let Some(movement) = walker.metropolis.sampler().last_move() {
            let statistics = self
                .statistics
                .entry(movement.short_name().unwrap_or("move"))
                .or_default();
            match outcome {
                Outcome::Accepted(energy_change) => statistics.accept(energy_change),
                Outcome::Rejected | Outcome::Invalid => statistics.reject(),
            }
        }
        self.step += 1;
        self.analyses.sample(walker, self.step)?;
        Ok(outcome)
    }

    /// One iteration per bead. Returns the number of accepted moves.
    pub fn sweep(&mut self) -> anyhow::Result<usize> {
        let mut num_accepted = 0;
        for _ in 0..self.contacts.num_beads() {
            if self.next_iteration()?.is_accepted() {
                num_accepted += 1;
            }
        }
        Ok(num_accepted)
    }

    /// Exchange chains and energies with another simulation; temperatures stay.
    pub fn swap_chain(&mut self, other: &mut Simulation) -> anyhow::Result<()> {
        let other = other.walker_mut()?;
        self.walker_mut()?.metropolis.swap_state(&mut other.metropolis);
        Ok(())
    }

    /// True if the energy is within [`CONVERGENCE_TOLERANCE`] of `reference_energy`.
    pub fn has_converged(&self, reference_energy: f64) -> bool {
        self.energy()
            .is_some_and(|energy| (energy - reference_energy).abs() < CONVERGENCE_TOLERANCE)
    }

    /// Fraction of accepted iterations; zero before the first iteration.
    pub fn acceptance_ratio(&self) -> f64 {
        self.walker.as_ref().map_or(0.0, Walker::acceptance_ratio)
    }

    pub fn energy(&self) -> Option<f64> {
        self.walker.as_ref().map(Observable::energy)
    }

    pub fn chain(&self) -> Option<&Chain> {
        self.walker.as_ref().map(Observable::chain)
    }

    pub fn tolerance(&self) -> f64 {
        self.potential.tolerance()
    }

    pub fn contacts(&self) -> &ContactMap {
        &self.contacts
    }

    /// Number of completed iterations.
    pub const fn num_iterations(&self) -> usize {
        self.step
    }

    /// Trial and acceptance counts per kind of move.
    pub const fn move_statistics(&self) -> &BTreeMap<&'static str, MoveStatistics> {
        &self.statistics
    }

    /// Flush all output streams.
    pub fn flush(&mut self) {
        self.analyses.flush()
    }

    /// Summary of the run suitable for YAML output.
    pub fn summary(&self) -> Summary {
        Summary {
            temperature: self.temperature,
            tolerance: self.tolerance(),
            d_max: self.contacts.d_max(),
            num_iterations: self.step,
            energy: self.energy(),
            mean_energy: self.walker.as_ref().map(Walker::mean_energy),
            acceptance_ratio: self.acceptance_ratio(),
            moves: self.statistics.clone(),
            analysis: self.analyses.to_yaml(),
        }
    }
}

impl Temperature for Simulation {
    fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "simulation (T = {:.2}, a = {:.1}, d_max = {:.1})",
            self.temperature,
            self.tolerance(),
            self.contacts.d_max()
        )
    }
}

/// Serializable summary of a [`Simulation`]
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub temperature: f64,
    pub tolerance: f64,
    pub d_max: f64,
    pub num_iterations: usize,
    pub energy: Option<f64>,
    pub mean_energy: Option<f64>,
    pub acceptance_ratio: f64,
    pub moves: BTreeMap<&'static str, MoveStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn fragment(range: std::ops::Range<usize>) -> (Chain, Arc<ContactMap>) {
        let chain = Chain::reference("1PGB").unwrap().fragment(range).unwrap();
        let contacts = Arc::new(ContactMap::new(&chain, 10.0).unwrap());
        (chain, contacts)
    }

    #[test]
    fn invalid_parameters() {
        let (_, contacts) = fragment(0..8);
        assert!(Simulation::new(contacts.clone(), 0.9, 0.0, 1).is_err());
        assert!(Simulation::new(contacts.clone(), 0.9, f64::NAN, 1).is_err());
        assert!(Simulation::new(contacts, 0.0, 1.0, 1).is_err());
    }

    #[test]
    fn phases() {
        let (chain, contacts) = fragment(0..8);
        let mut sim = Simulation::new(contacts, 0.9, 0.5, 1).unwrap();
        assert_eq!(sim.phase(), Phase::Uninitialized);
        assert!(sim.next_iteration().is_err());
        assert_eq!(sim.acceptance_ratio(), 0.0);
        assert!(sim.energy().is_none());

        sim.first_iteration(&chain).unwrap();
        assert_eq!(sim.phase(), Phase::Initialized);
        assert!(!sim.chain().unwrap().has_overlap());

        sim.sweep().unwrap();
        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(sim.num_iterations(), 8);
        let trials: usize = sim.move_statistics().values().map(|s| s.num_trials).sum();
        assert_eq!(trials, 8);
        assert!(sim.move_statistics().contains_key("end"));
    }

    #[test]
    fn beads_are_moved_in_turn() {
        let (chain, contacts) = fragment(0..6);
        let energy = NativePotential::new(0.9).unwrap().energy(&chain, &contacts);
        let mut sim = Simulation::new(contacts, 0.9, 0.5, 4).unwrap();
        sim.initialize(chain, energy).unwrap();
        let beads: Vec<usize> = (0..7)
            .map(|_| {
                sim.next_iteration().unwrap();
                match sim.walker().unwrap().metropolis.sampler().last_move().unwrap() {
                    ChainMove::EndFirst => 0,
                    ChainMove::EndLast => 5,
                    ChainMove::Shift(k) | ChainMove::Spike(k) | ChainMove::Pivot(k) => k + 1,
                }
            })
            .collect();
        assert_eq!(beads, vec![0, 1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn reseeding_changes_the_trajectory() {
        let (chain, contacts) = fragment(0..12);
        let energy = NativePotential::new(0.9).unwrap().energy(&chain, &contacts);
        let run = |seed: Option<u64>| {
            let mut sim = Simulation::new(contacts.clone(), 0.9, 5.0, 7).unwrap();
            if let Some(seed) = seed {
                sim.reseed(seed);
            }
            sim.initialize(chain.clone(), energy).unwrap();
            for _ in 0..20 {
                sim.sweep().unwrap();
            }
            sim.chain().unwrap().clone()
        };
        assert_eq!(run(None), run(Some(7)));
        assert_ne!(run(None), run(Some(8)));
    }

    #[test]
    fn mismatched_chain() {
        let (chain, contacts) = fragment(0..8);
        let mut sim = Simulation::new(contacts, 0.9, 0.5, 1).unwrap();
        let longer = Chain::reference("1PGB").unwrap().fragment(0..9).unwrap();
        assert!(sim.initialize(longer, 0.0).is_err());
        assert!(sim.first_iteration(&chain.fragment(0..7).unwrap()).is_err());
    }

    #[test]
    fn native_chain_has_converged() {
        let (chain, contacts) = fragment(0..12);
        let energy = NativePotential::new(0.9).unwrap().energy(&chain, &contacts);
        let mut sim = Simulation::new(contacts.clone(), 0.9, 0.1, 2).unwrap();
        sim.initialize(chain, energy).unwrap();
        assert_approx_eq!(f64, energy, -(contacts.num_contacts() as f64));
        assert!(sim.has_converged(energy));
        assert!(!sim.has_converged(energy + 0.01));
    }

    #[test]
    fn energy_is_consistent() {
        let (chain, contacts) = fragment(0..16);
        let potential = NativePotential::new(0.9).unwrap();
        let mut sim = Simulation::new(contacts.clone(), 0.9, 0.4, 3).unwrap();
        sim.first_iteration(&chain).unwrap();
        for _ in 0..50 {
            sim.sweep().unwrap();
        }
        let current = sim.chain().unwrap();
        assert_approx_eq!(
            f64,
            sim.energy().unwrap(),
            potential.energy(current, &contacts),
            epsilon = 1e-9
        );
        assert!(!current.has_overlap());
        let ratio = sim.acceptance_ratio();
        assert!(ratio > 0.0 && ratio < 1.0);
    }

    #[test]
    fn low_temperature_folds_small_fragment() {
        // four beads have three native contacts: two angles and one torsion
        let (chain, contacts) = fragment(10..14);
        let reference = NativePotential::new(0.9).unwrap().energy(&chain, &contacts);
        assert_approx_eq!(f64, reference, -3.0);
        let mut sim = Simulation::new(contacts, 0.9, 0.05, 4).unwrap();
        sim.first_iteration(&chain).unwrap();
        let mut lowest = f64::INFINITY;
        for _ in 0..1000 {
            sim.sweep().unwrap();
            lowest = lowest.min(sim.energy().unwrap());
        }
        assert!(lowest < reference + 0.5, "lowest energy {lowest}");
    }

    #[test]
    fn swap_chains() {
        let (chain, contacts) = fragment(0..8);
        let mut cold = Simulation::new(contacts.clone(), 0.9, 0.2, 5).unwrap();
        let mut hot = Simulation::new(contacts, 0.9, 2.0, 6).unwrap();
        assert!(cold.swap_chain(&mut hot).is_err());
        cold.first_iteration(&chain).unwrap();
        hot.first_iteration(&chain).unwrap();
        hot.sweep().unwrap();
        let (cold_chain, hot_chain) = (cold.chain().unwrap().clone(), hot.chain().unwrap().clone());
        let (cold_energy, hot_energy) = (cold.energy().unwrap(), hot.energy().unwrap());
        cold.swap_chain(&mut hot).unwrap();
        assert_eq!(cold.chain().unwrap(), &hot_chain);
        assert_eq!(hot.chain().unwrap(), &cold_chain);
        assert_eq!(cold.energy(), Some(hot_energy));
        assert_eq!(hot.energy(), Some(cold_energy));
        assert_eq!(cold.temperature(), 0.2);
    }

    #[test]
    fn output_files() {
        let dir = std::env::temp_dir().join("beadfold_test_simulation_output");
        std::fs::create_dir_all(&dir).unwrap();
        let (chain, contacts) = fragment(0..6);
        let mut sim = Simulation::new(contacts, 0.9, 0.75, 7).unwrap();
        let energy_file = output_file(&dir, OutputKind::Energy, 0.75, 10.0, 0.9);
        let trajectory_file = output_file(&dir, OutputKind::Trajectory, 0.75, 10.0, 0.9);
        std::fs::remove_file(&energy_file).ok();
        std::fs::remove_file(&trajectory_file).ok();

        sim.add_output_files(&dir, Frequency::Every(6), Frequency::Every(12)).unwrap();
        sim.first_iteration(&chain).unwrap();
        for _ in 0..4 {
            sim.sweep().unwrap();
        }
        sim.flush();

        // samples at iterations 0, 6, 12, 18, 24 and 0, 12, 24
        let energies = std::fs::read_to_string(&energy_file).unwrap();
        assert_eq!(energies.lines().count(), 5);
        let last: f64 = energies.lines().last().unwrap().parse().unwrap();
        assert_approx_eq!(f64, last, sim.energy().unwrap(), epsilon = 1e-6);
        let frames = crate::io::xyz::read_trajectory(&trajectory_file).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].title, "Protein");
        assert!(sim.summary().analysis.is_some());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn display() {
        let (_, contacts) = fragment(0..8);
        let sim = Simulation::new(contacts, 0.9, 0.5, 1).unwrap();
        assert_eq!(sim.to_string(), "simulation (T = 0.50, a = 0.9, d_max = 10.0)");
    }
}
