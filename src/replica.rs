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

//! # Replica exchange (parallel tempering)
//!
//! A set of [`Simulation`]s at increasing temperatures share one contact map.
//! Replicas evolve independently and in parallel between exchange attempts,
//! where adjacent replicas swap chains with probability
//! min(1, exp(Δβ·ΔU)), Δβ = 1/T₂ − 1/T₁ and ΔU = U₂ − U₁.

use crate::analysis::{output_file, Observable, OutputKind};
use crate::config::{Input, Schedule};
use crate::io::xyz;
use crate::montecarlo::Frequency;
use crate::simulation::{self, Simulation};
use crate::state::{ReplicaState, State};
use crate::{Chain, ContactMap, NativePotential, Temperature};
use anyhow::Context;
use float_cmp::approx_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Parameters of a replica exchange run
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaOptions {
    pub temperatures: Vec<f64>,
    pub d_max: f64,
    pub tolerance: f64,
    pub seed: u64,
    pub schedule: Schedule,
}

impl From<&Input> for ReplicaOptions {
    fn from(input: &Input) -> Self {
        Self {
            temperatures: input.temperatures.values(),
            d_max: input.d_max,
            tolerance: input.tolerance,
            seed: input.seed(),
            schedule: input.schedule.clone(),
        }
    }
}

/// Probability to swap the chains of two replicas at temperatures `t1`, `t2` with energies `u1`, `u2`.
pub fn exchange_probability(t1: f64, u1: f64, t2: f64, u2: f64) -> f64 {
    let delta_beta = t2.recip() - t1.recip();
    let delta_energy = u2 - u1;
    (delta_beta * delta_energy).exp().min(1.0)
}

/// Seed for a run restored after `cycle` completed cycles.
fn cycle_seed(seed: u64, cycle: usize) -> u64 {
    // golden ratio increment spreads consecutive cycles apart
    seed ^ (cycle as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// # Replica exchange coordinator
///
/// Replicas are ordered by increasing temperature. Temperatures stay with
/// their slot; chains and energies move between slots on exchange.
#[derive(Debug)]
pub struct ReplicaExchange {
    reference: Chain,
    contacts: Arc<ContactMap>,
    potential: NativePotential,
    replicas: Vec<Simulation>,
    /// Accepted exchanges between replica `k` and `k+1`
    exchanges: Vec<usize>,
    /// Attempted exchanges between replica `k` and `k+1`
    attempts: Vec<usize>,
    /// Completed production cycles
    cycle: usize,
    schedule: Schedule,
    seed: u64,
    rng: StdRng,
}

impl ReplicaExchange {
    pub fn new(reference: &Chain, options: &ReplicaOptions) -> anyhow::Result<Self> {
        if options.temperatures.is_empty() {
            anyhow::bail!("At least one temperature is required");
        }
        if let Some(t) = options
            .temperatures
            .iter()
            .find(|t| !(**t > 0.0 && t.is_finite()))
        {
            anyhow::bail!("Temperatures must be positive and finite, got {}", t);
        }
        let contacts = Arc::new(ContactMap::new(reference, options.d_max)?);
        let potential = NativePotential::new(options.tolerance)?;

        let mut temperatures = options.temperatures.clone();
        temperatures.sort_by(f64::total_cmp);

        let mut rng = StdRng::seed_from_u64(options.seed);
        let replicas = temperatures
            .iter()
            .map(|&t| Simulation::new(contacts.clone(), options.tolerance, t, rng.gen()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let num_pairs = replicas.len() - 1;

        log::info!(
            "{} replicas of {} beads with {} native contacts",
            replicas.len(),
            reference.len(),
            contacts.num_contacts()
        );
        Ok(Self {
            reference: reference.clone(),
            contacts,
            potential,
            replicas,
            exchanges: vec![0; num_pairs],
            attempts: vec![0; num_pairs],
            cycle: 0,
            schedule: options.schedule.clone(),
            seed: options.seed,
            rng,
        })
    }

    /// Stream energies and conformations of every replica to templated files in `dir`.
    pub fn add_output_files(&mut self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory {}", dir.display()))?;
        let num_beads = self.contacts.num_beads();
        let energy_frequency = Frequency::Every(self.schedule.energy_frequency * num_beads);
        let trajectory_frequency = Frequency::Every(self.schedule.trajectory_frequency * num_beads);
        self.replicas
            .iter_mut()
            .try_for_each(|r| r.add_output_files(dir, energy_frequency, trajectory_frequency))
    }

    /// Scramble the reference once and start every replica from the result.
    pub fn first_iteration(&mut self) -> anyhow::Result<()> {
        let mut chain = self.reference.clone();
        crate::montecarlo::scramble(&mut chain, &mut self.rng)?;
        let energy = self.potential.checked_energy(&chain, &self.contacts)?;
        log::info!("Scrambled chain has energy {:.3}", energy);
        self.replicas
            .par_iter_mut()
            .try_for_each(|replica| replica.initialize(chain.clone(), energy))
    }

    /// Start every replica from its own chain, e.g. the last saved conformations.
    ///
    /// Each replica draws a fresh seed so that a resumed run continues with new random streams.
    pub fn resume(&mut self, chains: Vec<Chain>) -> anyhow::Result<()> {
        if chains.len() != self.replicas.len() {
            anyhow::bail!(
                "Got {} chains for {} replicas",
                chains.len(),
                self.replicas.len()
            );
        }
        for replica in &mut self.replicas {
            replica.reseed(self.rng.gen());
        }
        let (potential, contacts) = (self.potential, &self.contacts);
        self.replicas
            .par_iter_mut()
            .zip(chains.into_par_iter())
            .try_for_each(|(replica, chain)| {
                let energy = potential.checked_energy(&chain, contacts)?;
                replica.initialize(chain, energy)
            })
    }

    /// Resume from the last frame of each replica's trajectory file in `dir`.
    pub fn resume_from_trajectories(&mut self, dir: &Path) -> anyhow::Result<()> {
        let (d_max, a) = (self.contacts.d_max(), self.potential.tolerance());
        let chains = self
            .replicas
            .iter()
            .map(|r| {
                let path = output_file(dir, OutputKind::Trajectory, r.temperature(), d_max, a);
                let frame = xyz::read_latest(&path)?;
                Chain::try_from(frame).with_context(|| format!("Invalid chain in {}", path.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        self.resume(chains)
    }

    /// Resume from a checkpoint, including exchange counters.
    pub fn restore(&mut self, state: &State) -> anyhow::Result<()> {
        if state.replicas.len() != self.replicas.len() {
            anyhow::bail!(
                "Checkpoint has {} replicas but input has {}",
                state.replicas.len(),
                self.replicas.len()
            );
        }
        for (saved, replica) in state.replicas.iter().zip(&self.replicas) {
            if !approx_eq!(f64, saved.temperature, replica.temperature(), epsilon = 1e-9) {
                anyhow::bail!(
                    "Checkpoint temperature {} does not match {}",
                    saved.temperature,
                    replica.temperature()
                );
            }
        }
        let chains = state
            .replicas
            .iter()
            .map(|r| Chain::new(r.positions.clone()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        self.rng = StdRng::seed_from_u64(cycle_seed(self.seed, state.cycle));
        self.resume(chains)?;
        if state.exchanges.len() == self.exchanges.len() && state.attempts.len() == self.attempts.len() {
            self.exchanges.clone_from(&state.exchanges);
            self.attempts.clone_from(&state.attempts);
        } else {
            log::warn!("Ignoring exchange counters of mismatched length in checkpoint");
        }
        self.cycle = state.cycle;
        Ok(())
    }

    /// Checkpoint of the current chains, energies and counters.
    pub fn state(&self) -> anyhow::Result<State> {
        let replicas = self
            .replicas
            .iter()
            .map(|r| {
                let walker = r.walker()?;
                Ok(ReplicaState {
                    temperature: r.temperature(),
                    energy: walker.energy(),
                    positions: walker.chain().positions().to_vec(),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(State {
            cycle: self.cycle,
            replicas,
            exchanges: self.exchanges.clone(),
            attempts: self.attempts.clone(),
        })
    }

    /// Run `num_sweeps` sweeps on every replica without exchanges.
    pub fn thermalize(&mut self, num_sweeps: usize) -> anyhow::Result<()> {
        log::info!("Thermalizing with {} sweeps per replica", num_sweeps);
        self.replicas.par_iter_mut().try_for_each(|replica| {
            (0..num_sweeps).try_for_each(|_| replica.sweep().map(|_| ()))
        })?;
        self.flush();
        log::info!("Done thermalizing");
        Ok(())
    }

    /// Attempt exchanges of every other adjacent pair, starting at a random offset.
    ///
    /// Returns the number of accepted exchanges.
    pub fn exchange_step(&mut self) -> anyhow::Result<usize> {
        if self.replicas.len() < 2 {
            return Ok(0);
        }
        let offset = self.rng.gen_range(0..2);
        let mut num_accepted = 0;
        for k in (offset..self.replicas.len() - 1).step_by(2) {
            if self.exchange(k)? {
                num_accepted += 1;
            }
        }
        Ok(num_accepted)
    }

    /// Attempt to swap the chains of replicas `k` and `k+1`.
    pub fn exchange(&mut self, k: usize) -> anyhow::Result<bool> {
        if k + 1 >= self.replicas.len() {
            anyhow::bail!("No replica pair ({}, {}) among {} replicas", k, k + 1, self.replicas.len());
        }
        let (cold, hot) = self.replicas.split_at_mut(k + 1);
        let (first, second) = (&mut cold[k], &mut hot[0]);
        let (u1, u2) = match (first.energy(), second.energy()) {
            (Some(u1), Some(u2)) => (u1, u2),
            _ => anyhow::bail!("Replicas must be initialized before exchanging"),
        };
        let probability = exchange_probability(first.temperature(), u1, second.temperature(), u2);
        let accepted = self.rng.gen::<f64>() < probability;
        if accepted {
            log::debug!(
                "Swapping replicas {} and {} (T = {:.2}, {:.2})",
                k,
                k + 1,
                first.temperature(),
                second.temperature()
            );
            first.swap_chain(second)?;
            self.exchanges[k] += 1;
        }
        self.attempts[k] += 1;
        Ok(accepted)
    }

    /// Exchange step followed by a batch of production sweeps on every replica.
    pub fn next_iteration(&mut self) -> anyhow::Result<()> {
        if self.replicas.len() > 1 {
            let num_accepted = self.exchange_step()?;
            log::debug!("Accepted {} exchanges in cycle {}", num_accepted, self.cycle);
        }
        let num_sweeps = self.schedule.sweeps_per_cycle;
        self.replicas.par_iter_mut().try_for_each(|replica| {
            (0..num_sweeps).try_for_each(|_| replica.sweep().map(|_| ()))
        })?;
        self.flush();
        self.cycle += 1;
        Ok(())
    }

    /// Run at most `num_cycles` cycles, stopping early if `cancel` is set.
    ///
    /// `on_cycle` is called after each completed cycle. Returns the number of completed cycles.
    pub fn run(
        &mut self,
        num_cycles: usize,
        cancel: &AtomicBool,
        mut on_cycle: impl FnMut(&Self),
    ) -> anyhow::Result<usize> {
        let mut completed = 0;
        while completed < num_cycles {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Cancelled after {} cycles", completed);
                break;
            }
            self.next_iteration()?;
            completed += 1;
            on_cycle(self);
        }
        Ok(completed)
    }

    pub fn total_exchanges(&self) -> usize {
        self.exchanges.iter().sum()
    }

    /// Accepted over attempted exchanges per adjacent pair; zero for pairs never attempted.
    pub fn exchange_ratios(&self) -> Vec<f64> {
        self.exchanges
            .iter()
            .zip(&self.attempts)
            .map(|(&accepted, &total)| match total {
                0 => 0.0,
                _ => accepted as f64 / total as f64,
            })
            .collect()
    }

    pub fn replicas(&self) -> &[Simulation] {
        &self.replicas
    }

    /// Replica at temperature slot `k`, counted from the coldest.
    pub fn replica_mut(&mut self, k: usize) -> Option<&mut Simulation> {
        self.replicas.get_mut(k)
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.replicas.iter().map(Temperature::temperature).collect()
    }

    pub fn contacts(&self) -> &ContactMap {
        &self.contacts
    }

    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Completed production cycles.
    pub const fn num_cycles(&self) -> usize {
        self.cycle
    }

    /// Energy of the native structure.
    pub fn reference_energy(&self) -> f64 {
        self.potential.energy(&self.reference, &self.contacts)
    }

    /// Lowest energy among the replicas, if initialized.
    pub fn lowest_energy(&self) -> Option<f64> {
        self.replicas
            .iter()
            .filter_map(Simulation::energy)
            .min_by(f64::total_cmp)
    }

    /// True if any replica has reached the native energy.
    pub fn has_converged(&self) -> bool {
        let reference_energy = self.reference_energy();
        self.replicas.iter().any(|r| r.has_converged(reference_energy))
    }

    pub fn flush(&mut self) {
        self.replicas.iter_mut().for_each(Simulation::flush)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            num_cycles: self.cycle,
            total_exchanges: self.total_exchanges(),
            exchange_ratios: self.exchange_ratios(),
            replicas: self.replicas.iter().map(Simulation::summary).collect(),
        }
    }
}

impl fmt::Display for ReplicaExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pair, ratio) in self.replicas.windows(2).zip(self.exchange_ratios()) {
            writeln!(
                f,
                "ratio of exchanges between temperatures {:.2} and {:.2}: {:.2}",
                pair[0].temperature(),
                pair[1].temperature(),
                ratio
            )?;
        }
        Ok(())
    }
}

/// Serializable summary of a [`ReplicaExchange`] run
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub num_cycles: usize,
    pub total_exchanges: usize,
    pub exchange_ratios: Vec<f64>,
    pub replicas: Vec<simulation::Summary>,
}
