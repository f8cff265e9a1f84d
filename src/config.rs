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

//! # User input for replica exchange runs
//!
//! Input is given in YAML, e.g.
//!
//! ~~~ yaml
//! reference: 1PGB
//! d_max: 10.0
//! tolerance: 0.9
//! temperatures:
//!   linspace: {min: 0.3, max: 1.0, n: 8}
//! seed: 42
//! schedule:
//!   thermalization: 1000
//!   sweeps_per_cycle: 5000
//!   cycles: 20
//! output_dir: out
//! ~~~

use crate::Chain;
use anyhow::Context;
use derive_builder::Builder;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default contact cutoff
pub const DEFAULT_D_MAX: f64 = 7.5;
/// Default tolerance of the native potential
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// Evenly spaced values from `min` to `max`, both included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Linspace {
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Linspace {
    pub fn values(&self) -> Vec<f64> {
        match self.n {
            0 => Vec::new(),
            1 => vec![self.min],
            n => {
                let step = (self.max - self.min) / (n - 1) as f64;
                (0..n).map(|k| self.min + k as f64 * step).collect()
            }
        }
    }
}

/// Replica temperatures given either explicitly or as a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Temperatures {
    List(Vec<f64>),
    Linspace { linspace: Linspace },
}

impl Temperatures {
    pub fn values(&self) -> Vec<f64> {
        match self {
            Temperatures::List(values) => values.clone(),
            Temperatures::Linspace { linspace } => linspace.values(),
        }
    }
}

/// Lengths of the phases of a replica exchange run.
///
/// All quantities are in sweeps, i.e. one iteration per bead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(derive(Debug))]
#[serde(deny_unknown_fields, default)]
pub struct Schedule {
    /// Sweeps before production, without exchanges
    #[builder(default = "1000")]
    pub thermalization: usize,
    /// Sweeps between exchange attempts
    #[builder(default = "5000")]
    pub sweeps_per_cycle: usize,
    /// Number of exchange cycles
    #[builder(default = "100")]
    pub cycles: usize,
    /// Sweeps between saved energies
    #[builder(default = "1000")]
    pub energy_frequency: usize,
    /// Sweeps between saved conformations
    #[builder(default = "5000")]
    pub trajectory_frequency: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            thermalization: 1000,
            sweeps_per_cycle: 5000,
            cycles: 100,
            energy_frequency: 1000,
            trajectory_frequency: 5000,
        }
    }
}

/// Input file for replica exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// Native structure; path to an XYZ file or a built-in name
    pub reference: String,
    /// Contact cutoff
    #[serde(default = "default_d_max")]
    pub d_max: f64,
    /// Tolerance of the native potential
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    pub temperatures: Temperatures,
    /// Master seed; drawn at random if absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub schedule: Schedule,
    /// Directory for energy, trajectory and state files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_d_max() -> f64 {
    DEFAULT_D_MAX
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Input {
    /// Load input from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read input file {:?}", path.as_ref()))?;
        serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid input file {:?}", path.as_ref()))
    }

    /// Native chain named by `reference`.
    pub fn reference_chain(&self) -> anyhow::Result<Chain> {
        Chain::load(&self.reference)
    }

    /// Given seed or a fresh random one, logged so the run can be repeated.
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            let seed = rand::thread_rng().gen();
            log::info!("Using random seed {}", seed);
            seed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn linspace() {
        let values = Linspace { min: 0.2, max: 1.0, n: 5 }.values();
        assert_eq!(values.len(), 5);
        assert_approx_eq!(f64, values[0], 0.2);
        assert_approx_eq!(f64, values[1], 0.4);
        assert_approx_eq!(f64, values[4], 1.0);
        assert_eq!(Linspace { min: 0.5, max: 1.0, n: 1 }.values(), vec![0.5]);
        assert!(Linspace { min: 0.5, max: 1.0, n: 0 }.values().is_empty());
    }

    #[test]
    fn parse_input() {
        let yaml = r#"
reference: 2GB1
d_max: 10.0
tolerance: 0.9
temperatures:
  linspace: {min: 0.3, max: 1.0, n: 8}
seed: 7
schedule:
  cycles: 3
  sweeps_per_cycle: 10
output_dir: /tmp/run
"#;
        let input: Input = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(input.temperatures.values().len(), 8);
        assert_eq!(input.seed(), 7);
        assert_eq!(input.schedule.cycles, 3);
        assert_eq!(input.schedule.sweeps_per_cycle, 10);
        assert_eq!(input.schedule.thermalization, 1000);
        assert_eq!(input.output_dir, PathBuf::from("/tmp/run"));
        assert_eq!(input.reference_chain().unwrap().len(), 56);
    }

    #[test]
    fn defaults() {
        let input: Input = serde_yaml::from_str("{reference: 1PGB, temperatures: [0.5, 0.6]}").unwrap();
        assert_eq!(input.temperatures, Temperatures::List(vec![0.5, 0.6]));
        assert_eq!(input.d_max, DEFAULT_D_MAX);
        assert_eq!(input.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(input.schedule, Schedule::default());
        assert_eq!(input.output_dir, PathBuf::from("."));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<Input>("{reference: 1PGB, temperatures: [1.0], foo: 1}").is_err());
        assert!(serde_yaml::from_str::<Schedule>("{cycles: 1, sweeps: 2}").is_err());
    }

    #[test]
    fn schedule_builder() {
        let schedule = ScheduleBuilder::default()
            .cycles(2)
            .sweeps_per_cycle(3)
            .build()
            .unwrap();
        assert_eq!(schedule.cycles, 2);
        assert_eq!(schedule.sweeps_per_cycle, 3);
        assert_eq!(schedule.energy_frequency, Schedule::default().energy_frequency);
    }
}
