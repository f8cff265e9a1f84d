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

//! # System analysis and reporting
//!
//! Analyses are sampled periodically during a simulation and typically
//! stream energies or conformations to disk.

use crate::montecarlo::Frequency;
use crate::{Chain, Info, Temperature};
use anyhow::Result;
use core::fmt::Debug;
use std::path::{Path, PathBuf};

mod chain_plot;
mod energy;
mod structure_writer;

pub use chain_plot::ChainPlot;
pub use energy::EnergyWriter;
pub use structure_writer::StructureWriter;

/// Collection of analysis objects.
pub type AnalysisCollection<T> = Vec<Box<dyn Analyze<T>>>;

/// Read-only view of a simulation as seen by analyses
pub trait Observable: Temperature {
    /// Current conformation
    fn chain(&self) -> &Chain;
    /// Current potential energy
    fn energy(&self) -> f64;
}

/// Interface for system analysis.
pub trait Analyze<T>: Debug + Info + Send {
    /// Get analysis frequency
    ///
    /// This is the frequency at which the analysis should be performed.
    fn frequency(&self) -> Frequency;

    /// Sample system if `step` matches the frequency.
    fn sample(&mut self, system: &T, step: usize) -> Result<()>;

    /// Total number of samples which is the sum of successful calls to `sample()`.
    fn num_samples(&self) -> usize;

    /// Flush output stream, if any, ensuring that all intermediately buffered contents reach their destination.
    fn flush(&mut self) {}

    /// Report analysis as YAML
    fn to_yaml(&self) -> Option<serde_yaml::Value> {
        None
    }
}

impl<T: 'static> crate::Info for AnalysisCollection<T> {
    fn short_name(&self) -> Option<&'static str> {
        Some("analysis")
    }
    fn long_name(&self) -> Option<&'static str> {
        Some("Collection of analysis objects")
    }
}

impl<T: 'static> Analyze<T> for AnalysisCollection<T> {
    fn sample(&mut self, system: &T, step: usize) -> Result<()> {
        self.iter_mut().try_for_each(|a| a.sample(system, step))
    }
    /// Summed number of samples for all analysis objects
    fn num_samples(&self) -> usize {
        self.iter().map(|a| a.num_samples()).sum()
    }
    fn frequency(&self) -> Frequency {
        Frequency::Every(1)
    }
    fn flush(&mut self) {
        self.iter_mut().for_each(|a| a.flush())
    }
    fn to_yaml(&self) -> Option<serde_yaml::Value> {
        let mut map = serde_yaml::Mapping::new();
        for a in self.iter() {
            if let (Some(name), Some(value)) = (a.short_name(), a.to_yaml()) {
                map.insert(name.into(), value);
            }
        }
        Some(serde_yaml::Value::Mapping(map))
    }
}

/// Kind of per-simulation output file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    /// One energy per line
    Energy,
    /// Concatenated XYZ frames
    Trajectory,
}

/// Output file name for a simulation at `temperature` with cutoff `d_max` and tolerance `a`,
/// e.g. `U--t-0.50000--dmax-10.00000--a-0.90000.dat`.
pub fn output_file(dir: &Path, kind: OutputKind, temperature: f64, d_max: f64, a: f64) -> PathBuf {
    let (prefix, extension) = match kind {
        OutputKind::Energy => ("U", "dat"),
        OutputKind::Trajectory => ("X", "xyz"),
    };
    dir.join(format!(
        "{prefix}--t-{temperature:02.5}--dmax-{d_max:02.5}--a-{a:02.5}.{extension}"
    ))
}
