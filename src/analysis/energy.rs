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

//! Energy analysis, streaming one energy value per line to disk.

use super::{Analyze, Frequency, Observable};
use anyhow::{Context, Result};
use average::{Estimate, Mean};
use derive_more::Debug;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends the current energy to a file.
///
/// Each value is flushed immediately so that the file can be followed
/// while the simulation runs.
#[derive(Debug)]
pub struct EnergyWriter {
    path: PathBuf,
    #[debug(skip)]
    stream: Box<dyn Write + Send>,
    frequency: Frequency,
    mean: Mean,
    num_samples: usize,
}

impl EnergyWriter {
    /// Open `path` for appending.
    pub fn new(path: &Path, frequency: Frequency) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Cannot open energy file {}", path.display()))?;
        Ok(Self {
            path: path.to_owned(),
            stream: Box::new(BufWriter::new(file)),
            frequency,
            mean: Mean::new(),
            num_samples: 0,
        })
    }

    /// Average of all sampled energies
    pub fn mean(&self) -> f64 {
        self.mean.mean()
    }
}

impl crate::Info for EnergyWriter {
    fn short_name(&self) -> Option<&'static str> {
        Some("energy")
    }
    fn long_name(&self) -> Option<&'static str> {
        Some("Energy analysis")
    }
}

impl<T: Observable> Analyze<T> for EnergyWriter {
    fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn sample(&mut self, system: &T, step: usize) -> Result<()> {
        if !self.frequency.should_perform(step) {
            return Ok(());
        }
        let energy = system.energy();
        self.mean.add(energy);
        writeln!(self.stream, "{energy:.6}")?;
        self.stream.flush()?;
        self.num_samples += 1;
        Ok(())
    }

    fn num_samples(&self) -> usize {
        self.num_samples
    }

    fn flush(&mut self) {
        if let Err(err) = self.stream.flush() {
            log::warn!("Cannot flush {}: {}", self.path.display(), err);
        }
    }

    fn to_yaml(&self) -> Option<serde_yaml::Value> {
        let mut map = serde_yaml::Mapping::new();
        map.insert(
            "file".into(),
            serde_yaml::Value::String(self.path.display().to_string()),
        );
        map.insert(
            "num_samples".into(),
            serde_yaml::Value::Number(self.num_samples.into()),
        );
        map.insert("mean".into(), serde_yaml::Value::Number(self.mean().into()));
        Some(serde_yaml::Value::Mapping(map))
    }
}
