// Copyright 2023-2026 Mikael Lund
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

//! Save and load replica exchange state for checkpointing and resuming runs.

use crate::PositionVec;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default name of the checkpoint file in the output directory
pub const STATE_FILE: &str = "state.yaml";

/// Saved state of a single replica.
///
/// The temperature is fixed by the input but saved here so that a checkpoint
/// from a different temperature ladder is detected on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaState {
    pub temperature: f64,
    pub energy: f64,
    pub positions: PositionVec,
}

/// Checkpoint of a replica exchange run.
///
/// Only runtime-mutable quantities are saved. Contact map, potential and
/// output files are rebuilt from the YAML input file on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Completed production cycles
    pub cycle: usize,
    pub replicas: Vec<ReplicaState>,
    /// Accepted exchanges per adjacent pair
    pub exchanges: Vec<usize>,
    /// Attempted exchanges per adjacent pair
    pub attempts: Vec<usize>,
}

impl State {
    /// Load a state from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read state file {:?}", path.as_ref()))?;
        Ok(serde_yaml::from_str(&yaml)?)
    }

    /// Save the state to a YAML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write state file {:?}", path.as_ref()))
    }
}
