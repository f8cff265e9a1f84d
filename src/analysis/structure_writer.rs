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

use super::{Analyze, Frequency, Observable};
use crate::io::xyz;
use std::path::PathBuf;

/// Appends the conformation of the chain to an XYZ trajectory during the simulation.
#[derive(Debug)]
pub struct StructureWriter {
    /// Output trajectory file
    output_file: PathBuf,
    /// Sample frequency.
    frequency: Frequency,
    /// Counter for the number of samples taken.
    num_samples: usize,
}

impl StructureWriter {
    pub fn new(output_file: impl Into<PathBuf>, frequency: Frequency) -> Self {
        Self {
            output_file: output_file.into(),
            frequency,
            num_samples: 0,
        }
    }
}

impl crate::Info for StructureWriter {
    fn short_name(&self) -> Option<&'static str> {
        Some("trajectory")
    }
    fn long_name(&self) -> Option<&'static str> {
        Some("Writes the conformation at specified frequency into an output trajectory.")
    }
}

impl<T: Observable> Analyze<T> for StructureWriter {
    fn sample(&mut self, system: &T, step: usize) -> anyhow::Result<()> {
        if !self.frequency.should_perform(step) {
            return Ok(());
        }
        // frames are always appended so that resumed runs extend the trajectory
        xyz::write_frame(&self.output_file, &system.chain().to_frame("Protein"), true)?;
        self.num_samples += 1;
        Ok(())
    }

    fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn num_samples(&self) -> usize {
        self.num_samples
    }

    fn to_yaml(&self) -> Option<serde_yaml::Value> {
        let mut map = serde_yaml::Mapping::new();
        map.insert(
            "file".into(),
            serde_yaml::Value::String(self.output_file.display().to_string()),
        );
        map.insert(
            "num_samples".into(),
            serde_yaml::Value::Number(self.num_samples.into()),
        );
        Some(serde_yaml::Value::Mapping(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Chain, Temperature};

    struct Frozen(Chain);

    impl Temperature for Frozen {
        fn temperature(&self) -> f64 {
            1.0
        }
    }

    impl Observable for Frozen {
        fn chain(&self) -> &Chain {
            &self.0
        }
        fn energy(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn appends_frames_at_frequency() {
        let path = std::env::temp_dir().join("beadfold_structure_writer_frequency.xyz");
        let _ = std::fs::remove_file(&path);
        let system = Frozen(Chain::reference("1PGB").unwrap().fragment(0..5).unwrap());
        let mut writer = StructureWriter::new(&path, Frequency::Every(10));
        for step in 1..=30 {
            writer.sample(&system, step).unwrap();
        }
        assert_eq!(writer.num_samples, 3);
        let frames = xyz::read_trajectory(&path).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].positions.len(), 5);
        std::fs::remove_file(&path).unwrap();
    }
}
