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
use crate::plot::Gnuplot;

/// Live plot of the conformation.
///
/// Plotting errors are logged and otherwise ignored.
#[derive(Debug)]
pub struct ChainPlot {
    gnuplot: Gnuplot,
    frequency: Frequency,
    num_samples: usize,
}

impl ChainPlot {
    pub fn new(gnuplot: Gnuplot, frequency: Frequency) -> Self {
        Self {
            gnuplot,
            frequency,
            num_samples: 0,
        }
    }
}

impl crate::Info for ChainPlot {
    fn short_name(&self) -> Option<&'static str> {
        Some("plot")
    }
    fn long_name(&self) -> Option<&'static str> {
        Some("Live gnuplot view of the conformation")
    }
}

impl<T: Observable> Analyze<T> for ChainPlot {
    fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn sample(&mut self, system: &T, step: usize) -> anyhow::Result<()> {
        if !self.frequency.should_perform(step) {
            return Ok(());
        }
        let caption = format!(
            "T = {:.2}, U = {:.2}, step {}",
            system.temperature(),
            system.energy(),
            step
        );
        match self.gnuplot.plot_chain(system.chain(), &caption) {
            Ok(()) => self.num_samples += 1,
            Err(err) => log::warn!("Plotting failed: {}", err),
        }
        Ok(())
    }

    fn num_samples(&self) -> usize {
        self.num_samples
    }
}
