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

//! # Bead chains
//!
//! A [`Chain`] is an ordered list of alpha-carbon positions where consecutive
//! beads are bonded. Monte Carlo moves are rigid rotations and translations
//! of sub-chains and hence never change a bond length.

mod reference;

use crate::io::xyz::{self, Frame};
use crate::transform::triple_product;
use crate::{Point, PositionVec};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::Path;

/// Typical distance between consecutive alpha carbons (Å)
pub const BOND_LENGTH: f64 = 3.8;

/// Closest allowed distance between non-bonded beads (Å)
pub const BEAD_DIAMETER: f64 = 1.1 * BOND_LENGTH;

/// Names of the built-in reference structures
pub const REFERENCE_NAMES: [&str; 2] = ["1PGB", "2GB1"];

/// Label used for beads when writing structure files
const BEAD_LABEL: &str = "CA";

/// Ordered sequence of bonded beads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    positions: PositionVec,
}

impl Chain {
    /// Create a chain from explicit positions. At least two beads are required.
    pub fn new(positions: PositionVec) -> anyhow::Result<Self> {
        if positions.len() < 2 {
            anyhow::bail!(
                "A chain needs at least two beads, got {}",
                positions.len()
            );
        }
        if positions.iter().any(|p| !p.iter().all(|x| x.is_finite())) {
            anyhow::bail!("Chain positions must be finite");
        }
        Ok(Self { positions })
    }

    /// Built-in reference structure by name (`1PGB` or `2GB1`, case-insensitive).
    pub fn reference(name: &str) -> anyhow::Result<Self> {
        let table: &[[f64; 3]] = match name.to_ascii_uppercase().as_str() {
            "1PGB" => &reference::PDB_1PGB,
            "2GB1" => &reference::PDB_2GB1,
            _ => anyhow::bail!(
                "Unknown reference structure '{}'; available: {}",
                name,
                REFERENCE_NAMES.join(", ")
            ),
        };
        Self::new(table.iter().map(|&[x, y, z]| Point::new(x, y, z)).collect())
    }

    /// Read the first frame of an XYZ file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let frame = xyz::read_frame(path.as_ref())?;
        Self::new(frame.positions)
            .with_context(|| format!("Invalid chain in {}", path.as_ref().display()))
    }

    /// Built-in reference if `source` names one, otherwise an XYZ file path.
    pub fn load(source: &str) -> anyhow::Result<Self> {
        if REFERENCE_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(source))
        {
            Self::reference(source)
        } else {
            Self::from_file(source)
        }
    }

    /// Contiguous fragment of the chain, e.g. `0..4` for the first four beads.
    pub fn fragment(&self, range: Range<usize>) -> anyhow::Result<Self> {
        let positions = self
            .positions
            .get(range.clone())
            .ok_or_else(|| anyhow::anyhow!("Fragment {:?} outside chain of length {}", range, self.len()))?;
        Self::new(positions.to_vec())
    }

    /// Number of beads.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false as a chain has at least two beads.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> &Point {
        &self.positions[index]
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [Point] {
        &mut self.positions
    }

    /// Euclidean distance between beads `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.positions[j] - self.positions[i]).norm()
    }

    /// Handedness of the four beads `m..=m+3`.
    ///
    /// Sign of the triple product of the three consecutive bond vectors.
    /// A vanishing triple product (planar arrangement) counts as right-handed.
    pub fn chirality(&self, m: usize) -> f64 {
        let p = &self.positions[m..m + 4];
        let product = triple_product(&(p[1] - p[0]), &(p[2] - p[1]), &(p[3] - p[2]));
        if product < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Distance between beads `i` and `j`, signed by [`Chain::chirality`] when `|i - j| == 3`.
    pub fn signed_distance(&self, i: usize, j: usize) -> f64 {
        let d = self.distance(i, j);
        if i.abs_diff(j) == 3 {
            self.chirality(i.min(j)) * d
        } else {
            d
        }
    }

    /// True if any bead in `range` is closer than [`BEAD_DIAMETER`] to a non-bonded bead.
    ///
    /// Bonded neighbours, `i-1` and `i+1`, are excluded.
    pub fn is_overlapping(&self, range: Range<usize>) -> bool {
        range.into_iter().any(|i| {
            self.positions.iter().enumerate().any(|(j, pos)| {
                i.abs_diff(j) > 1 && (pos - self.positions[i]).norm() < BEAD_DIAMETER
            })
        })
    }

    /// True if any pair of non-bonded beads overlap.
    pub fn has_overlap(&self) -> bool {
        self.is_overlapping(0..self.len())
    }

    /// Distances between consecutive beads.
    pub fn bond_lengths(&self) -> Vec<f64> {
        self.positions
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .collect()
    }

    /// Structure frame with a title, ready to be written to disk.
    pub fn to_frame(&self, title: impl Into<String>) -> Frame {
        Frame {
            title: title.into(),
            labels: vec![BEAD_LABEL.to_string(); self.len()],
            positions: self.positions.clone(),
        }
    }
}

impl TryFrom<Frame> for Chain {
    type Error = anyhow::Error;
    fn try_from(frame: Frame) -> anyhow::Result<Self> {
        Self::new(frame.positions)
    }
}

/// Formats the chain as a single XYZ frame.
impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_frame("Protein"))
    }
}
