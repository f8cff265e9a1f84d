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

//! # Native contact map
//!
//! Snapshot of the pairs of beads that are in contact in a reference (native)
//! structure, together with their reference distances. The map is computed once
//! and then shared read-only by all simulations folding towards the same target.
//!
//! Contacts are defined as follows for beads `i < j`:
//!
//! - `j - i == 2`: always a contact; this fixes the bond angle.
//! - `j - i == 3`: always a contact with a distance signed by the local chirality;
//!   this fixes the torsion.
//! - `j - i >= 4`: a contact if the distance is at most `d_max`.

use crate::{BitSet, Chain};
use itertools::Itertools;
use std::fmt;

/// Smallest sequence separation of a contact
const MIN_SEPARATION: usize = 2;

/// Contacts between beads in a native structure
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMap {
    num_beads: usize,
    num_contacts: usize,
    d_max: f64,
    /// Strictly upper triangle (`j >= i + 2`), row by row. Non-contacts are infinite.
    distances: Vec<f64>,
}

impl ContactMap {
    /// Compute the contact map of a native structure using the cutoff distance `d_max`.
    pub fn new(native: &Chain, d_max: f64) -> anyhow::Result<Self> {
        if !(d_max > 0.0 && d_max.is_finite()) {
            anyhow::bail!("Contact cutoff must be positive and finite, got {}", d_max);
        }
        let num_beads = native.len();
        let mut distances = vec![f64::INFINITY; num_triangle(num_beads)];
        let mut num_contacts = 0;

        for (i, j) in (0..num_beads).tuple_combinations() {
            let Some(index) = triangle_index(num_beads, i, j) else {
                continue;
            };
            let d = native.signed_distance(i, j);
            let is_contact = match j - i {
                2 | 3 => true,
                _ => d <= d_max,
            };
            if is_contact {
                distances[index] = d;
                num_contacts += 1;
            }
        }
        log::debug!(
            "Contact map of {} beads with d_max = {}: {} native contacts",
            num_beads,
            d_max,
            num_contacts
        );
        Ok(Self {
            num_beads,
            num_contacts,
            d_max,
            distances,
        })
    }

    pub const fn num_beads(&self) -> usize {
        self.num_beads
    }

    pub const fn num_contacts(&self) -> usize {
        self.num_contacts
    }

    pub const fn d_max(&self) -> f64 {
        self.d_max
    }

    /// Native (signed) distance between beads `i` and `j`.
    ///
    /// The diagonal is zero; bonded pairs and non-contacts are infinite.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.num_beads && j < self.num_beads);
        if i == j {
            return 0.0;
        }
        triangle_index(self.num_beads, i.min(j), i.max(j))
            .map_or(f64::INFINITY, |index| self.distances[index])
    }

    /// True if beads `i` and `j` are a native contact.
    pub fn is_contact(&self, i: usize, j: usize) -> bool {
        i != j && self.distance(i, j).is_finite()
    }

    /// Iterator over all native contacts as `(i, j, distance)` with `i < j`.
    pub fn contacts(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.num_beads)
            .tuple_combinations()
            .filter(|(i, j)| j - i >= MIN_SEPARATION)
            .zip(self.distances.iter())
            .filter(|(_, d)| d.is_finite())
            .map(|((i, j), &d)| (i, j, d))
    }

    /// Contacts as a bit mask over the full `N × N` matrix, row-major.
    pub fn mask(&self) -> anyhow::Result<BitSet> {
        let n = self.num_beads;
        let mut mask = BitSet::new(n * n)?;
        for (i, j, _) in self.contacts() {
            mask.set(i * n + j);
            mask.set(j * n + i);
        }
        Ok(mask)
    }

    /// Contacts present in only one of two maps of equally long chains.
    pub fn diff(&self, other: &Self) -> anyhow::Result<ContactDiff> {
        if self.num_beads != other.num_beads {
            anyhow::bail!(
                "Cannot compare contact maps of {} and {} beads",
                self.num_beads,
                other.num_beads
            );
        }
        let (first, second) = (self.mask()?, other.mask()?);
        let n = self.num_beads;
        let upper = |index: &usize| index / n < index % n;
        Ok(ContactDiff {
            only_in_first: first
                .iter_ones()
                .filter(upper)
                .filter(|&k| !second.get(k))
                .map(|k| (k / n, k % n))
                .collect(),
            only_in_second: second
                .iter_ones()
                .filter(upper)
                .filter(|&k| !first.get(k))
                .map(|k| (k / n, k % n))
                .collect(),
        })
    }
}

/// Binary matrix with `1` for native contacts; one row per line.
impl fmt::Display for ContactMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.num_beads {
            let line = (0..self.num_beads)
                .map(|col| if self.is_contact(row, col) { "1" } else { "0" })
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Differences between two contact maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDiff {
    /// Pairs `(i, j)` only in contact in the first map
    pub only_in_first: Vec<(usize, usize)>,
    /// Pairs `(i, j)` only in contact in the second map
    pub only_in_second: Vec<(usize, usize)>,
}

impl ContactDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_first.is_empty() && self.only_in_second.is_empty()
    }
}

impl fmt::Display for ContactDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, j) in &self.only_in_first {
            writeln!(f, "contact between {i} and {j} is not present in the second map")?;
        }
        for (i, j) in &self.only_in_second {
            writeln!(f, "contact between {i} and {j} is not present in the first map")?;
        }
        Ok(())
    }
}

/// Number of pairs with `j >= i + 2` among `n` beads.
const fn num_triangle(n: usize) -> usize {
    match n {
        0..=2 => 0,
        _ => (n - 1) * (n - 2) / 2,
    }
}

/// Position of pair `(i, j)`, `i < j`, in the strictly upper triangle.
fn triangle_index(n: usize, i: usize, j: usize) -> Option<usize> {
    if j < i + MIN_SEPARATION || j >= n {
        return None;
    }
    // rows before `i` hold (n - 2 - r) entries each
    let offset = i * (n - 2) - i * (i.saturating_sub(1)) / 2;
    Some(offset + (j - i - MIN_SEPARATION))
}
