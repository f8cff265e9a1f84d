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

use crate::transform::{random_rotation, rotate_about};
use crate::Chain;
use rand::prelude::*;

/// Terminal bead of a chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainEnd {
    First,
    Last,
}

impl ChainEnd {
    /// Indices of the terminal bead and its bonded neighbour
    fn beads(&self, num_beads: usize) -> (usize, usize) {
        match self {
            ChainEnd::First => (0, 1),
            ChainEnd::Last => (num_beads - 1, num_beads - 2),
        }
    }
}

/// Rotate a terminal bead around its neighbour by a uniformly random rotation.
pub(super) fn propose(chain: &Chain, end: ChainEnd, rng: &mut impl Rng) -> Option<Chain> {
    let (bead, neighbour) = end.beads(chain.len());
    let rotation = random_rotation(rng);
    let mut candidate = chain.clone();
    let pivot = *chain.position(neighbour);
    candidate.positions_mut()[bead] = rotate_about(&pivot, &rotation, chain.position(bead), false);
    (!candidate.is_overlapping(bead..bead + 1)).then_some(candidate)
}
