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

/// Shift move at bead `k`.
///
/// The bond `k → k+1` is given a random orientation and the beads after
/// `k+1` follow the displacement of `k+1` so that the tail keeps its shape.
pub(super) fn propose(chain: &Chain, k: usize, rng: &mut impl Rng) -> Option<Chain> {
    let rotation = random_rotation(rng);
    let mut candidate = chain.clone();
    let old = *chain.position(k + 1);
    let new = rotate_about(chain.position(k), &rotation, &old, false);
    let displacement = new - old;
    candidate.positions_mut()[k + 1..]
        .iter_mut()
        .for_each(|pos| *pos += displacement);
    (!candidate.is_overlapping(k + 1..chain.len())).then_some(candidate)
}
