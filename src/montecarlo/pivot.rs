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

use crate::transform::{random_angle, rotate_about, z_rotation};
use crate::Chain;
use rand::prelude::*;

/// Pivot move at bead `k`.
///
/// Rotates the tail, beads `k+1..`, around bead `k` by a random angle about the
/// z-axis. This is the most drastic move as it reorients everything downstream
/// of the pivot and efficiently decorrelates the end-to-end distance.
/// See Madras & Sokal, J. Stat. Phys. 50, 109–186 (1988).
pub(super) fn propose(chain: &Chain, k: usize, rng: &mut impl Rng) -> Option<Chain> {
    let rotation = z_rotation(random_angle(rng));
    let pivot = *chain.position(k);
    let mut candidate = chain.clone();
    candidate.positions_mut()[k + 1..]
        .iter_mut()
        .for_each(|pos| *pos = rotate_about(&pivot, &rotation, pos, false));
    (!candidate.is_overlapping(k + 1..chain.len())).then_some(candidate)
}
