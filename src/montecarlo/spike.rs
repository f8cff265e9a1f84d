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

use crate::transform::{random_angle, rotate_about, Rotation};
use crate::Chain;
use nalgebra::Unit;
use rand::prelude::*;

/// Smallest sine of the angle between the bond `k → k+1` and the rotation axis
const COLLINEAR_TOLERANCE: f64 = 1e-3;

/// Spike (crankshaft) move at bead `k`.
///
/// Bead `k+1` is rotated by a random angle around the axis through its two
/// neighbours, `k` and `k+2`. This moves a single bead on a circle and
/// preserves both of its bonds.
///
/// Collinear beads leave nothing to rotate and the move is rejected.
pub(super) fn propose(chain: &Chain, k: usize, rng: &mut impl Rng) -> Option<Chain> {
    let angle = random_angle(rng);
    let pivot = chain.position(k);
    let arm = chain.position(k + 1) - pivot;
    let axis = Unit::try_new(chain.position(k + 2) - pivot, f64::EPSILON)?;
    if arm.cross(axis.as_ref()).norm() < COLLINEAR_TOLERANCE * arm.norm() {
        log::trace!("collinear beads around {}", k + 1);
        return None;
    }
    let rotation = Rotation::from_axis_angle(&axis, angle);
    let mut candidate = chain.clone();
    candidate.positions_mut()[k + 1] = rotate_about(pivot, &rotation, chain.position(k + 1), false);
    (!candidate.is_overlapping(k + 1..k + 2)).then_some(candidate)
}
