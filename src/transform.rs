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

//! Rigid transformations of beads

use crate::Point;
use nalgebra::{Quaternion, Rotation3, UnitQuaternion};
use rand::prelude::*;
use rand_distr::StandardNormal;

pub type Rotation = Rotation3<f64>;

/// Generate a uniformly distributed random unit quaternion.
///
/// Four independent standard normal numbers are normalized which gives
/// a uniform distribution on the 3-sphere and hence on the rotation group.
/// See Graphics Gems III, p. 129.
pub fn random_unit_quaternion(rng: &mut (impl Rng + ?Sized)) -> UnitQuaternion<f64> {
    loop {
        let q = Quaternion::new(
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
        );
        if q.norm_squared() > f64::EPSILON {
            return UnitQuaternion::from_quaternion(q);
        }
    }
}

/// Random rotation matrix, uniformly distributed over SO(3).
pub fn random_rotation(rng: &mut (impl Rng + ?Sized)) -> Rotation {
    random_unit_quaternion(rng).to_rotation_matrix()
}

/// Rotation by `angle` around the z-axis of the ambient frame.
pub fn z_rotation(angle: f64) -> Rotation {
    Rotation::from_axis_angle(&Point::z_axis(), angle)
}

/// Random angle in `[0, 2π)`.
pub fn random_angle(rng: &mut (impl Rng + ?Sized)) -> f64 {
    rng.gen_range(0.0..std::f64::consts::TAU)
}

/// Rotate `point` around `pivot` using the rotation `rotation`, `b ← a + R(b - a)`.
///
/// If `transpose` is true, the inverse rotation `Rᵀ` is used which undoes
/// a previous call with the same pivot.
pub fn rotate_about(pivot: &Point, rotation: &Rotation, point: &Point, transpose: bool) -> Point {
    let arm = point - pivot;
    let rotated = if transpose {
        rotation.inverse_transform_vector(&arm)
    } else {
        rotation * arm
    };
    debug_assert!(
        (rotated.norm() - arm.norm()).abs() <= 1e-9 * arm.norm().max(1.0),
        "rotation changed the distance to the pivot"
    );
    pivot + rotated
}

/// Triple scalar product, `⟨u, v × w⟩`.
pub fn triple_product(u: &Point, v: &Point, w: &Point) -> f64 {
    u.dot(&v.cross(w))
}
