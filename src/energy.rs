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

//! # Native contact potential
//!
//! Go-like energy where each native contact forms a parabolic well of depth one
//! and half-width `a` around its native (signed) distance:
//!
//! ```text
//! u(r) = (r - d)² / a² - 1   if |r - d| < a
//!      = 0                   otherwise
//! ```
//!
//! A chain in its native structure hence has an energy equal to minus the
//! number of native contacts.

use crate::{Chain, ContactMap};
use serde::{Deserialize, Serialize};

/// Square-well native contact potential with tolerance `a`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePotential {
    tolerance: f64,
}

impl NativePotential {
    /// Create a potential with the half-width `tolerance` of each well.
    pub fn new(tolerance: f64) -> anyhow::Result<Self> {
        if !(tolerance > 0.0 && tolerance.is_finite()) {
            anyhow::bail!("Tolerance must be positive and finite, got {}", tolerance);
        }
        Ok(Self { tolerance })
    }

    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Contribution of a single contact at distance `r` with native distance `native`.
    #[inline]
    pub fn pair_energy(&self, r: f64, native: f64) -> f64 {
        let deviation = r - native;
        if deviation.abs() < self.tolerance {
            deviation.powi(2) / self.tolerance.powi(2) - 1.0
        } else {
            0.0
        }
    }

    /// Total energy of `chain` with respect to the native contacts in `contacts`.
    ///
    /// Chain and contact map must have the same number of beads.
    pub fn energy(&self, chain: &Chain, contacts: &ContactMap) -> f64 {
        debug_assert_eq!(chain.len(), contacts.num_beads());
        contacts
            .contacts()
            .map(|(i, j, native)| self.pair_energy(chain.signed_distance(i, j), native))
            .sum()
    }

    /// As [`NativePotential::energy`] but fails if the bead counts differ.
    pub fn checked_energy(&self, chain: &Chain, contacts: &ContactMap) -> anyhow::Result<f64> {
        if chain.len() != contacts.num_beads() {
            anyhow::bail!(
                "Chain of {} beads does not match contact map of {} beads",
                chain.len(),
                contacts.num_beads()
            );
        }
        Ok(self.energy(chain, contacts))
    }
}

impl crate::Info for NativePotential {
    fn short_name(&self) -> Option<&'static str> {
        Some("native")
    }
    fn long_name(&self) -> Option<&'static str> {
        Some("Square-well native contact potential")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn invalid_tolerance() {
        assert!(NativePotential::new(0.0).is_err());
        assert!(NativePotential::new(-0.9).is_err());
        assert!(NativePotential::new(f64::INFINITY).is_err());
    }

    #[test]
    fn pair_energy() {
        let u = NativePotential::new(0.9).unwrap();
        assert_approx_eq!(f64, u.pair_energy(5.0, 5.0), -1.0);
        assert_approx_eq!(f64, u.pair_energy(5.45, 5.0), 0.25 - 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, u.pair_energy(4.55, 5.0), 0.25 - 1.0, epsilon = 1e-12);
        assert_eq!(u.pair_energy(5.9, 5.0), 0.0);
        assert_eq!(u.pair_energy(-5.0, 5.0), 0.0);
        assert_eq!(u.pair_energy(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn native_energies() {
        let u = NativePotential::new(0.9).unwrap();
        for (name, expected) in [("1PGB", -366.0), ("2GB1", -364.0)] {
            let chain = Chain::reference(name).unwrap();
            let map = ContactMap::new(&chain, 10.0).unwrap();
            assert_approx_eq!(f64, u.energy(&chain, &map), expected);
        }
    }

    #[test]
    fn non_native_is_higher() {
        let u = NativePotential::new(0.9).unwrap();
        let target = Chain::reference("1PGB").unwrap();
        let other = Chain::reference("2GB1").unwrap();
        let map = ContactMap::new(&target, 10.0).unwrap();
        assert!(u.energy(&other, &map) > u.energy(&target, &map));
    }

    #[test]
    fn mismatched_lengths() {
        let u = NativePotential::new(0.9).unwrap();
        let chain = Chain::reference("1PGB").unwrap();
        let map = ContactMap::new(&chain, 10.0).unwrap();
        let fragment = chain.fragment(0..20).unwrap();
        assert!(u.checked_energy(&fragment, &map).is_err());
        assert_approx_eq!(f64, u.checked_energy(&chain, &map).unwrap(), -366.0);
    }
}
