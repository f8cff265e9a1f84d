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

//! Integration tests for folding with the library API.

mod common;

use beadfold::{
    config::ScheduleBuilder, io::xyz, montecarlo, replica::ReplicaOptions, Chain, ContactMap,
    NativePotential, ReplicaExchange, Simulation,
};
use float_cmp::assert_approx_eq;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::{atomic::AtomicBool, Arc};

#[test]
fn native_energies() {
    let potential = NativePotential::new(0.9).unwrap();
    for (name, expected) in [("1PGB", -366.0), ("2GB1", -364.0)] {
        let chain = Chain::reference(name).unwrap();
        let contacts = ContactMap::new(&chain, 10.0).unwrap();
        assert_approx_eq!(f64, potential.energy(&chain, &contacts), expected);
    }
}

#[test]
fn homologous_structures_differ() {
    let first = ContactMap::new(&Chain::reference("1PGB").unwrap(), 10.0).unwrap();
    let second = ContactMap::new(&Chain::reference("2GB1").unwrap(), 10.0).unwrap();
    let diff = first.diff(&second).unwrap();
    assert!(!diff.is_empty());
    assert_eq!(
        diff.only_in_first.len() as isize - diff.only_in_second.len() as isize,
        2
    );
}

#[test]
fn scrambled_chain_is_unfolded() {
    let native = Chain::reference("1PGB").unwrap();
    let contacts = ContactMap::new(&native, 10.0).unwrap();
    let potential = NativePotential::new(0.9).unwrap();
    let mut chain = native.clone();
    montecarlo::scramble(&mut chain, &mut StdRng::seed_from_u64(5)).unwrap();
    assert!(!chain.has_overlap());
    for (a, b) in chain.bond_lengths().iter().zip(native.bond_lengths()) {
        assert_approx_eq!(f64, *a, b, epsilon = 1e-9);
    }
    assert!(potential.energy(&chain, &contacts) > -366.0 + 1.0);
}

#[test]
fn trajectory_of_a_simulation() {
    let dir = common::scratch_dir("trajectory");
    let native = Chain::reference("2GB1").unwrap().fragment(0..12).unwrap();
    let contacts = Arc::new(ContactMap::new(&native, 10.0).unwrap());
    let mut simulation = Simulation::new(contacts, 0.9, 0.4, 9).unwrap();
    simulation
        .add_output_files(
            &dir,
            montecarlo::Frequency::Every(12),
            montecarlo::Frequency::Every(24),
        )
        .unwrap();
    simulation.first_iteration(&native).unwrap();
    for _ in 0..10 {
        simulation.sweep().unwrap();
    }
    simulation.flush();

    let trajectory = dir.join("X--t-0.40000--dmax-10.00000--a-0.90000.xyz");
    assert_eq!(xyz::read_trajectory(&trajectory).unwrap().len(), 6);
    let latest = Chain::try_from(xyz::read_latest(&trajectory).unwrap()).unwrap();
    assert_eq!(latest.len(), 12);
    let energies = dir.join("U--t-0.40000--dmax-10.00000--a-0.90000.dat");
    assert_eq!(common::count_lines(&energies), 11);
}

#[test]
fn replica_exchange_of_a_fragment() {
    let native = Chain::reference("1PGB").unwrap().fragment(40..52).unwrap();
    let options = ReplicaOptions {
        temperatures: vec![0.2, 0.4, 0.8, 1.6],
        d_max: 10.0,
        tolerance: 0.9,
        seed: 21,
        schedule: ScheduleBuilder::default()
            .thermalization(10)
            .sweeps_per_cycle(5)
            .build()
            .unwrap(),
    };
    let mut replicas = ReplicaExchange::new(&native, &options).unwrap();
    replicas.first_iteration().unwrap();
    replicas.thermalize(replicas.schedule().thermalization).unwrap();
    let completed = replicas.run(30, &AtomicBool::new(false), |_| {}).unwrap();
    assert_eq!(completed, 30);

    // four replicas: one or two pairs per cycle depending on the offset
    let ratios = replicas.exchange_ratios();
    assert_eq!(ratios.len(), 3);
    assert!(ratios.iter().all(|r| (0.0..=1.0).contains(r)));
    assert!(replicas.total_exchanges() <= 60);

    let reference_energy = replicas.reference_energy();
    for replica in replicas.replicas() {
        assert!(replica.energy().unwrap() >= reference_energy - 1e-9);
    }
    let state = replicas.state().unwrap();
    assert_eq!(state.cycle, 30);
    assert_eq!(state.replicas.len(), 4);
}
