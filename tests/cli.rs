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

//! Command line tests running the beadfold binary.

mod common;

use beadfold::{io::xyz, state::State};
use common::{count_lines, run_beadfold, scratch_dir};

#[test]
fn potential_of_native_structure() {
    let dir = scratch_dir("potential");
    let output = dir.join("output.yaml");
    let result = run_beadfold(
        &["potential", "--reference", "1PGB", "--dmax", "10", "--a", "0.9", "1PGB"],
        &output,
    );
    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert_eq!(stdout.trim(), "-366.000000");
    let yaml = std::fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("num_contacts: 366"));
}

#[test]
fn missing_reference_fails() {
    let dir = scratch_dir("missing");
    let result = run_beadfold(
        &["potential", "--reference", "/nonexistent.xyz", "--dmax", "10", "--a", "0.9", "1PGB"],
        &dir.join("output.yaml"),
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8(result.stderr).unwrap().contains("Error:"));
}

#[test]
fn simulate_writes_output_files() {
    let dir = scratch_dir("simulate");
    let output = dir.join("output.yaml");
    let dir_arg = dir.to_str().unwrap();
    let result = run_beadfold(
        &[
            "simulate", "-t", "0.5", "-n", "200", "--seed", "1", "--dmax", "10", "--a", "0.9",
            "--output-dir", dir_arg, "1PGB",
        ],
        &output,
    );
    assert!(result.status.success());
    let energies = dir.join("U--t-0.50000--dmax-10.00000--a-0.90000.dat");
    assert_eq!(count_lines(&energies), 1);
    let trajectory = dir.join("X--t-0.50000--dmax-10.00000--a-0.90000.xyz");
    assert_eq!(xyz::read_trajectory(&trajectory).unwrap().len(), 1);
    let yaml = std::fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("num_iterations: 200"));
}

fn write_input(dir: &std::path::Path) -> std::path::PathBuf {
    let input = dir.join("input.yaml");
    let yaml = format!(
        "reference: 1PGB
d_max: 10.0
tolerance: 0.9
temperatures: [1.0, 0.5]
seed: 3
schedule: {{thermalization: 2, sweeps_per_cycle: 2, cycles: 3, energy_frequency: 1, trajectory_frequency: 2}}
output_dir: {}
",
        dir.display()
    );
    std::fs::write(&input, yaml).unwrap();
    input
}

#[test]
fn replicas_run_and_resume() {
    let dir = scratch_dir("replicas");
    let input = write_input(&dir);
    let output = dir.join("output.yaml");
    let result = run_beadfold(&["replicas", "-i", input.to_str().unwrap()], &output);
    assert!(result.status.success());

    let state = State::from_file(dir.join("state.yaml")).unwrap();
    assert_eq!(state.cycle, 3);
    assert_eq!(state.replicas.len(), 2);
    assert_eq!(state.replicas[0].temperature, 0.5);
    // two replicas: the single pair is skipped when the offset is one
    let attempts = state.attempts[0];
    assert!(attempts <= 3);

    // one energy at start, two during thermalization and two per cycle
    let energies = dir.join("U--t-0.50000--dmax-10.00000--a-0.90000.dat");
    assert_eq!(count_lines(&energies), 9);
    let trajectory = dir.join("X--t-1.00000--dmax-10.00000--a-0.90000.xyz");
    assert_eq!(xyz::read_trajectory(&trajectory).unwrap().len(), 5);

    let result = run_beadfold(
        &["replicas", "-i", input.to_str().unwrap(), "--resume"],
        &output,
    );
    assert!(result.status.success());
    let state = State::from_file(dir.join("state.yaml")).unwrap();
    assert_eq!(state.cycle, 6);
    assert!(state.attempts[0] >= attempts && state.attempts[0] <= attempts + 3);
    assert_eq!(count_lines(&energies), 16);
}

#[test]
fn replicas_setup_only() {
    let dir = scratch_dir("setup");
    let input = write_input(&dir);
    let result = run_beadfold(
        &["replicas", "-i", input.to_str().unwrap(), "--setup-only"],
        &dir.join("output.yaml"),
    );
    assert!(result.status.success());
    let state = State::from_file(dir.join("state.yaml")).unwrap();
    assert_eq!(state.cycle, 0);
    assert_eq!(state.attempts, vec![0]);
    let energies = dir.join("U--t-1.00000--dmax-10.00000--a-0.90000.dat");
    assert_eq!(count_lines(&energies), 3);
}
