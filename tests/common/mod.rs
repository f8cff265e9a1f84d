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

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to the compiled beadfold binary.
pub fn beadfold_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_BIN_EXE_beadfold"));
    if !path.exists() {
        path = PathBuf::from("target/debug/beadfold");
    }
    path
}

/// Run beadfold with the given arguments and capture its output.
pub fn run_beadfold(args: &[&str], output: &Path) -> Output {
    Command::new(beadfold_binary())
        .arg("-o")
        .arg(output)
        .args(args)
        .output()
        .expect("failed to execute beadfold binary")
}

/// Fresh, empty scratch directory unique to `name`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("beadfold-{}-{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("failed to clean scratch dir");
    }
    std::fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}

/// Number of lines in a text file.
pub fn count_lines(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()))
        .lines()
        .count()
}
