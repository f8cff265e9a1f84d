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

use crate::{
    analysis::{output_file, ChainPlot, OutputKind},
    config::{Input, DEFAULT_D_MAX, DEFAULT_TOLERANCE},
    io::xyz,
    montecarlo::Frequency,
    plot::Gnuplot,
    replica::{ReplicaExchange, ReplicaOptions},
    state::{State, STATE_FILE},
    Chain, ContactMap, NativePotential, Simulation,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use pretty_env_logger::env_logger::DEFAULT_FILTER_ENV;
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::{io::Write, path::PathBuf};

/// Iterations between progress updates and `latest.xyz` snapshots
const PROGRESS_INTERVAL: usize = 10_000;
/// Iterations between redrawn energy plots
const ENERGY_PLOT_INTERVAL: usize = 100_000;
/// Sweeps between saved energies in single temperature runs
const ENERGY_SWEEPS: usize = 1000;
/// Sweeps between saved conformations in single temperature runs
const TRAJECTORY_SWEEPS: usize = 5000;

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fold a chain at a single temperature
    #[clap(arg_required_else_help = true)]
    Simulate {
        /// Native structure; XYZ file or built-in name (1PGB, 2GB1)
        reference: String,
        /// Temperature in units of the contact energy
        #[clap(long, short = 't')]
        temperature: f64,
        /// Resume from the last frame of an XYZ file
        #[clap(long, short = 'r')]
        resume: Option<PathBuf>,
        /// Contact cutoff
        #[clap(long = "dmax", default_value_t = DEFAULT_D_MAX)]
        d_max: f64,
        /// Tolerance of the native potential
        #[clap(long = "a", default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
        /// Maximum number of iterations
        #[clap(long, short = 'n', default_value_t = 10_000_000)]
        iterations: usize,
        /// Random seed
        #[clap(long)]
        seed: Option<u64>,
        /// Directory for energy and trajectory files
        #[clap(long, default_value = ".")]
        output_dir: PathBuf,
        /// Plot the chain with gnuplot
        #[clap(long, short = 'g', action)]
        plot: bool,
    },
    /// Fold a chain with replica exchange
    #[clap(arg_required_else_help = true)]
    Replicas {
        /// Input file in YAML format
        #[clap(long, short = 'i')]
        input: PathBuf,
        /// Scramble and thermalize, then save the state and stop
        #[clap(long, action, conflicts_with = "resume")]
        setup_only: bool,
        /// Continue from saved state instead of scrambling
        #[clap(long, alias = "simulate-only", action)]
        resume: bool,
        /// Plot the coldest replica with gnuplot
        #[clap(long, short = 'g', action)]
        plot: bool,
    },
    /// Compare a conformation to a native structure
    #[clap(arg_required_else_help = true)]
    Potential {
        /// Native structure; XYZ file or built-in name
        #[clap(long)]
        reference: String,
        /// Contact cutoff
        #[clap(long = "dmax")]
        d_max: f64,
        /// Tolerance of the native potential
        #[clap(long = "a")]
        tolerance: f64,
        /// Conformation to evaluate; XYZ file or built-in name
        file: String,
    },
    /// Plot a structure and optionally its contact map
    #[clap(arg_required_else_help = true)]
    View {
        /// Contact cutoff; plots the contact map if given
        #[clap(short = 'd')]
        d_max: Option<f64>,
        /// XYZ file or built-in name
        file: String,
    },
    /// Plot every frame of a trajectory
    #[clap(arg_required_else_help = true)]
    Play {
        /// XYZ trajectory
        file: PathBuf,
    },
}

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// Verbose output. See more with e.g. RUST_LOG=Trace
    #[clap(long, short = 'v', action)]
    pub verbose: bool,
    /// Output file in YAML format
    #[clap(long, short = 'o', default_value = "output.yaml")]
    pub output: PathBuf,
}

pub fn do_main() -> Result<()> {
    let args = Args::parse();
    if std::env::var(DEFAULT_FILTER_ENV).is_err() {
        std::env::set_var(
            DEFAULT_FILTER_ENV,
            if args.verbose { "Debug" } else { "Info" },
        );
    }
    pretty_env_logger::init();

    let mut yaml_output = std::fs::File::create(&args.output)
        .with_context(|| format!("Cannot create {}", args.output.display()))?;

    match args.command {
        Commands::Simulate {
            reference,
            temperature,
            resume,
            d_max,
            tolerance,
            iterations,
            seed,
            output_dir,
            plot,
        } => {
            let options = SimulateOptions {
                temperature,
                d_max,
                tolerance,
                iterations,
                seed: seed.unwrap_or_else(|| rand::thread_rng().gen()),
                output_dir,
                plot,
            };
            simulate(&reference, resume, options, &mut yaml_output)?;
        }
        Commands::Replicas {
            input,
            setup_only,
            resume,
            plot,
        } => {
            replicas(input, setup_only, resume, plot, &mut yaml_output)?;
        }
        Commands::Potential {
            reference,
            d_max,
            tolerance,
            file,
        } => {
            potential(&reference, d_max, tolerance, &file, &mut yaml_output)?;
        }
        Commands::View { d_max, file } => view(&file, d_max)?,
        Commands::Play { file } => play(file)?,
    }
    Ok(())
}

/// Helper function to serialize data to an existing YAML file
fn write_yaml<T: serde::Serialize>(
    data: &T,
    output: &mut std::fs::File,
    key: Option<&str>,
) -> Result<()> {
    match key {
        Some(key) => {
            let mut wrapper = std::collections::BTreeMap::new();
            wrapper.insert(key.to_string(), data);
            let yaml = serde_yaml::to_string(&wrapper)?;
            output.write_all(yaml.as_bytes())?;
        }
        None => {
            let yaml = serde_yaml::to_string(data)?;
            output.write_all(yaml.as_bytes())?;
        }
    }
    Ok(())
}

/// Start gnuplot if requested; failure to start only disables plotting.
fn maybe_gnuplot(plot: bool) -> Option<Gnuplot> {
    if !plot {
        return None;
    }
    Gnuplot::spawn()
        .map_err(|err| log::warn!("Plotting disabled: {}", err))
        .ok()
}

struct SimulateOptions {
    temperature: f64,
    d_max: f64,
    tolerance: f64,
    iterations: usize,
    seed: u64,
    output_dir: PathBuf,
    plot: bool,
}

fn simulate(
    reference: &str,
    resume: Option<PathBuf>,
    options: SimulateOptions,
    yaml_output: &mut std::fs::File,
) -> Result<()> {
    let native = Chain::load(reference)?;
    let contacts = Arc::new(ContactMap::new(&native, options.d_max)?);
    let mut simulation = Simulation::new(
        contacts.clone(),
        options.tolerance,
        options.temperature,
        options.seed,
    )?;
    log::info!("{} with seed {}", simulation, options.seed);

    let num_beads = native.len();
    std::fs::create_dir_all(&options.output_dir)?;
    simulation.add_output_files(
        &options.output_dir,
        Frequency::Every(ENERGY_SWEEPS * num_beads),
        Frequency::Every(TRAJECTORY_SWEEPS * num_beads),
    )?;
    if let Some(gnuplot) = maybe_gnuplot(options.plot) {
        simulation.add_analysis(Box::new(ChainPlot::new(
            gnuplot,
            Frequency::Every(PROGRESS_INTERVAL),
        )));
    }

    let reference_energy = NativePotential::new(options.tolerance)?.energy(&native, &contacts);
    match resume {
        Some(path) => {
            let chain = Chain::try_from(xyz::read_latest(&path)?)
                .with_context(|| format!("Invalid chain in {}", path.display()))?;
            let energy = NativePotential::new(options.tolerance)?.checked_energy(&chain, &contacts)?;
            log::info!("Resuming from {} with energy {:.3}", path.display(), energy);
            simulation.initialize(chain, energy)?;
        }
        None => simulation.first_iteration(&native)?,
    }

    let energy_file = output_file(
        &options.output_dir,
        OutputKind::Energy,
        options.temperature,
        contacts.d_max(),
        simulation.tolerance(),
    );
    let mut energy_plot = maybe_gnuplot(options.plot);

    let latest = options.output_dir.join("latest.xyz");
    let pb = ProgressBar::new(options.iterations as u64);
    for iteration in 1..=options.iterations {
        simulation.next_iteration()?;
        if iteration % PROGRESS_INTERVAL == 0 {
            pb.set_position(iteration as u64);
            if let Some(chain) = simulation.chain() {
                xyz::write_frame(&latest, &chain.to_frame("Protein"), false)?;
            }
        }
        if let Some(gnuplot) = energy_plot.as_mut().filter(|_| iteration % ENERGY_PLOT_INTERVAL == 0) {
            simulation.flush();
            if let Err(err) = gnuplot.plot_energies(&energy_file) {
                log::warn!("Energy plot failed: {}", err);
            }
        }
        if simulation.has_converged(reference_energy) {
            log::info!("Reached the native energy after {} iterations", iteration);
            break;
        }
    }
    pb.finish();
    simulation.flush();

    log::info!(
        "Energy {:.3} of native {:.3}; acceptance ratio {:.3}",
        simulation.energy().unwrap_or(f64::NAN),
        reference_energy,
        simulation.acceptance_ratio()
    );
    write_yaml(&simulation.summary(), yaml_output, Some("simulation"))?;
    Ok(())
}

fn replicas(
    input: PathBuf,
    setup_only: bool,
    resume: bool,
    plot: bool,
    yaml_output: &mut std::fs::File,
) -> Result<()> {
    let input = Input::from_file(&input)?;
    let reference = input.reference_chain()?;
    let options = ReplicaOptions::from(&input);
    let mut replicas = ReplicaExchange::new(&reference, &options)?;
    let output_dir = &input.output_dir;
    let state_file = output_dir.join(STATE_FILE);
    write_yaml(&input, yaml_output, Some("input"))?;

    replicas.add_output_files(output_dir)?;
    if let Some(gnuplot) = maybe_gnuplot(plot) {
        let frequency = Frequency::Every(input.schedule.energy_frequency * reference.len());
        if let Some(coldest) = replicas.replica_mut(0) {
            coldest.add_analysis(Box::new(ChainPlot::new(gnuplot, frequency)));
        }
    }

    if resume {
        if state_file.exists() {
            log::info!("Resuming from {}", state_file.display());
            replicas.restore(&State::from_file(&state_file)?)?;
        } else {
            log::info!("Resuming from trajectories in {}", output_dir.display());
            replicas.resume_from_trajectories(output_dir)?;
        }
    } else {
        replicas.first_iteration()?;
        replicas.thermalize(input.schedule.thermalization)?;
        replicas.state()?.to_file(&state_file)?;
        if setup_only {
            log::info!("Saved state to {}", state_file.display());
            write_yaml(&replicas.summary(), yaml_output, Some("replicas"))?;
            return Ok(());
        }
    }

    let cancel = AtomicBool::new(false);
    let pb = ProgressBar::new(input.schedule.cycles as u64);
    replicas.run(input.schedule.cycles, &cancel, |replicas| {
        pb.inc(1);
        if let Err(err) = replicas.state().and_then(|state| state.to_file(&state_file)) {
            log::warn!("Checkpoint failed: {}", err);
        }
    })?;
    pb.finish();
    replicas.state()?.to_file(&state_file)?;

    for line in replicas.to_string().lines() {
        log::info!("{}", line);
    }
    if replicas.has_converged() {
        log::info!("A replica reached the native energy");
    }
    write_yaml(&replicas.summary(), yaml_output, Some("replicas"))?;
    Ok(())
}

#[derive(Serialize)]
struct PotentialReport {
    num_contacts: usize,
    energy: f64,
    native_energy: f64,
    only_in_reference: Vec<(usize, usize)>,
    only_in_conformation: Vec<(usize, usize)>,
}

fn potential(
    reference: &str,
    d_max: f64,
    tolerance: f64,
    file: &str,
    yaml_output: &mut std::fs::File,
) -> Result<()> {
    let native = Chain::load(reference)?;
    let chain = Chain::load(file)?;
    let native_map = ContactMap::new(&native, d_max)?;
    let map = ContactMap::new(&chain, d_max)?;
    let diff = native_map.diff(&map)?;
    let potential = NativePotential::new(tolerance)?;
    let energy = potential.checked_energy(&chain, &native_map)?;
    print!("{}", diff);
    println!("{:.6}", energy);

    let report = PotentialReport {
        num_contacts: native_map.num_contacts(),
        energy,
        native_energy: potential.energy(&native, &native_map),
        only_in_reference: diff.only_in_first,
        only_in_conformation: diff.only_in_second,
    };
    write_yaml(&report, yaml_output, Some("potential"))
}

fn view(file: &str, d_max: Option<f64>) -> Result<()> {
    let chain = Chain::load(file)?;
    Gnuplot::spawn()?.plot_chain(&chain, file)?;
    if let Some(d_max) = d_max {
        let contacts = ContactMap::new(&chain, d_max)?;
        let energy = NativePotential::new(DEFAULT_TOLERANCE)?.energy(&chain, &contacts);
        let caption = format!(
            "{} (native contacts: {}, energy: {:.3})",
            file,
            contacts.num_contacts(),
            energy
        );
        Gnuplot::spawn()?.plot_contact_map(&contacts, &caption)?;
    }
    Ok(())
}

fn play(file: PathBuf) -> Result<()> {
    let frames = xyz::read_trajectory(&file)?;
    log::info!("{} frames in {}", frames.len(), file.display());
    let mut gnuplot = Gnuplot::spawn()?;
    for (number, frame) in frames.into_iter().enumerate() {
        let chain = Chain::try_from(frame)?;
        gnuplot.plot_chain(&chain, &format!("{} (frame {})", file.display(), number + 1))?;
    }
    Ok(())
}
