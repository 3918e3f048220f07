// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Run collective operations on a simulated distributed system.
//!
//! See `lib.rs` for details.
use std::path::PathBuf;

use clap::Parser;
use dsim_collectives::{Collective, Strategy};
use dsim_engine::config::Config;
use dsim_engine::sim_error;
use dsim_engine::types::{SimError, SimResult};
use dsim_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use dsim_track::entity::toplevel;
use dsim_track::{Tracker, error, info, warn};
use indicatif::ProgressBar;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sim_collectives::{Scenario, check_results, scenarios, seed_data, simulate};

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Collective communication on a simulated distributed system")]
struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// Also write log messages to this file.
    #[arg(long)]
    log_file: Option<String>,

    /// Level of log message to write to `--log-file`.
    #[arg(long, default_value = "Trace")]
    log_file_level: log::Level,

    /// Set a regular expression for which entites should have file logging
    /// level set to `--log-file-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    log_file_filter_regex: String,

    /// Show a progress bar counting the scenarios run.
    #[arg(long)]
    progress: bool,

    /// TOML file with the system configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The collective to run. All collectives are run if not given.
    #[arg(long)]
    collective: Option<Collective>,

    /// The strategy to use. Both strategies are run if not given.
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Override the number of nodes in the system.
    #[arg(long)]
    nodes: Option<usize>,

    /// Run on 2, 4, ... 2^N nodes instead of a single system size.
    #[arg(long)]
    power_series: Option<u32>,

    /// The number of values contributed by each node.
    #[arg(long, default_value = "4")]
    payload_len: usize,

    /// Override the fixed cost of every send, in microseconds.
    #[arg(long)]
    connection_delay_us: Option<u64>,

    /// Override the cost of every send per value, in nanoseconds.
    #[arg(long)]
    transmission_delay_per_unit_ns: Option<u64>,

    /// Seed for the random initial data.
    #[arg(long)]
    seed: Option<u64>,
}

fn setup_all_trackers(args: &Cli) -> SimResult<Tracker> {
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: args.stdout,
            level: args.stdout_level,
            filter_regex: &args.stdout_filter_regex,
            file: None,
        },
        log_file: TrackerConfig {
            enable: args.log_file.is_some(),
            level: args.log_file_level,
            filter_regex: &args.log_file_filter_regex,
            file: args.log_file.as_deref(),
        },
    };
    setup_trackers(&config).map_err(|e| SimError::Config(e.to_string()))
}

/// Configuration file and environment first, then the command line.
fn load_config(args: &Cli) -> SimResult<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(nodes) = args.nodes {
        config.number_of_nodes = nodes;
    }
    if let Some(delay) = args.connection_delay_us {
        config.connection_delay_us = delay;
    }
    if let Some(delay) = args.transmission_delay_per_unit_ns {
        config.transmission_delay_per_unit_ns = delay;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), SimError> {
    let args = Cli::parse();

    let tracker = setup_all_trackers(&args)?;
    let top = toplevel(&tracker, "top");
    let config = load_config(&args)?;

    if args.payload_len == 0 {
        return sim_error!("--payload-len must be at least 1");
    }

    let sizes: Vec<usize> = match args.power_series {
        Some(max_exponent) => (1..=max_exponent).map(|e| 1 << e).collect(),
        None => vec![config.number_of_nodes],
    };
    let collectives = args.collective.map_or(Collective::ALL.to_vec(), |c| vec![c]);
    let strategies = args.strategy.map_or(Strategy::ALL.to_vec(), |s| vec![s]);
    let all: Vec<Scenario> = scenarios(&collectives, &strategies, &sizes);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(top ;
        "Running {} scenarios, {} values per node, delays {}us + {}ns per value",
        all.len(),
        args.payload_len,
        config.connection_delay_us,
        config.transmission_delay_per_unit_ns
    );

    let progress_bar = if args.progress {
        ProgressBar::new(all.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let mut num_failed = 0;
    for scenario in &all {
        progress_bar.inc(1);
        if !scenario.is_supported() {
            warn!(top ; "Skipping {}: needs a power-of-two number of nodes", scenario);
            continue;
        }

        let initial = seed_data(
            scenario.collective,
            scenario.number_of_nodes,
            args.payload_len,
            &mut rng,
        );
        let result = simulate(&top, &config, scenario, initial.clone()).and_then(
            |(system, outcome)| {
                check_results(scenario.collective, &initial, &system)?;
                Ok(outcome)
            },
        );

        match result {
            Ok(outcome) => {
                info!(top ;
                    "{}: {} messages, {} values in {:.2?}",
                    scenario, outcome.messages, outcome.values, outcome.elapsed
                );
            }
            Err(e) => {
                error!(top ; "{}: {}", scenario, e);
                num_failed += 1;
            }
        }
    }
    progress_bar.finish();

    tracker.shutdown();
    if num_failed > 0 {
        return sim_error!(format!("{num_failed} of {} scenarios failed", all.len()));
    }
    info!(top ; "Pass");
    Ok(())
}
