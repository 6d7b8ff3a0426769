//! # FSRU Simulator Entry Point
//!
//! This binary loads the configuration and access calendars, runs the resupply
//! simulation over the full horizon and prints the operability summary.
//!
//! ```text
//! fsru-sim [--config <path>] [--ascii] [--json <path>]
//! ```
//!
//! - `--config <path>`: configuration file (default `fsru-config.toml`, falling back
//!   to built-in defaults when absent)
//! - `--ascii`: draw the FSRU level and LNGC cargo charts in the terminal
//! - `--json <path>`: write the level traces, voyages and summary as JSON
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use anyhow::Context;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fsru_sim_lib::calendar::{self, CalendarError};
use fsru_sim_lib::config::Config;
use fsru_sim_lib::fallback;
use fsru_sim_lib::renderer::{draw_ascii, ChartLimits};
use fsru_sim_lib::report::OperabilityReport;
use fsru_sim_lib::simulation::{Simulation, SimulationOutcome};
use fsru_sim_lib::{Resource, TraceRecorder};

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Value following `flag` on the command line, if any.
fn flag_value(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

#[derive(Serialize)]
struct RunExport<'a> {
    report: &'a OperabilityReport,
    outcome: &'a SimulationOutcome,
    trace: &'a TraceRecorder,
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    enable_tracing();

    let args: Vec<String> = env::args().collect();
    let ascii = args.iter().any(|arg| arg == "--ascii");

    let config = match flag_value(&args, "--config") {
        Some(path) => Config::try_load_from_path(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load(),
    };
    config.validate().context("invalid configuration")?;

    // Missing or broken calendar exports are expected during planning studies;
    // the synthetic tide model keeps the run going.
    let calendars = calendar::load(&config.calendar).unwrap_or_else(|error| {
        match error {
            CalendarError::NotConfigured => {
                info!("no calendar files configured, using synthetic tide windows")
            }
            error => warn!(%error, "calendar load failed, using synthetic tide windows"),
        }
        fallback::synthesize(&config.calendar)
    });

    let mut simulation = Simulation::new(&config, calendars).context("building simulation")?;
    let mut recorder = TraceRecorder::with_capacity(simulation.horizon());
    let outcome = simulation
        .run(&mut recorder)
        .context("running simulation")?;

    let report = OperabilityReport::from_trace(&recorder.fsru, config.fsru.min_operable);
    println!("{report}");
    if let Some(at) = report.first_shortfall.and_then(|tick| simulation.timestamp(tick)) {
        println!("first shortfall at {at}");
    }
    println!(
        "voyages: {}, delivered: {:.0} m³, final FSRU level: {:.0} m³",
        outcome.voyages.len(),
        outcome
            .voyages
            .iter()
            .map(|v| v.discharge.delivered)
            .sum::<f64>(),
        outcome.final_fsru_level
    );

    for voyage in &outcome.voyages {
        let called = voyage.discharge.called_at;
        let wall_clock = simulation
            .timestamp(called)
            .map(|at| format!(" ({at})"))
            .unwrap_or_default();
        println!(
            "  voyage {}: called at tick {called}{wall_clock}, delivered {:.0} m³",
            voyage.discharge.id, voyage.discharge.delivered
        );
    }

    if ascii {
        for resource in [Resource::Fsru, Resource::Lngc] {
            draw_ascii(
                recorder.trace(resource),
                ChartLimits::for_resource(&config, resource),
            );
        }
    }

    if let Some(path) = flag_value(&args, "--json") {
        let export = RunExport {
            report: &report,
            outcome: &outcome,
            trace: &recorder,
        };
        let data = serde_json::to_vec_pretty(&export).context("serializing run")?;
        fs::write(&path, data).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "run exported");
    }

    Ok(())
}
