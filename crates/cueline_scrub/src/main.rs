// SPDX-License-Identifier: MIT OR Apache-2.0
//! `cueline-scrub` - drive a Cueline track from a script.
//!
//! Loads a session config and the track document it names, replaces every
//! leaf with a probe, runs the scripted playback and scrub steps, and
//! prints each evaluation the leaves receive.
//!
//! Usage:
//!   cueline-scrub <SESSION>                   Run the session's script
//!   cueline-scrub --write-default <SESSION>   Write a sample session

mod config;
mod probe;
mod session;

use clap::Parser;
use config::ScrubConfig;
use cueline_sequencer::TrackDocument;
use probe::DispatchLog;
use session::{ScrubError, Session};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "cueline-scrub",
    about = "Drive a Cueline track through a scripted playback and scrub session",
    version
)]
struct Cli {
    /// Session config (RON)
    session: PathBuf,

    /// Write a sample session and track document instead of running
    #[arg(long)]
    write_default: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cueline-scrub: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ScrubError> {
    if cli.write_default {
        write_default(&cli.session)
    } else {
        scrub(&cli.session)
    }
}

fn init_logging(directive: &str) {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    match directive.parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => env_filter = env_filter.add_directive(directive),
        Err(e) => eprintln!("cueline-scrub: ignoring log filter {directive:?}: {e}"),
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn scrub(config_path: &Path) -> Result<(), ScrubError> {
    let config = ScrubConfig::load(config_path)?;
    init_logging(&config.log_filter);

    let document_path = config.document_path(config_path);
    tracing::debug!("Reading track document {:?}", document_path);
    let document = TrackDocument::from_ron(&std::fs::read_to_string(&document_path)?)?;

    let mut session = Session::new(&config, &document)?;
    println!("{} ({:.3}s)", session.track().name(), session.track().duration());
    let reports = session.run(&config.script)?;

    let mut all = Vec::new();
    for report in reports {
        println!("[{:>8.3}] {:?}", report.time, report.step);
        if let Some(rendered) = &report.rendered {
            for line in rendered.lines() {
                println!("    {line}");
            }
        }
        for dispatch in &report.dispatches {
            println!("    {dispatch}");
        }
        all.extend(report.dispatches);
    }

    println!("dispatches:");
    for (name, count) in DispatchLog::counts(&all) {
        println!("    {name}: {count}");
    }
    Ok(())
}

fn write_default(config_path: &Path) -> Result<(), ScrubError> {
    let config = ScrubConfig::default();
    let document = TrackDocument::new("sample")
        .with_leaf("fade_in", 1.0)
        .with_leaf("hold", 2.0)
        .with_leaf("fade_out", 1.0);

    config.save(config_path)?;
    std::fs::write(config.document_path(config_path), document.to_ron()?)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
