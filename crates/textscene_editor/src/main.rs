// SPDX-License-Identifier: MIT OR Apache-2.0
//! `textscene` - command line host for text scenes
//!
//! Works on the project in the current directory, or the one given with
//! `--project`:
//! - `check` loads a scene and reports every warning of a load and a save
//! - `resave` loads a scene and writes it back in canonical form
//! - `stage` runs a staged save and reload through the temp directory
//! - `assets` lists the indexed assets with their ids

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use textscene_core::Warning;
use textscene_editor::{EditorSession, ProjectSettings, SaveReload, SessionError, StepResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Text scene tools
#[derive(Parser, Debug)]
#[command(name = "textscene", version, about = "Load, check and rewrite text scene documents")]
struct Cli {
    /// Project directory
    #[arg(long, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a scene and report warnings without writing anything
    Check {
        /// Project-relative scene path
        scene: String,
    },
    /// Load a scene and save it back in canonical form
    Resave {
        /// Project-relative scene path
        scene: String,
        /// Print the text instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Save a scene to the temp directory and load it back
    Stage {
        /// Project-relative scene path
        scene: String,
    },
    /// List indexed assets
    Assets,
}

fn init_logging(settings: &ProjectSettings) {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    match settings.log_filter.parse() {
        Ok(directive) => env_filter = env_filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log filter '{}': {}", settings.log_filter, e),
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report(warnings: &[Warning]) {
    for warning in warnings {
        println!("warning: {warning}");
    }
}

fn run(cli: Cli) -> Result<bool, SessionError> {
    let mut session = EditorSession::open(&cli.project)?;

    match cli.command {
        Command::Check { scene } => {
            let loaded = session.load(&scene)?;
            report(&loaded);
            let (_, encoded) = session.scene_text();
            report(&encoded);
            let total = loaded.len() + encoded.len();
            println!("{scene}: {} nodes, {total} warning(s)", session.scene().node_count());
            Ok(total == 0)
        }
        Command::Resave { scene, dry_run } => {
            report(&session.load(&scene)?);
            if dry_run {
                let (text, warnings) = session.scene_text();
                print!("{text}");
                report(&warnings);
                return Ok(warnings.is_empty());
            }
            session.save_current()?;
            println!("Saved {scene}");
            Ok(true)
        }
        Command::Stage { scene } => {
            report(&session.load(&scene)?);
            let mut staging = SaveReload::new(session.settings().staging);
            let result = staging.run(&mut session);
            if let Some(e) = staging.error() {
                println!("error: {e}");
            }
            println!("{scene}: staging {result:?}");
            Ok(result == StepResult::Complete)
        }
        Command::Assets => {
            for (path, meta) in session.assets().entries() {
                println!("{} {:<14} {}", meta.guid, meta.type_name, path);
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match ProjectSettings::load_or_default(&cli.project) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);
    tracing::info!("Starting textscene v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
