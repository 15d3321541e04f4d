//! `trackerctl` – operator CLI for the Election Tracker.
//!
//! `doctor` explains why the local dev server is unreachable; `check` runs
//! one doctor step on its own; `seed` loads the candidate fixture into the
//! database.

mod config;
mod logging;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use engine::seed::{self, SqliteCandidateStore};
use engine::traits::{ProgressSink, SilentSink};
use engine::types::*;
use engine::ProbeContext;
use logging::Redactor;
use render::ConsoleReporter;
use std::path::{Path, PathBuf};
use std::time::Instant;

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "trackerctl",
    version,
    about = "Operator CLI for the Election Tracker"
)]
struct Cli {
    /// Extra YAML configuration file layered over trackerctl.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log engine activity at debug level (stderr).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every startup check and print a diagnosis.
    Doctor {
        /// Project root the checks run against.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
        /// Write result JSON to this path.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Exit with status 1 when the diagnosis is critical.
        #[arg(long)]
        fail_on_critical: bool,
    },

    /// Run a single doctor step.
    Check {
        step: CheckStep,
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace the candidates table with the fixture set.
    Seed {
        /// SQLite database file (created if missing).
        #[arg(long)]
        database: PathBuf,
        /// Candidate fixture YAML; defaults to the bundled sample set.
        #[arg(long)]
        fixture: Option<PathBuf>,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckStep {
    Files,
    Scripts,
    Ports,
    Server,
    Env,
}

impl From<CheckStep> for Step {
    fn from(s: CheckStep) -> Self {
        match s {
            CheckStep::Files => Step::Files,
            CheckStep::Scripts => Step::Scripts,
            CheckStep::Ports => Step::Ports,
            CheckStep::Server => Step::Server,
            CheckStep::Env => Step::Environment,
        }
    }
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_config = config::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    logging::init_logging(&app_config.logging, cli.verbose);
    let redactor = Redactor::from_config(&app_config.logging.redaction);

    match cli.command {
        Commands::Doctor {
            root,
            json,
            out,
            fail_on_critical,
        } => {
            let ctx = probe_context(&app_config, root)?;
            cmd_doctor(&ctx, json, out.as_deref(), fail_on_critical, redactor).await
        }
        Commands::Check { step, root, json } => {
            let ctx = probe_context(&app_config, root)?;
            cmd_check(step.into(), &ctx, json, redactor).await;
            Ok(())
        }
        Commands::Seed {
            database,
            fixture,
            yes,
            json,
        } => cmd_seed(&database, fixture.as_deref(), yes, json),
    }
}

fn probe_context(app_config: &config::AppConfig, root: PathBuf) -> anyhow::Result<ProbeContext> {
    ProbeContext::default_platform(app_config.doctor.clone(), root)
        .context("failed to initialise probe context")
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

async fn cmd_doctor(
    ctx: &ProbeContext,
    json: bool,
    out: Option<&Path>,
    fail_on_critical: bool,
    redactor: Redactor,
) -> anyhow::Result<()> {
    let result = if json {
        engine::doctor::run_doctor(ctx, &mut SilentSink).await
    } else {
        let mut reporter = ConsoleReporter::new(std::io::stdout(), &ctx.config.manifest, redactor);
        reporter.banner();
        engine::doctor::run_doctor(ctx, &mut reporter).await
    };

    if let Some(path) = out {
        write_result_file(path, &result)?;
    }
    if json {
        print_json(&result);
    }

    if fail_on_critical && result.status == Status::Fail {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_check(step: Step, ctx: &ProbeContext, json: bool, redactor: Redactor) {
    let mut silent = SilentSink;
    let mut reporter = ConsoleReporter::new(std::io::stdout(), &ctx.config.manifest, redactor);
    let sink: &mut dyn ProgressSink = if json { &mut silent } else { &mut reporter };

    let result = engine::doctor::run_check(step, ctx, sink).await;
    output_result(&result, json);
}

fn cmd_seed(database: &Path, fixture: Option<&Path>, yes: bool, json: bool) -> anyhow::Result<()> {
    let run_id = new_run_id();
    let start = Instant::now();
    let target = database.display().to_string();

    let yaml = match fixture {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(yaml) => yaml,
            Err(e) => {
                let message = format!("cannot read fixture {}: {}", path.display(), e);
                let r = seed_failure(&target, &run_id, 0, ErrorCode::IoError, message);
                output_result(&r, json);
                return Ok(());
            }
        },
        None => seed::DEFAULT_FIXTURE.to_string(),
    };
    let candidates = match seed::load_fixture(&yaml) {
        Ok(c) => c,
        Err(e) => {
            let r = seed_failure(&target, &run_id, 0, ErrorCode::InvalidInput, e.to_string());
            output_result(&r, json);
            return Ok(());
        }
    };

    if !yes {
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Replace every row in the candidates table of {} with {} candidates?",
                target,
                candidates.len()
            ))
            .default(false)
            .interact()
            .context("confirmation needs a terminal; pass --yes to skip it")?;
        if !proceed {
            println!("Aborted; database left unchanged.");
            return Ok(());
        }
    }

    let outcome = SqliteCandidateStore::open(database)
        .and_then(|mut store| seed::seed_candidates(&mut store, &candidates));
    let elapsed = start.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(summary) => {
            if !json {
                println!("Cleared {} existing candidates", summary.deleted);
                println!("Inserted {} candidates", summary.inserted);
                println!("Total candidates in database: {}", summary.total);
                println!("Candidates per election:");
                for (election, count) in &summary.per_election {
                    println!("  Election {}: {} candidates", election, count);
                }
            }
            let timing = TimingInfo {
                total: elapsed,
                ..TimingInfo::default()
            };
            let mut r = result_with_status("seed", &target, &run_id, Status::Pass, timing);
            r.data = Some(serde_json::to_value(&summary).unwrap_or_default());
            r
        }
        Err(e) => {
            tracing::error!(error = %e, database = %target, "seeding failed");
            seed_failure(&target, &run_id, elapsed, e.error_code(), e.to_string())
        }
    };
    output_result(&result, json);
    Ok(())
}

/// A failed seed is a `fail` result (exit 1), whatever broke.
fn seed_failure(
    target: &str,
    run_id: &str,
    elapsed: u64,
    code: ErrorCode,
    message: impl Into<String>,
) -> RunResult {
    let mut r = result_err("seed", target, run_id, elapsed, code, message);
    r.status = Status::Fail;
    r
}

// ===========================================================================
// Output helpers
// ===========================================================================

fn print_json(result: &RunResult) {
    let j = serde_json::to_string_pretty(result).unwrap_or_default();
    println!("{}", j);
}

fn output_result(result: &RunResult, json: bool) {
    if json {
        print_json(result);
    } else {
        render::print_summary(result);
    }

    if let Some(code) = exit_code(result.status) {
        std::process::exit(code);
    }
}

/// Non-zero exit status for failed runs: 1 for `fail`, 2 for `error`.
fn exit_code(status: Status) -> Option<i32> {
    match status {
        Status::Pass | Status::Warn => None,
        Status::Fail => Some(1),
        Status::Error => Some(2),
    }
}

fn write_result_file(path: &Path, result: &RunResult) -> anyhow::Result<()> {
    let j = serde_json::to_string_pretty(result)?;
    std::fs::write(path, j).with_context(|| format!("failed to write result to {}", path.display()))
}
