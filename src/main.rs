mod cli_progress;
mod commands;
mod logging;

use std::collections::HashSet;
use std::io;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ReconcileArgs};
use dotenv::dotenv;
use dupe_reconciler::clients::{ArrClient, LibraryService, PlexClient};
use dupe_reconciler::confirm::{Approval, ApprovalPolicy, ConsolePrompt, PresetApproval};
use dupe_reconciler::engine::{InstanceStatus, RunSummary};
use dupe_reconciler::model::ActionMode;
use dupe_reconciler::{config, AppConfig, ReconcileEngine, RunContext, RunSettings};
use tracing::{error, info};

use cli_progress::CliReporter;

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();

    let config = config::load_configuration(args.config.as_deref());
    let configured_log_file = config
        .as_ref()
        .ok()
        .and_then(|c| c.logging.log_file.clone());
    let _guard = logging::init_logger(configured_log_file.as_deref());

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Some(Commands::Reconcile(run_args)) => match run_reconcile(&config, &run_args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("Error: {:#}", err);
                ExitCode::FAILURE
            }
        },
        Some(Commands::PrintConfig) => match toml::to_string_pretty(&config.redacted()) {
            Ok(rendered) => {
                println!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("Error rendering configuration: {}", err);
                ExitCode::FAILURE
            }
        },
        None => {
            let _ = Cli::command().print_long_help();
            ExitCode::SUCCESS
        }
    }
}

/// Fails only when the run cannot start: unknown instance filter or an
/// unreachable library server. Per-instance failures end up in the summary.
fn run_reconcile(config: &AppConfig, args: &ReconcileArgs) -> anyhow::Result<()> {
    let mut instances = config.instances();
    if !args.instances.is_empty() {
        let known: HashSet<&str> = instances.iter().map(|i| i.name.as_str()).collect();
        if let Some(unknown) = args.instances.iter().find(|n| !known.contains(n.as_str())) {
            bail!("no configured instance named '{}'", unknown);
        }
        instances.retain(|i| args.instances.contains(&i.name));
    }

    let library = PlexClient::new(&config.library.url, &config.library.token);
    library
        .check_connection()
        .with_context(|| format!("cannot reach library server at {}", config.library.url))?;
    info!("Connected to library server at {}", config.library.url);

    let engine = ReconcileEngine::new(RunContext {
        library: Box::new(library),
        acquisition: Box::new(ArrClient::new()),
        instances,
        settings: RunSettings {
            dry_run: args.dry_run,
            quarantine_dir: config.general.trash_directory.clone(),
            report_dir: config.general.report_directory.clone(),
        },
    });

    let mut policy: Box<dyn ApprovalPolicy> = match (args.yes, args.mode) {
        (true, Some(mode)) => Box::new(PresetApproval::new(Approval::All, mode.into())),
        _ => Box::new(ConsolePrompt::new(io::stdin().lock(), io::stdout())),
    };

    let reporter = CliReporter::new();
    let summary = engine.run(policy.as_mut(), &reporter);
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for outcome in &summary.instances {
        let line = match &outcome.status {
            InstanceStatus::Clean => "nothing to clean".green().to_string(),
            InstanceStatus::DryRun { decisions, report } => format!(
                "{} items would be cleaned, report: {}",
                format!("{}", decisions).yellow(),
                report.display()
            ),
            InstanceStatus::Declined { decisions } => {
                format!("{} items left untouched", decisions).yellow().to_string()
            }
            InstanceStatus::Processed {
                mode,
                tally,
                leftovers,
            } => format!(
                "{} {} files, {} not found, {} failed, {} still in place",
                format!("{}", tally.succeeded()).green(),
                match mode {
                    ActionMode::Delete => "deleted",
                    ActionMode::Move => "moved",
                },
                format!("{}", tally.not_found).yellow(),
                format!("{}", tally.failed).red(),
                leftovers.len()
            ),
            InstanceStatus::Failed(err) => format!("{} {}", "failed:".red(), err),
        };
        info!("{}: {}", outcome.name.bold(), line);
    }
    if summary.failed() > 0 {
        error!("{} instance(s) failed; see the log for details", summary.failed());
    }
}
