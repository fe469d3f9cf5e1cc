use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use crate::clients::{AcquisitionService, LibraryService};
use crate::collector::collect_duplicate_groups;
use crate::confirm::{confirmation_gate, ApprovalPolicy};
use crate::error::Error;
use crate::executor::ActionExecutor;
use crate::index::build_canonical_index;
use crate::model::{ActionMode, Instance};
use crate::progress::ProgressReporter;
use crate::reconcile::reconcile;
use crate::report::{self, ActionTally};

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub dry_run: bool,
    pub quarantine_dir: PathBuf,
    pub report_dir: PathBuf,
}

/// Everything one reconciliation run needs, built once by the caller.
pub struct RunContext {
    pub library: Box<dyn LibraryService>,
    pub acquisition: Box<dyn AcquisitionService>,
    pub instances: Vec<Instance>,
    pub settings: RunSettings,
}

#[derive(Debug)]
pub enum InstanceStatus {
    /// No decisions were produced.
    Clean,
    DryRun { decisions: usize, report: PathBuf },
    /// The operator approved nothing.
    Declined { decisions: usize },
    Processed {
        mode: ActionMode,
        tally: ActionTally,
        leftovers: Vec<PathBuf>,
    },
    Failed(Error),
}

#[derive(Debug)]
pub struct InstanceOutcome {
    pub name: String,
    pub status: InstanceStatus,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub instances: Vec<InstanceOutcome>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| matches!(i.status, InstanceStatus::Failed(_)))
            .count()
    }
}

pub struct ReconcileEngine {
    context: RunContext,
}

impl ReconcileEngine {
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    /// Run every configured instance in order. A failing instance is logged and
    /// recorded; the remaining instances still run.
    pub fn run(
        &self,
        policy: &mut dyn ApprovalPolicy,
        reporter: &dyn ProgressReporter,
    ) -> RunSummary {
        info!("Starting duplicate file reconciliation");
        let mut summary = RunSummary::default();

        for instance in &self.context.instances {
            info!("Processing instance: {} ({})", instance.name, instance.kind);
            reporter.on_instance_start(&instance.name);
            let started = Instant::now();

            let status = match self.run_instance(instance, policy, reporter) {
                Ok(status) => status,
                Err(e) => {
                    error!("Instance {} failed: {}", instance.name, e);
                    InstanceStatus::Failed(e)
                }
            };

            reporter.on_instance_complete(&instance.name);
            info!(
                "Finished instance {} in {:.2}s",
                instance.name,
                started.elapsed().as_secs_f64()
            );
            summary.instances.push(InstanceOutcome {
                name: instance.name.clone(),
                status,
            });
        }

        info!("Duplicate file reconciliation completed");
        summary
    }

    fn run_instance(
        &self,
        instance: &Instance,
        policy: &mut dyn ApprovalPolicy,
        reporter: &dyn ProgressReporter,
    ) -> Result<InstanceStatus, Error> {
        let settings = &self.context.settings;

        reporter.on_fetch_start("canonical records");
        let index = build_canonical_index(self.context.acquisition.as_ref(), instance)?;
        reporter.on_fetch_complete("canonical records", index.len());

        reporter.on_fetch_start("library duplicates");
        let groups = collect_duplicate_groups(self.context.library.as_ref(), instance)?;
        reporter.on_fetch_complete("library duplicates", groups.len());

        let decisions = reconcile(&groups, &index);
        reporter.on_decisions_ready(decisions.len());
        if decisions.is_empty() {
            info!("No duplicate files to process for instance: {}", instance.name);
            return Ok(InstanceStatus::Clean);
        }
        let decision_count = decisions.len();

        let gate = confirmation_gate(decisions, settings.dry_run, policy)?;

        if settings.dry_run {
            let report = report::write_dry_run_report(
                &settings.report_dir,
                &instance.name,
                &gate.approved,
                &Local::now(),
            )?;
            info!(
                "DRY RUN: No files were actually processed. Check {} for details.",
                report.display()
            );
            return Ok(InstanceStatus::DryRun {
                decisions: decision_count,
                report,
            });
        }

        let Some(mode) = gate.mode else {
            info!("No files confirmed for processing for instance: {}", instance.name);
            return Ok(InstanceStatus::Declined {
                decisions: decision_count,
            });
        };

        let executor = ActionExecutor::new(mode, &settings.quarantine_dir);
        let results = executor.execute(&gate.approved, reporter);
        let tally = report::log_results(mode, &results);
        let leftovers = match mode {
            ActionMode::Move => report::log_leftovers(&gate.approved),
            ActionMode::Delete => Vec::new(),
        };

        Ok(InstanceStatus::Processed {
            mode,
            tally,
            leftovers,
        })
    }
}
