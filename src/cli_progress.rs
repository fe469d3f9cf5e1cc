use dupe_reconciler::model::{ActionMode, ActionResult};
use dupe_reconciler::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif.
///
/// - Fetch phases: spinner (item counts unknown upfront)
/// - Action phase: progress bar over the approved files
///
/// Any bar is cleared before decisions are presented so prompts stay readable.
pub struct CliReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: RefCell::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Some(old) = self.bar.replace(Some(pb)) {
            old.finish_and_clear();
        }
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_fetch_start(&self, what: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(format!("Fetching {}...", what));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_fetch_complete(&self, what: &str, count: usize) {
        self.finish_bar();
        eprintln!("  \x1b[32m✓\x1b[0m {} {}", count, what);
    }

    fn on_decisions_ready(&self, _count: usize) {
        self.finish_bar();
    }

    fn on_action_start(&self, total_files: usize, mode: ActionMode) {
        let verb = match mode {
            ActionMode::Delete => "Deleting",
            ActionMode::Move => "Moving",
        };
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(
            ProgressStyle::with_template(&format!(
                "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} files",
                verb
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        self.set_bar(pb);
    }

    fn on_action_progress(&self, _result: &ActionResult) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.inc(1);
        }
    }

    fn on_action_complete(&self) {
        self.finish_bar();
    }

    fn on_instance_complete(&self, _name: &str) {
        self.finish_bar();
    }
}
