use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::model::{ActionMode, ActionOutcome, ActionResult, ReconciliationDecision};
use crate::progress::ProgressReporter;
use crate::utils::path::{absolutize, quarantine_destination, resolve_path};

/// Applies approved decisions to the filesystem, one file at a time.
///
/// No single failure stops the run: every removal-set entry yields exactly one
/// `ActionResult`, except entries equal to the canonical path, which are
/// skipped.
pub struct ActionExecutor {
    mode: ActionMode,
    quarantine_dir: PathBuf,
}

impl ActionExecutor {
    pub fn new(mode: ActionMode, quarantine_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            quarantine_dir: quarantine_dir.into(),
        }
    }

    pub fn execute(
        &self,
        decisions: &[ReconciliationDecision],
        reporter: &dyn ProgressReporter,
    ) -> Vec<ActionResult> {
        let planned = planned_actions(decisions);
        let total = planned.len();
        let action = match self.mode {
            ActionMode::Delete => "Deleting",
            ActionMode::Move => "Moving",
        };
        info!("{} {} files...", action, total);
        reporter.on_action_start(total, self.mode);

        let mut results = Vec::with_capacity(total);
        for (title, path) in planned {
            let result = self.apply(title, path);
            reporter.on_action_progress(&result);
            results.push(result);
        }

        reporter.on_action_complete();
        results
    }

    fn apply(&self, title: &str, path: &Path) -> ActionResult {
        let source_path = absolutize(path).unwrap_or_else(|_| path.to_path_buf());
        debug!("Attempting to {}: {}", self.mode, source_path.display());

        // symlink_metadata so a dangling link still counts as present
        if fs::symlink_metadata(&source_path).is_err() {
            warn!("File not found: {}", source_path.display());
            return ActionResult {
                source_path,
                outcome: ActionOutcome::NotFound,
            };
        }

        let outcome = match self.mode {
            ActionMode::Delete => fs::remove_file(&source_path)
                .map(|_| ActionOutcome::Deleted)
                .map_err(|e| Error::ActionFailed {
                    path: source_path.clone(),
                    reason: e.to_string(),
                }),
            ActionMode::Move => self.quarantine(title, &source_path).map(ActionOutcome::Moved),
        };

        match outcome {
            Ok(ActionOutcome::Moved(dest)) => {
                info!("Successfully moved: {} to {}", source_path.display(), dest.display());
                ActionResult {
                    source_path,
                    outcome: ActionOutcome::Moved(dest),
                }
            }
            Ok(outcome) => {
                info!("Successfully deleted: {}", source_path.display());
                ActionResult {
                    source_path,
                    outcome,
                }
            }
            Err(e) => {
                error!("{}", e);
                let reason = match e {
                    Error::ActionFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                ActionResult {
                    source_path,
                    outcome: ActionOutcome::Failed(reason),
                }
            }
        }
    }

    fn quarantine(&self, title: &str, source: &Path) -> Result<PathBuf, Error> {
        let failed = |e: io::Error| Error::ActionFailed {
            path: source.to_path_buf(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.quarantine_dir).map_err(failed)?;
        let dest = quarantine_destination(&self.quarantine_dir, title, source);
        if fs::symlink_metadata(&dest).is_ok() {
            warn!("Overwriting existing quarantined file {}", dest.display());
        }
        move_file(source, &dest).map_err(failed)?;
        Ok(dest)
    }
}

/// Pair every removal-set path with its group title, dropping any path that
/// is (literally or once resolved) the canonical file.
fn planned_actions(decisions: &[ReconciliationDecision]) -> Vec<(&str, &Path)> {
    let mut planned = Vec::new();
    for decision in decisions {
        let canonical = &decision.canonical.canonical_path;
        let canonical_resolved = resolve_path(canonical);

        for path in &decision.removal_set {
            if path == canonical || resolve_path(path) == canonical_resolved {
                warn!(
                    "Refusing to touch canonical file {} of '{}'",
                    path.display(),
                    decision.group.title
                );
                continue;
            }
            planned.push((decision.group.title.as_str(), path.as_path()));
        }
    }
    planned
}

/// Rename, falling back to copy and remove when the rename is refused
/// (typically across filesystems).
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "rename {} -> {} failed ({}), copying instead",
                source.display(),
                dest.display(),
                rename_err
            );
            fs::copy(source, dest)?;
            if let Err(e) = fs::remove_file(source) {
                let _ = fs::remove_file(dest);
                return Err(e);
            }
            Ok(())
        }
    }
}
