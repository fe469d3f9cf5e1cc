use chrono::{DateTime, TimeZone};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Error;
use crate::model::{ActionMode, ActionOutcome, ActionResult, ReconciliationDecision};
use crate::utils::path::sanitize_file_component;

/// Counts of action outcomes for one instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActionTally {
    pub deleted: usize,
    pub moved: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl ActionTally {
    pub fn from_results(results: &[ActionResult]) -> Self {
        let mut tally = ActionTally::default();
        for result in results {
            match result.outcome {
                ActionOutcome::Deleted => tally.deleted += 1,
                ActionOutcome::Moved(_) => tally.moved += 1,
                ActionOutcome::NotFound => tally.not_found += 1,
                ActionOutcome::Failed(_) => tally.failed += 1,
            }
        }
        tally
    }

    pub fn succeeded(&self) -> usize {
        self.deleted + self.moved
    }

    pub fn unprocessed(&self) -> usize {
        self.not_found + self.failed
    }
}

/// Render the dry-run report. Output depends only on the inputs.
pub fn render_dry_run_report(instance_name: &str, decisions: &[ReconciliationDecision]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dry Run Report - Files that would be processed (Instance: {})",
        instance_name
    );
    let _ = writeln!(out, "==============================================");
    let _ = writeln!(out);

    for decision in decisions {
        let group = &decision.group;
        let _ = writeln!(out, "Item: {}", group.title);
        let _ = writeln!(out, "Library Paths:");
        for (i, file) in group.files.iter().enumerate() {
            let _ = writeln!(
                out,
                "File {}: {} ({} bytes, {}, {}/{})",
                i + 1,
                file.path.display(),
                file.size_bytes,
                file.video_resolution,
                file.video_codec,
                file.audio_codec
            );
        }
        let _ = writeln!(out, "Canonical Path:");
        let _ = writeln!(out, "File: {}", decision.canonical.canonical_path.display());
        let _ = writeln!(out, "File(s) to be removed:");
        for path in &decision.removal_set {
            let _ = writeln!(out, "{}", path.display());
        }
        if !decision.canonical_in_group() {
            let _ = writeln!(out, "WARNING: canonical file is not among the library files");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Resolution: {}", group.video_resolution);
        let _ = writeln!(out, "Video Codec: {}", group.video_codec);
        let _ = writeln!(out, "Audio Codec: {}", group.audio_codec);
        let _ = writeln!(out, "File Size: {} bytes", group.total_size_bytes());
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "-".repeat(80));
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total items with duplicates: {}", decisions.len());
    out
}

/// File name for a dry-run report: instance name plus a second-resolution
/// timestamp.
pub fn report_file_name<Tz: TimeZone>(instance_name: &str, timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "dry_run_report_{}_{}.txt",
        sanitize_file_component(instance_name),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Write the dry-run report for one instance into `dir` and return its path.
pub fn write_dry_run_report<Tz: TimeZone>(
    dir: &Path,
    instance_name: &str,
    decisions: &[ReconciliationDecision],
    timestamp: &DateTime<Tz>,
) -> Result<PathBuf, Error>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(instance_name, timestamp));
    fs::write(&path, render_dry_run_report(instance_name, decisions))?;
    info!("Dry run report generated: {}", path.display());
    Ok(path)
}

/// Log the final tally of a live run.
pub fn log_results(mode: ActionMode, results: &[ActionResult]) -> ActionTally {
    let tally = ActionTally::from_results(results);
    let action = match mode {
        ActionMode::Delete => "deleted",
        ActionMode::Move => "moved to trash",
    };
    info!("Successfully {} {} files", action, tally.succeeded());
    if tally.unprocessed() > 0 {
        warn!(
            "Failed to process {} files ({} not found, {} failed)",
            tally.unprocessed(),
            tally.not_found,
            tally.failed
        );
    }
    tally
}

/// Removal-set paths that still exist at their original location, skipping
/// the canonical file.
pub fn still_present(decisions: &[ReconciliationDecision]) -> Vec<PathBuf> {
    decisions
        .iter()
        .flat_map(|d| {
            d.removal_set
                .iter()
                .filter(move |p| **p != d.canonical.canonical_path)
        })
        .filter(|p| fs::symlink_metadata(p).is_ok())
        .cloned()
        .collect()
}

/// After a move-mode run, list anything left behind so the operator can re-run.
pub fn log_leftovers(decisions: &[ReconciliationDecision]) -> Vec<PathBuf> {
    let leftovers = still_present(decisions);
    if leftovers.is_empty() {
        info!("No removal candidates remain at their original location");
    } else {
        warn!("Files that still exist in their original location:");
        for path in &leftovers {
            warn!("  {}", path.display());
        }
    }
    leftovers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalRecord, DuplicateGroup, MediaFile};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn media(path: &str, size: u64) -> MediaFile {
        MediaFile {
            path: PathBuf::from(path),
            size_bytes: size,
            video_resolution: "1080".to_string(),
            video_codec: "h264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }

    fn movie_a() -> ReconciliationDecision {
        ReconciliationDecision {
            group: DuplicateGroup {
                title: "Movie A".to_string(),
                key: "Movie A".to_string(),
                files: vec![media("/lib/A (1).mkv", 300), media("/lib/A.mkv", 700)],
                video_resolution: "1080".to_string(),
                video_codec: "h264".to_string(),
                audio_codec: "aac".to_string(),
            },
            canonical: CanonicalRecord {
                key: "Movie A".to_string(),
                canonical_path: PathBuf::from("/lib/A.mkv"),
            },
            removal_set: vec![PathBuf::from("/lib/A (1).mkv")],
        }
    }

    #[test]
    fn test_render_dry_run_report() {
        let report = render_dry_run_report("Movies", &[movie_a()]);
        assert!(report.starts_with("Dry Run Report - Files that would be processed (Instance: Movies)\n"));
        assert!(report.contains("Item: Movie A\n"));
        assert!(report.contains("File 1: /lib/A (1).mkv (300 bytes, 1080, h264/aac)\n"));
        assert!(report.contains("Canonical Path:\nFile: /lib/A.mkv\n"));
        assert!(report.contains("File(s) to be removed:\n/lib/A (1).mkv\n"));
        assert!(report.contains("File Size: 1000 bytes\n"));
        assert!(report.ends_with("Total items with duplicates: 1\n"));
        assert!(!report.contains("WARNING"));

        assert_eq!(report, render_dry_run_report("Movies", &[movie_a()]));
    }

    #[test]
    fn test_render_flags_full_removal() {
        let mut decision = movie_a();
        decision.removal_set.push(PathBuf::from("/lib/A.mkv"));
        decision.canonical.canonical_path = PathBuf::from("/lib/A (final).mkv");
        let report = render_dry_run_report("Movies", &[decision]);
        assert!(report.contains("WARNING: canonical file is not among the library files"));
    }

    #[test]
    fn test_write_dry_run_report_names_file_after_instance_and_time() {
        let tmp = tempdir().unwrap();
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = write_dry_run_report(tmp.path(), "Radarr/4K", &[movie_a()], &timestamp).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "dry_run_report_Radarr_4K_20240309_140507.txt"
        );
        assert!(fs::read_to_string(&path).unwrap().contains("Item: Movie A"));
    }

    #[test]
    fn test_tally_counts_each_outcome() {
        let result = |outcome| ActionResult {
            source_path: PathBuf::from("/x"),
            outcome,
        };
        let results = vec![
            result(ActionOutcome::Deleted),
            result(ActionOutcome::Moved(PathBuf::from("/trash/x"))),
            result(ActionOutcome::NotFound),
            result(ActionOutcome::Failed("busy".to_string())),
            result(ActionOutcome::NotFound),
        ];
        let tally = log_results(ActionMode::Move, &results);
        assert_eq!(
            tally,
            ActionTally {
                deleted: 1,
                moved: 1,
                not_found: 2,
                failed: 1
            }
        );
        assert_eq!(tally.succeeded(), 2);
        assert_eq!(tally.unprocessed(), 3);
    }

    #[test]
    fn test_still_present_reports_only_remaining_candidates() {
        let tmp = tempdir().unwrap();
        let keep = tmp.path().join("A.mkv");
        let gone = tmp.path().join("A (1).mkv");
        let stuck = tmp.path().join("A (2).mkv");
        fs::write(&keep, "keep").unwrap();
        fs::write(&stuck, "stuck").unwrap();

        let mut decision = movie_a();
        decision.canonical.canonical_path = keep.clone();
        decision.removal_set = vec![gone, stuck.clone(), keep];

        assert_eq!(still_present(&[decision]), vec![stuck]);
    }
}
