//! Operator approval of reconciliation decisions.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use tracing::{info, warn};

use crate::error::Error;
use crate::model::{ActionMode, ReconciliationDecision};
use crate::utils::prompt::prompt_line;

const SELECTION_PROMPT: &str = "\nEnter 'all' to process all files, or numbers separated by commas to process specific items (or 'q' to quit): ";
const MODE_PROMPT: &str =
    "\nDo you want to permanently delete the files or move them to trash? (delete/trash): ";

/// The operator's answer to the selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    All,
    None,
    /// Zero-based positions into the presented decisions.
    Indices(BTreeSet<usize>),
}

impl Approval {
    /// Keep the approved decisions in their original order.
    pub fn apply(&self, decisions: Vec<ReconciliationDecision>) -> Vec<ReconciliationDecision> {
        match self {
            Approval::All => decisions,
            Approval::None => Vec::new(),
            Approval::Indices(indices) => decisions
                .into_iter()
                .enumerate()
                .filter(|(i, _)| indices.contains(i))
                .map(|(_, d)| d)
                .collect(),
        }
    }
}

/// Source of approvals. The console implementation blocks on stdin; preset
/// policies answer without prompting.
pub trait ApprovalPolicy {
    fn approve(&mut self, decision_count: usize) -> Result<Approval, Error>;
    fn action_mode(&mut self) -> Result<ActionMode, Error>;
}

/// What the gate let through.
#[derive(Debug)]
pub struct GateOutcome {
    pub approved: Vec<ReconciliationDecision>,
    /// `None` on dry runs and when nothing was approved.
    pub mode: Option<ActionMode>,
}

/// Parse a selection: `all`, `q`, or comma-separated 1-based indices. Any bad
/// token rejects the whole input.
pub fn parse_selection(input: &str, count: usize) -> Result<Approval, Error> {
    let choice = input.trim().to_lowercase();
    match choice.as_str() {
        "q" => return Ok(Approval::None),
        "all" => return Ok(Approval::All),
        _ => {}
    }

    let mut indices = BTreeSet::new();
    for token in choice.split(',') {
        let token = token.trim();
        let number: usize = token.parse().map_err(|_| {
            Error::InputRejected(format!(
                "'{}' is not a number; enter 'all', item numbers, or 'q'",
                token
            ))
        })?;
        if number == 0 || number > count {
            return Err(Error::InputRejected(format!(
                "{} is out of range (1-{})",
                number, count
            )));
        }
        indices.insert(number - 1);
    }
    Ok(Approval::Indices(indices))
}

pub fn parse_action_mode(input: &str) -> Result<ActionMode, Error> {
    match input.trim().to_lowercase().as_str() {
        "delete" => Ok(ActionMode::Delete),
        "trash" => Ok(ActionMode::Move),
        other => Err(Error::InputRejected(format!(
            "'{}' is not a valid choice; enter 'delete' or 'trash'",
            other
        ))),
    }
}

/// Interactive line-based prompt. Re-prompts on malformed input and never
/// falls back to a default.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask<T, F>(&mut self, prompt: &str, parse: F) -> Result<T, Error>
    where
        F: Fn(&str) -> Result<T, Error>,
    {
        loop {
            let line = prompt_line(&mut self.input, &mut self.output, prompt)?;
            match parse(&line) {
                Ok(value) => return Ok(value),
                Err(Error::InputRejected(reason)) => {
                    warn!("Invalid input: {}", reason);
                    writeln!(self.output, "Invalid input: {}", reason)?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: BufRead, W: Write> ApprovalPolicy for ConsolePrompt<R, W> {
    fn approve(&mut self, decision_count: usize) -> Result<Approval, Error> {
        self.ask(SELECTION_PROMPT, |line| parse_selection(line, decision_count))
    }

    fn action_mode(&mut self) -> Result<ActionMode, Error> {
        self.ask(MODE_PROMPT, parse_action_mode)
    }
}

/// Pre-supplied answers for unattended runs and test suites.
#[derive(Debug, Clone)]
pub struct PresetApproval {
    pub approval: Approval,
    pub mode: ActionMode,
}

impl PresetApproval {
    pub fn new(approval: Approval, mode: ActionMode) -> Self {
        Self { approval, mode }
    }
}

impl ApprovalPolicy for PresetApproval {
    fn approve(&mut self, decision_count: usize) -> Result<Approval, Error> {
        if let Approval::Indices(indices) = &self.approval {
            if let Some(bad) = indices.iter().find(|i| **i >= decision_count) {
                return Err(Error::InputRejected(format!(
                    "preset index {} is out of range (1-{})",
                    bad + 1,
                    decision_count
                )));
            }
        }
        Ok(self.approval.clone())
    }

    fn action_mode(&mut self) -> Result<ActionMode, Error> {
        Ok(self.mode)
    }
}

/// Log every decision with its 1-based number, as presented to the operator.
pub fn present_decisions(decisions: &[ReconciliationDecision]) {
    info!("Files marked for removal:");
    for (i, decision) in decisions.iter().enumerate() {
        info!("{}. Item: {}", i + 1, decision.group.title);
        info!("Library paths:");
        for (j, file) in decision.group.files.iter().enumerate() {
            info!("  File {}: {}", j + 1, file.path.display());
        }
        info!("Canonical path:");
        info!("  File: {}", decision.canonical.canonical_path.display());
        info!("File(s) to be removed:");
        for path in &decision.removal_set {
            info!("  {}", path.display());
        }
        if !decision.canonical_in_group() {
            warn!(
                "  Canonical file is not among the library files: every file of '{}' will be removed",
                decision.group.title
            );
        }
        info!("{}", "-".repeat(80));
    }
}

/// Present decisions and collect approval. Dry runs pass everything through
/// without consulting `policy`.
pub fn confirmation_gate(
    decisions: Vec<ReconciliationDecision>,
    dry_run: bool,
    policy: &mut dyn ApprovalPolicy,
) -> Result<GateOutcome, Error> {
    present_decisions(&decisions);

    if dry_run {
        info!("DRY RUN: No files will be processed.");
        return Ok(GateOutcome {
            approved: decisions,
            mode: None,
        });
    }

    let approval = policy.approve(decisions.len())?;
    let approved = approval.apply(decisions);
    if approved.is_empty() {
        info!("No items approved for processing.");
        return Ok(GateOutcome {
            approved,
            mode: None,
        });
    }

    let mode = policy.action_mode()?;
    Ok(GateOutcome {
        approved,
        mode: Some(mode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalRecord, DuplicateGroup, UNKNOWN};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn decision(title: &str) -> ReconciliationDecision {
        ReconciliationDecision {
            group: DuplicateGroup {
                title: title.to_string(),
                key: title.to_string(),
                files: Vec::new(),
                video_resolution: UNKNOWN.to_string(),
                video_codec: UNKNOWN.to_string(),
                audio_codec: UNKNOWN.to_string(),
            },
            canonical: CanonicalRecord {
                key: title.to_string(),
                canonical_path: PathBuf::from(format!("/lib/{}.mkv", title)),
            },
            removal_set: vec![PathBuf::from(format!("/lib/{} (1).mkv", title))],
        }
    }

    fn three() -> Vec<ReconciliationDecision> {
        vec![decision("One"), decision("Two"), decision("Three")]
    }

    struct Unreachable;

    impl ApprovalPolicy for Unreachable {
        fn approve(&mut self, _decision_count: usize) -> Result<Approval, Error> {
            panic!("dry runs must not prompt")
        }
        fn action_mode(&mut self) -> Result<ActionMode, Error> {
            panic!("dry runs must not prompt")
        }
    }

    #[test]
    fn test_parse_selection_keywords() {
        assert_eq!(parse_selection("all", 3).unwrap(), Approval::All);
        assert_eq!(parse_selection(" ALL ", 3).unwrap(), Approval::All);
        assert_eq!(parse_selection("q", 3).unwrap(), Approval::None);
        assert_eq!(parse_selection("Q", 3).unwrap(), Approval::None);
    }

    #[test]
    fn test_parse_selection_indices() {
        let approval = parse_selection("2, 3", 3).unwrap();
        assert_eq!(approval, Approval::Indices(BTreeSet::from([1, 2])));
    }

    #[test]
    fn test_parse_selection_rejects_bad_tokens() {
        for input in ["4", "0", "1,x", "", "1,", "-1", "all,1"] {
            assert!(
                matches!(parse_selection(input, 3), Err(Error::InputRejected(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_indices_keep_original_order() {
        let approved = parse_selection("3,2", 3).unwrap().apply(three());
        let titles: Vec<&str> = approved.iter().map(|d| d.group.title.as_str()).collect();
        assert_eq!(titles, vec!["Two", "Three"]);
    }

    #[test]
    fn test_parse_action_mode() {
        assert_eq!(parse_action_mode("delete").unwrap(), ActionMode::Delete);
        assert_eq!(parse_action_mode("Trash").unwrap(), ActionMode::Move);
        assert!(matches!(parse_action_mode("yes"), Err(Error::InputRejected(_))));
    }

    #[test]
    fn test_console_prompt_reprompts_until_valid() {
        let input = Cursor::new("4\n2,3\nmaybe\ntrash\n");
        let mut output = Vec::new();
        let outcome = {
            let mut prompt = ConsolePrompt::new(input, &mut output);
            confirmation_gate(three(), false, &mut prompt).unwrap()
        };

        let titles: Vec<&str> = outcome
            .approved
            .iter()
            .map(|d| d.group.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Two", "Three"]);
        assert_eq!(outcome.mode, Some(ActionMode::Move));

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Enter 'all'").count(), 2);
        assert_eq!(printed.matches("(delete/trash)").count(), 2);
        assert!(printed.contains("out of range"));
    }

    #[test]
    fn test_console_prompt_quit_skips_mode_prompt() {
        let mut output = Vec::new();
        let outcome = {
            let mut prompt = ConsolePrompt::new(Cursor::new("q\n"), &mut output);
            confirmation_gate(three(), false, &mut prompt).unwrap()
        };
        assert!(outcome.approved.is_empty());
        assert!(outcome.mode.is_none());
        assert!(!String::from_utf8(output).unwrap().contains("delete/trash"));
    }

    #[test]
    fn test_console_prompt_closed_input_is_an_error() {
        let mut prompt = ConsolePrompt::new(Cursor::new("nope\n"), Vec::new());
        let err = confirmation_gate(three(), false, &mut prompt).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_dry_run_passes_everything_without_prompting() {
        let outcome = confirmation_gate(three(), true, &mut Unreachable).unwrap();
        assert_eq!(outcome.approved, three());
        assert!(outcome.mode.is_none());
    }

    #[test]
    fn test_preset_rejects_out_of_range_indices() {
        let mut preset = PresetApproval::new(
            Approval::Indices(BTreeSet::from([3])),
            ActionMode::Delete,
        );
        assert!(matches!(
            confirmation_gate(three(), false, &mut preset),
            Err(Error::InputRejected(_))
        ));
    }
}
