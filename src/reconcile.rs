use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::index::CanonicalIndex;
use crate::model::{DuplicateGroup, ReconciliationDecision};
use crate::utils::path::resolve_path;

/// Match duplicate groups against the canonical index and compute which files
/// of each group are redundant. Decisions keep the order of `groups`.
pub fn reconcile(groups: &[DuplicateGroup], index: &CanonicalIndex) -> Vec<ReconciliationDecision> {
    info!("Comparing {} duplicate groups with canonical records...", groups.len());

    let mut decisions = Vec::new();
    for group in groups {
        if let Some(decision) = reconcile_group(group, index) {
            decisions.push(decision);
        }
    }

    info!("Marked {} items with redundant files", decisions.len());
    decisions
}

pub fn reconcile_group(
    group: &DuplicateGroup,
    index: &CanonicalIndex,
) -> Option<ReconciliationDecision> {
    let resolved: Vec<(PathBuf, PathBuf)> = group
        .files
        .iter()
        .map(|f| (f.path.clone(), resolve_path(&f.path)))
        .collect();

    let distinct: HashSet<&PathBuf> = resolved.iter().map(|(_, r)| r).collect();
    if distinct.len() < 2 {
        debug!(
            "'{}' resolves to {} distinct file(s), not a duplicate",
            group.title,
            distinct.len()
        );
        return None;
    }

    let Some(canonical) = index.get(&group.key) else {
        info!("'{}' has no canonical record, leaving it alone", group.key);
        return None;
    };

    // One entry per resolved file; the first listed path wins.
    let canonical_resolved = resolve_path(&canonical.canonical_path);
    let mut marked: HashSet<&PathBuf> = HashSet::new();
    let mut removal_set: Vec<PathBuf> = Vec::new();
    for (original, r) in &resolved {
        if *r != canonical_resolved && marked.insert(r) {
            removal_set.push(original.clone());
        }
    }

    if removal_set.is_empty() {
        debug!("'{}' is consistent with its canonical record", group.title);
        return None;
    }

    let decision = ReconciliationDecision {
        group: group.clone(),
        canonical,
        removal_set,
    };
    if !decision.canonical_in_group() {
        warn!(
            "'{}': canonical file {} is not among the library files; all {} files are marked",
            group.title,
            decision.canonical.canonical_path.display(),
            decision.removal_set.len()
        );
    }
    Some(decision)
}
