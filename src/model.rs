use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::utils::path::resolve_path;

/// Placeholder used when the library server reports no resolution or codec.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Movie,
    Episode,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Movie => write!(f, "movie"),
            ItemKind::Episode => write!(f, "episode"),
        }
    }
}

/// One acquisition-service endpoint paired with one library section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub library_section: String,
    pub kind: ItemKind,
}

/// The fields both sides expose so their records can be joined by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemIdentity {
    Movie {
        title: String,
    },
    Episode {
        series_title: String,
        season: u32,
        episode: u32,
    },
}

impl ItemIdentity {
    pub fn movie(title: impl Into<String>) -> Self {
        ItemIdentity::Movie {
            title: title.into(),
        }
    }

    pub fn episode(series_title: impl Into<String>, season: u32, episode: u32) -> Self {
        ItemIdentity::Episode {
            series_title: series_title.into(),
            season,
            episode,
        }
    }

    /// Movies key on their exact title, episodes on `"{series} - {season}x{episode:02}"`.
    pub fn key(&self) -> String {
        match self {
            ItemIdentity::Movie { title } => title.clone(),
            ItemIdentity::Episode {
                series_title,
                season,
                episode,
            } => format!("{} - {}x{:02}", series_title, season, episode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub key: String,
    pub canonical_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub video_resolution: String,
    pub video_codec: String,
    pub audio_codec: String,
}

/// A library item reported as having more than one underlying file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub title: String,
    pub key: String,
    pub files: Vec<MediaFile>,
    pub video_resolution: String,
    pub video_codec: String,
    pub audio_codec: String,
}

impl DuplicateGroup {
    pub fn total_size_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationDecision {
    pub group: DuplicateGroup,
    pub canonical: CanonicalRecord,
    pub removal_set: Vec<PathBuf>,
}

impl ReconciliationDecision {
    /// False when the library entry diverged entirely from the tracked file,
    /// in which case every file of the group is scheduled for removal.
    pub fn canonical_in_group(&self) -> bool {
        let canonical = resolve_path(&self.canonical.canonical_path);
        self.group
            .files
            .iter()
            .any(|f| resolve_path(&f.path) == canonical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    Delete,
    Move,
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionMode::Delete => write!(f, "delete"),
            ActionMode::Move => write!(f, "trash"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Deleted,
    Moved(PathBuf),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub source_path: PathBuf,
    pub outcome: ActionOutcome,
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            ActionOutcome::Deleted | ActionOutcome::Moved(_)
        )
    }
}
