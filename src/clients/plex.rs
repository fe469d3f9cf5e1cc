use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{agent, call_json, LibraryItem, LibraryService, Part, Rendition};
use crate::error::Error;
use crate::model::{ItemIdentity, ItemKind};

const SERVICE: &str = "library server";

/// Plex metadata type ids used by the `type` filter.
const TYPE_MOVIE: &str = "1";
const TYPE_SHOW: &str = "2";

#[derive(Debug, Clone)]
pub struct PlexClient {
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "MediaContainer")]
    container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<SectionDirectory>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
struct SectionDirectory {
    key: String,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(default)]
    rating_key: Option<String>,
    title: String,
    #[serde(default)]
    grandparent_title: Option<String>,
    #[serde(default)]
    parent_index: Option<u32>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(rename = "Media", default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Media {
    #[serde(default)]
    video_resolution: Option<String>,
    #[serde(default)]
    video_codec: Option<String>,
    #[serde(default)]
    audio_codec: Option<String>,
    #[serde(rename = "Part", default)]
    parts: Vec<MediaPart>,
}

#[derive(Debug, Deserialize)]
struct MediaPart {
    file: PathBuf,
    #[serde(default)]
    size: Option<u64>,
}

impl From<Media> for Rendition {
    fn from(media: Media) -> Self {
        Rendition {
            video_resolution: media.video_resolution,
            video_codec: media.video_codec,
            audio_codec: media.audio_codec,
            parts: media
                .parts
                .into_iter()
                .map(|p| Part {
                    path: p.file,
                    size_bytes: p.size,
                })
                .collect(),
        }
    }
}

impl PlexClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<MediaContainer, Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let mut request = agent()
            .get(&url)
            .set("X-Plex-Token", &self.token)
            .set("Accept", "application/json");
        for (name, value) in query {
            request = request.query(name, value);
        }
        let envelope: Envelope = call_json(request, SERVICE)?;
        Ok(envelope.container)
    }

    /// Resolve a section given either its title or its numeric key.
    fn section_key(&self, section: &str) -> Result<String, Error> {
        let sections = self.get("/library/sections", &[])?;
        sections
            .directories
            .into_iter()
            .find(|d| d.title == section || d.key == section)
            .map(|d| d.key)
            .ok_or_else(|| {
                Error::unavailable(SERVICE, format!("library section '{}' not found", section))
            })
    }

    fn duplicate_movies(&self, key: &str) -> Result<Vec<LibraryItem>, Error> {
        let container = self.get(
            &format!("/library/sections/{}/all", key),
            &[("type", TYPE_MOVIE), ("duplicate", "1")],
        )?;
        Ok(container
            .metadata
            .into_iter()
            .map(|movie| LibraryItem {
                identity: ItemIdentity::movie(movie.title.clone()),
                title: movie.title,
                renditions: movie.media.into_iter().map(Rendition::from).collect(),
            })
            .collect())
    }

    fn duplicate_episodes(&self, key: &str) -> Result<Vec<LibraryItem>, Error> {
        let shows = self.get(
            &format!("/library/sections/{}/all", key),
            &[("type", TYPE_SHOW), ("duplicate", "1")],
        )?;
        info!("{} shows flagged with duplicate episodes", shows.metadata.len());

        let mut items = Vec::new();
        for show in shows.metadata {
            let Some(rating_key) = show.rating_key.as_deref() else {
                debug!("Show '{}' has no rating key, skipping", show.title);
                continue;
            };
            let leaves = self.get(&format!("/library/metadata/{}/allLeaves", rating_key), &[])?;
            for episode in leaves.metadata {
                if episode.media.len() < 2 {
                    continue;
                }
                let (Some(season), Some(number)) = (episode.parent_index, episode.index) else {
                    debug!("Episode '{}' of '{}' has no numbering, skipping", episode.title, show.title);
                    continue;
                };
                let series_title = episode
                    .grandparent_title
                    .clone()
                    .unwrap_or_else(|| show.title.clone());
                let identity = ItemIdentity::episode(series_title, season, number);
                items.push(LibraryItem {
                    title: identity.key(),
                    identity,
                    renditions: episode.media.into_iter().map(Rendition::from).collect(),
                });
            }
        }
        Ok(items)
    }
}

impl LibraryService for PlexClient {
    fn check_connection(&self) -> Result<(), Error> {
        self.get("/identity", &[]).map(|_| ())
    }

    fn list_duplicates(&self, section: &str, kind: ItemKind) -> Result<Vec<LibraryItem>, Error> {
        let key = self.section_key(section)?;
        match kind {
            ItemKind::Movie => self.duplicate_movies(&key),
            ItemKind::Episode => self.duplicate_episodes(&key),
        }
    }
}
