use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{agent, call_json, AcquisitionService, CanonicalItem};
use crate::error::Error;
use crate::model::{Instance, ItemIdentity, ItemKind};

/// Client for the v3 API shared by Radarr (movies) and Sonarr (episodes).
#[derive(Debug, Default, Clone)]
pub struct ArrClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrMovie {
    title: String,
    #[serde(default)]
    has_file: bool,
    movie_file: Option<ArrFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrSeries {
    id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrEpisode {
    season_number: u32,
    episode_number: u32,
    #[serde(default)]
    has_file: bool,
    episode_file: Option<ArrFile>,
}

#[derive(Debug, Deserialize)]
struct ArrFile {
    path: PathBuf,
}

impl ArrClient {
    pub fn new() -> Self {
        Self
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        instance: &Instance,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = format!("{}/api/v3/{}", instance.base_url, endpoint);
        debug!("GET {}", url);
        let mut request = agent()
            .get(&url)
            .set("X-Api-Key", &instance.api_key)
            .set("Accept", "application/json");
        for (name, value) in query {
            request = request.query(name, value);
        }
        call_json(request, &instance.name)
    }

    fn list_movies(&self, instance: &Instance) -> Result<Vec<CanonicalItem>, Error> {
        let movies: Vec<ArrMovie> = self.get(instance, "movie", &[])?;
        Ok(movies
            .into_iter()
            .map(|movie| CanonicalItem {
                identity: ItemIdentity::movie(movie.title),
                has_file: movie.has_file,
                file_path: movie.movie_file.map(|f| f.path),
            })
            .collect())
    }

    fn list_episodes(&self, instance: &Instance) -> Result<Vec<CanonicalItem>, Error> {
        let series: Vec<ArrSeries> = self.get(instance, "series", &[])?;
        info!("{}: enumerating episodes of {} series", instance.name, series.len());

        let mut items = Vec::new();
        for show in series {
            let series_id = show.id.to_string();
            let episodes: Vec<ArrEpisode> = self.get(
                instance,
                "episode",
                &[("seriesId", series_id.as_str()), ("includeEpisodeFile", "true")],
            )?;
            items.extend(episodes.into_iter().map(|episode| CanonicalItem {
                identity: ItemIdentity::episode(
                    show.title.clone(),
                    episode.season_number,
                    episode.episode_number,
                ),
                has_file: episode.has_file,
                file_path: episode.episode_file.map(|f| f.path),
            }));
        }
        Ok(items)
    }
}

impl AcquisitionService for ArrClient {
    fn list_canonical_items(&self, instance: &Instance) -> Result<Vec<CanonicalItem>, Error> {
        match instance.kind {
            ItemKind::Movie => self.list_movies(instance),
            ItemKind::Episode => self.list_episodes(instance),
        }
    }
}
