use tracing::info;

use crate::clients::{LibraryItem, LibraryService, Rendition};
use crate::error::Error;
use crate::model::{DuplicateGroup, Instance, MediaFile, UNKNOWN};

/// Query the library section paired with `instance` for items flagged as
/// duplicated and flatten each into a `DuplicateGroup`.
pub fn collect_duplicate_groups(
    library: &dyn LibraryService,
    instance: &Instance,
) -> Result<Vec<DuplicateGroup>, Error> {
    info!(
        "Scanning library section '{}' for duplicates...",
        instance.library_section
    );
    let items = library.list_duplicates(&instance.library_section, instance.kind)?;
    let groups: Vec<DuplicateGroup> = items.into_iter().map(group_from_item).collect();
    info!(
        "Found {} items with duplicates in library section: {}",
        groups.len(),
        instance.library_section
    );
    Ok(groups)
}

pub fn group_from_item(item: LibraryItem) -> DuplicateGroup {
    let video_resolution = last_non_empty(&item.renditions, |r| r.video_resolution.as_deref());
    let video_codec = last_non_empty(&item.renditions, |r| r.video_codec.as_deref());
    let audio_codec = last_non_empty(&item.renditions, |r| r.audio_codec.as_deref());

    let mut files = Vec::new();
    for rendition in &item.renditions {
        for part in &rendition.parts {
            files.push(MediaFile {
                path: part.path.clone(),
                size_bytes: part.size_bytes.unwrap_or(0),
                video_resolution: or_unknown(rendition.video_resolution.as_deref()),
                video_codec: or_unknown(rendition.video_codec.as_deref()),
                audio_codec: or_unknown(rendition.audio_codec.as_deref()),
            });
        }
    }

    DuplicateGroup {
        key: item.identity.key(),
        title: item.title,
        files,
        video_resolution,
        video_codec,
        audio_codec,
    }
}

fn or_unknown(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn last_non_empty<F>(renditions: &[Rendition], field: F) -> String
where
    F: Fn(&Rendition) -> Option<&str>,
{
    renditions
        .iter()
        .rev()
        .filter_map(|r| field(r))
        .find(|v| !v.trim().is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}
