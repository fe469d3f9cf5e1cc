use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::clients::AcquisitionService;
use crate::error::Error;
use crate::model::{CanonicalRecord, Instance};

/// Key → canonical path mapping for one instance, rebuilt every cycle.
#[derive(Debug, Default, Clone)]
pub struct CanonicalIndex {
    records: HashMap<String, PathBuf>,
}

impl CanonicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. A later record with the same key replaces the
    /// earlier one; the replaced path is returned.
    pub fn insert(&mut self, record: CanonicalRecord) -> Option<PathBuf> {
        self.records.insert(record.key, record.canonical_path)
    }

    pub fn get(&self, key: &str) -> Option<CanonicalRecord> {
        self.records.get(key).map(|path| CanonicalRecord {
            key: key.to_string(),
            canonical_path: path.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<CanonicalRecord> for CanonicalIndex {
    fn from_iter<I: IntoIterator<Item = CanonicalRecord>>(iter: I) -> Self {
        let mut index = CanonicalIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Query the acquisition service behind `instance` and index every item that
/// currently has a file.
pub fn build_canonical_index(
    service: &dyn AcquisitionService,
    instance: &Instance,
) -> Result<CanonicalIndex, Error> {
    info!("Fetching {} items from instance: {}", instance.kind, instance.name);
    let items = service.list_canonical_items(instance)?;

    let mut index = CanonicalIndex::new();
    for item in items {
        let path = match (item.has_file, item.file_path) {
            (true, Some(path)) => path,
            (true, None) => {
                debug!("'{}' reports a file but no path, skipping", item.identity.key());
                continue;
            }
            (false, _) => continue,
        };

        let key = item.identity.key();
        if let Some(previous) = index.insert(CanonicalRecord {
            key: key.clone(),
            canonical_path: path,
        }) {
            warn!(
                "Key collision for '{}' in {}: replacing {}",
                key,
                instance.name,
                previous.display()
            );
        }
    }

    if index.is_empty() {
        warn!(
            "Instance {} reports no items with files; every duplicate will be left alone",
            instance.name
        );
    } else {
        info!("Found {} items with files in instance: {}", index.len(), instance.name);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::CanonicalItem;
    use crate::model::{ItemIdentity, ItemKind};

    struct FixedItems(Vec<CanonicalItem>);

    impl AcquisitionService for FixedItems {
        fn list_canonical_items(&self, _instance: &Instance) -> Result<Vec<CanonicalItem>, Error> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    impl AcquisitionService for Down {
        fn list_canonical_items(&self, _instance: &Instance) -> Result<Vec<CanonicalItem>, Error> {
            Err(Error::unavailable("radarr", "connection refused"))
        }
    }

    fn instance() -> Instance {
        Instance {
            name: "Movies".to_string(),
            base_url: "http://radarr".to_string(),
            api_key: "key".to_string(),
            library_section: "Movies".to_string(),
            kind: ItemKind::Movie,
        }
    }

    fn item(identity: ItemIdentity, path: Option<&str>, has_file: bool) -> CanonicalItem {
        CanonicalItem {
            identity,
            file_path: path.map(PathBuf::from),
            has_file,
        }
    }

    #[test]
    fn test_only_items_with_files_are_indexed() {
        let service = FixedItems(vec![
            item(ItemIdentity::movie("Movie A"), Some("/lib/A.mkv"), true),
            item(ItemIdentity::movie("Movie B"), None, false),
            item(ItemIdentity::movie("Movie C"), None, true),
        ]);
        let index = build_canonical_index(&service, &instance()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("Movie A").unwrap().canonical_path,
            PathBuf::from("/lib/A.mkv")
        );
        assert!(index.get("Movie B").is_none());
    }

    #[test]
    fn test_instance_without_files_yields_empty_index() {
        let service = FixedItems(vec![item(ItemIdentity::movie("Movie B"), None, false)]);
        let index = build_canonical_index(&service, &instance()).unwrap();
        assert!(index.is_empty());
        assert!(index.get("Movie B").is_none());
    }

    #[test]
    fn test_later_item_wins_on_key_collision() {
        let service = FixedItems(vec![
            item(ItemIdentity::movie("Remake"), Some("/lib/Remake (1998).mkv"), true),
            item(ItemIdentity::movie("Remake"), Some("/lib/Remake (2021).mkv"), true),
        ]);
        let index = build_canonical_index(&service, &instance()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("Remake").unwrap().canonical_path,
            PathBuf::from("/lib/Remake (2021).mkv")
        );
    }

    #[test]
    fn test_episode_items_use_episode_keys() {
        let service = FixedItems(vec![item(
            ItemIdentity::episode("Show", 2, 5),
            Some("/tv/Show/S02E05.mkv"),
            true,
        )]);
        let index = build_canonical_index(&service, &instance()).unwrap();
        assert!(index.get("Show - 2x05").is_some());
    }

    #[test]
    fn test_service_failure_propagates() {
        let err = build_canonical_index(&Down, &instance()).unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { .. }));
    }
}
