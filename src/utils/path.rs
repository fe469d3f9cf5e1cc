use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, symlink-resolved form.
///
/// Existing paths go through `fs::canonicalize`. For a path that does not
/// exist, the longest existing ancestor is canonicalized and the remaining
/// components are appended after lexical normalisation, so missing files
/// still compare equal to their resolved siblings.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }

    let absolute = match absolutize(path) {
        Ok(p) => p,
        Err(_) => return normalize_lexically(path),
    };

    let mut existing = absolute.as_path();
    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(existing) {
            let mut result = resolved;
            for part in tail.iter().rev() {
                result.push(part);
            }
            return normalize_lexically(&result);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return normalize_lexically(&absolute),
        }
    }
}

/// Make a path absolute against the current directory without touching the
/// filesystem.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_lexically(path))
    } else {
        Ok(normalize_lexically(&std::env::current_dir()?.join(path)))
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component.as_os_str());
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Name a quarantined file `"{title}_{file_name}"`. The title is made
/// filename-safe so the result always lands directly in `quarantine_dir`.
pub fn quarantine_destination(quarantine_dir: &Path, title: &str, source: &Path) -> PathBuf {
    let base_filename = source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    quarantine_dir.join(format!(
        "{}_{}",
        sanitize_file_component(title),
        base_filename
    ))
}

/// Replace characters that are not safe in a file name component.
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_quarantine_destination() {
        let dest = quarantine_destination(
            Path::new("/trash"),
            "Movie A",
            Path::new("/lib/A (1).mkv"),
        );
        assert_eq!(dest, PathBuf::from("/trash/Movie A_A (1).mkv"));
    }

    #[test]
    fn test_quarantine_destination_sanitizes_title() {
        let trash = Path::new("/trash");
        let dest = quarantine_destination(trash, "Face/Off", Path::new("/lib/FaceOff (1).mkv"));
        assert_eq!(dest, PathBuf::from("/trash/Face_Off_FaceOff (1).mkv"));

        let dest = quarantine_destination(trash, "../../etc", Path::new("/lib/x.mkv"));
        assert_eq!(dest.parent(), Some(trash));
    }

    #[test]
    fn test_resolve_missing_path_is_absolute_and_normalized() {
        let resolved = resolve_path(Path::new("/definitely/not/here/../there/file.mkv"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("definitely/not/there/file.mkv"));
    }

    #[test]
    fn test_resolve_missing_file_in_existing_dir_matches_sibling_resolution() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("lib");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("present.mkv"), "x").unwrap();

        let present = resolve_path(&dir.join("present.mkv"));
        let missing = resolve_path(&dir.join("missing.mkv"));
        assert_eq!(present.parent(), missing.parent());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlinks() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("real.mkv");
        fs::write(&target, "x").unwrap();
        let link = tmp.path().join("link.mkv");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(resolve_path(&link), resolve_path(&target));
    }

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("Radarr/4K:main"), "Radarr_4K_main");
        assert_eq!(sanitize_file_component("Movies"), "Movies");
    }
}
