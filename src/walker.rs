use crate::assets::{ImageAsset, is_qualifying_image};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// An entry the walk could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkIssue {
    /// The directory or file that failed, when known.
    pub path: Option<PathBuf>,
    /// The underlying error message.
    pub message: String,
}

/// What a single walk produced: the matching items and the entries it skipped.
#[derive(Debug, Clone)]
pub struct WalkOutcome<T> {
    pub items: Vec<T>,
    pub issues: Vec<WalkIssue>,
}

impl<T> Default for WalkOutcome<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            issues: Vec::new(),
        }
    }
}

/// Collects every `.jpg`, `.jpeg` and `.png` file under `root`.
///
/// Unreadable directories, and images whose names are not valid UTF-8, are
/// recorded in `issues` and the walk moves on. Entries are visited in
/// file-name order inside each directory.
pub fn find_images(root: &Path) -> WalkOutcome<ImageAsset> {
    let mut outcome = WalkOutcome::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_qualifying_image(entry.path()) {
                    match ImageAsset::from_path(root, entry.path()) {
                        Some(asset) => outcome.items.push(asset),
                        None => {
                            warn!("skipping {}: file name is not valid UTF-8", entry.path().display());
                            outcome.issues.push(WalkIssue {
                                path: Some(entry.into_path()),
                                message: "file name is not valid UTF-8".to_string(),
                            });
                        }
                    }
                }
            }
            Err(e) => record_issue(&mut outcome.issues, e),
        }
    }

    debug!(
        "found {} image(s) under {}",
        outcome.items.len(),
        root.display()
    );
    outcome
}

/// Counts qualifying images under `root`, ignoring unreadable entries.
pub fn count_images(root: &Path) -> usize {
    find_images(root).items.len()
}

/// Collects files whose lowercase extension is in `extensions`, never
/// descending into a directory whose base name is in `skip_dirs`.
///
/// `extensions` are given without the leading dot.
pub fn find_code_files(
    root: &Path,
    extensions: &[String],
    skip_dirs: &[String],
) -> WalkOutcome<PathBuf> {
    let mut outcome = WalkOutcome::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e, skip_dirs));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                    outcome.items.push(entry.into_path());
                }
            }
            Err(e) => record_issue(&mut outcome.issues, e),
        }
    }

    outcome
}

/// Normalizes user-supplied extensions: trims, drops a leading dot, lowercases.
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn is_skipped_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| skip_dirs.iter().any(|d| d == name))
            .unwrap_or(false)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|os| os.to_str())
        .map(|s| extensions.contains(&s.to_lowercase()))
        .unwrap_or(false)
}

fn record_issue(issues: &mut Vec<WalkIssue>, err: walkdir::Error) {
    let path = err.path().map(Path::to_path_buf);
    let message = err
        .io_error()
        .map(|io| io.to_string())
        .unwrap_or_else(|| err.to_string());
    match &path {
        Some(p) => warn!("skipping {}: {}", p.display(), message),
        None => warn!("skipping entry: {}", message),
    }
    issues.push(WalkIssue { path, message });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn code_exts() -> Vec<String> {
        normalize_extensions(&["html", ".MD", " css "])
    }

    #[test]
    fn test_find_images_recurses_and_filters() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("top.PNG"), b"x").unwrap();
        fs::write(root.join("a/b/c/deep.jpeg"), b"x").unwrap();
        fs::write(root.join("a/skip.webp"), b"x").unwrap();
        fs::write(root.join("a/readme.md"), b"x").unwrap();

        let outcome = find_images(root);
        let mut names: Vec<_> = outcome.items.iter().map(|a| a.relative_path.clone()).collect();
        names.sort();

        assert_eq!(names, vec!["a/b/c/deep.jpeg", "top.PNG"]);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_walk_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["z.png", "m.jpg", "a.png"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let first: Vec<_> = find_images(temp_dir.path()).items;
        let second: Vec<_> = find_images(temp_dir.path()).items;
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_code_files_skips_denied_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("node_modules/pkg/index.html"), "logo.png").unwrap();
        fs::write(root.join("src/page.HTML"), "logo.png").unwrap();
        fs::write(root.join("src/main.rs"), "logo.png").unwrap();
        fs::write(root.join("notes.md"), "logo.png").unwrap();

        let skip = vec!["node_modules".to_string()];
        let outcome = find_code_files(root, &code_exts(), &skip);
        let mut found: Vec<_> = outcome
            .items
            .iter()
            .map(|p| crate::assets::relative_path(root, p))
            .collect();
        found.sort();

        assert_eq!(found, vec!["notes.md", "src/page.HTML"]);
    }

    #[test]
    fn test_root_named_like_skip_dir_is_still_walked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("build");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("index.html"), "").unwrap();

        let skip = vec!["build".to_string()];
        let outcome = find_code_files(&root, &code_exts(), &skip);
        assert_eq!(outcome.items.len(), 1);
    }

    #[test]
    fn test_missing_root_is_reported_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = find_images(&temp_dir.path().join("gone"));
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.issues.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_image_name_is_reported() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let odd = root.join(OsStr::from_bytes(b"caf\xe9.png"));
        fs::write(&odd, b"x").unwrap();
        fs::write(root.join("plain.png"), b"x").unwrap();

        let outcome = find_images(root);

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].file_name, "plain.png");
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].path.as_deref(), Some(odd.as_path()));
        assert!(outcome.issues[0].message.contains("UTF-8"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.png"), b"x").unwrap();
        fs::write(root.join("visible.png"), b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; only assert when the lock actually holds.
        let locked_out = fs::read_dir(&locked).is_err();
        let outcome = find_images(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if locked_out {
            assert_eq!(outcome.items.len(), 1);
            assert_eq!(outcome.items[0].file_name, "visible.png");
            assert_eq!(outcome.issues.len(), 1);
        } else {
            assert_eq!(outcome.items.len(), 2);
        }
    }
}
