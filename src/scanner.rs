use crate::walker::count_images;
use std::path::{Path, PathBuf};

/// Conventional places where web projects keep their images.
pub const COMMON_IMAGE_DIRS: &[&str] = &[
    "public",
    "assets",
    "images",
    "img",
    "static",
    "src/assets",
    "public/images",
];

/// A directory offered as a conversion root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDir {
    /// How the directory is shown to the user (`.` for the base itself).
    pub label: String,
    pub path: PathBuf,
    pub image_count: usize,
}

impl CandidateDir {
    pub fn is_base(&self) -> bool {
        self.label == "."
    }
}

/// Lists where images could be converted from.
///
/// The base directory always comes first, even with zero images. The
/// conventional subdirectories follow, but only those that exist and hold at
/// least one image.
pub fn detect_image_dirs(base: &Path) -> Vec<CandidateDir> {
    let mut candidates = vec![CandidateDir {
        label: ".".to_string(),
        path: base.to_path_buf(),
        image_count: count_images(base),
    }];

    for dir in COMMON_IMAGE_DIRS {
        let path = base.join(dir);
        if !path.is_dir() {
            continue;
        }
        let image_count = count_images(&path);
        if image_count > 0 {
            candidates.push(CandidateDir {
                label: dir.to_string(),
                path,
                image_count,
            });
        }
    }

    candidates
}

/// Checks that `input` names an existing directory and returns its absolute path.
pub fn validate_directory(input: &str, base: &Path) -> std::result::Result<PathBuf, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Please enter a directory path".to_string());
    }

    let path = base.join(trimmed);
    match path.metadata() {
        Ok(meta) if meta.is_dir() => Ok(path.canonicalize().unwrap_or(path)),
        Ok(_) => Err("Path is not a directory".to_string()),
        Err(_) => Err("Directory does not exist or is not accessible".to_string()),
    }
}
