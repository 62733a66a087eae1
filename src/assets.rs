//! Image assets and the `.webp` path derivation shared by every phase.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extensions (lowercase, without the dot) of images that get converted.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// The extension every converted image ends up with.
pub const WEBP_EXTENSION: &str = "webp";

static IMAGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png)$").expect("image suffix pattern is valid")
});

/// A qualifying image found during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Absolute (or root-joined) path to the image.
    pub path: PathBuf,
    /// Path relative to the walk root, always with `/` separators.
    pub relative_path: String,
    /// Base file name, e.g. `logo.png`.
    pub file_name: String,
    /// Lowercase extension without the dot.
    pub extension: String,
}

impl ImageAsset {
    /// Builds an asset for `path` under `root`.
    ///
    /// Returns `None` when the path is not a qualifying image or its name is
    /// not valid UTF-8.
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }

        Some(Self {
            path: path.to_path_buf(),
            relative_path: relative_path(root, path),
            file_name,
            extension,
        })
    }

    /// Where the converted copy of this image lives.
    pub fn webp_path(&self) -> PathBuf {
        webp_path_for(&self.path)
    }
}

/// Returns `true` if the path has a `.jpg`, `.jpeg` or `.png` extension (any case).
pub fn is_qualifying_image(path: &Path) -> bool {
    path.extension()
        .and_then(|os| os.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Returns `true` if `text` ends with an image extension, case-insensitively.
pub fn has_image_suffix(text: &str) -> bool {
    IMAGE_SUFFIX.is_match(text)
}

/// Swaps a trailing `.jpg`/`.jpeg`/`.png` for `.webp`.
///
/// Text without one of those suffixes is returned unchanged, which makes the
/// function idempotent.
pub fn with_webp_extension(text: &str) -> String {
    IMAGE_SUFFIX.replace(text, ".webp").into_owned()
}

/// Derives the `.webp` sibling of an image path.
pub fn webp_path_for(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(with_webp_extension(s)),
        None => {
            if is_qualifying_image(path) {
                path.with_extension(WEBP_EXTENSION)
            } else {
                path.to_path_buf()
            }
        }
    }
}

/// Renders `path` relative to `root` using `/` separators.
///
/// Falls back to the full path when `path` is not under `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webp_path_replaces_only_trailing_extension() {
        assert_eq!(webp_path_for(Path::new("a/b/photo.jpg")), PathBuf::from("a/b/photo.webp"));
        assert_eq!(webp_path_for(Path::new("x.jpeg")), PathBuf::from("x.webp"));
        assert_eq!(webp_path_for(Path::new("LOGO.PNG")), PathBuf::from("LOGO.webp"));
        assert_eq!(webp_path_for(Path::new("dir.png/pic.Jpg")), PathBuf::from("dir.png/pic.webp"));
        assert_eq!(webp_path_for(Path::new("a.png.bak")), PathBuf::from("a.png.bak"));
    }

    #[test]
    fn test_webp_derivation_is_idempotent() {
        for p in ["a.png", "b/c.JPG", "d.jpeg", "e.webp", "notes.md"] {
            let once = webp_path_for(Path::new(p));
            let twice = webp_path_for(&once);
            assert_eq!(once, twice, "{p}");
        }
    }

    #[test]
    fn test_qualifying_images() {
        assert!(is_qualifying_image(Path::new("a.PNG")));
        assert!(is_qualifying_image(Path::new("a.jpeg")));
        assert!(!is_qualifying_image(Path::new("a.webp")));
        assert!(!is_qualifying_image(Path::new("png")));
    }

    #[test]
    fn test_asset_from_path() {
        let root = Path::new("/site");
        let asset = ImageAsset::from_path(root, Path::new("/site/img/Hero.JPG")).unwrap();
        assert_eq!(asset.relative_path, "img/Hero.JPG");
        assert_eq!(asset.file_name, "Hero.JPG");
        assert_eq!(asset.extension, "jpg");
        assert_eq!(asset.webp_path(), PathBuf::from("/site/img/Hero.webp"));
        assert!(ImageAsset::from_path(root, Path::new("/site/readme.md")).is_none());
    }
}
