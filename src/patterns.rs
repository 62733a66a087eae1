use crate::errors::Result;
use regex::{Regex, RegexBuilder};

/// Built-in WebP quality choices offered by the interactive menu.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QualityPreset {
    /// High quality (90).
    High,
    /// Standard quality (80).
    #[default]
    Standard,
    /// Good quality (70).
    Good,
    /// Smaller files (60).
    Smaller,
}

impl QualityPreset {
    /// All presets, in menu order.
    pub const ALL: [QualityPreset; 4] = [
        QualityPreset::High,
        QualityPreset::Standard,
        QualityPreset::Good,
        QualityPreset::Smaller,
    ];

    /// The encoder quality this preset stands for.
    pub fn quality(self) -> u8 {
        match self {
            QualityPreset::High => 90,
            QualityPreset::Standard => 80,
            QualityPreset::Good => 70,
            QualityPreset::Smaller => 60,
        }
    }

    /// Menu label, e.g. `High Quality (90)`.
    pub fn label(self) -> String {
        let name = match self {
            QualityPreset::High => "High Quality",
            QualityPreset::Standard => "Standard Quality",
            QualityPreset::Good => "Good Quality",
            QualityPreset::Smaller => "Smaller Size",
        };
        format!("{} ({})", name, self.quality())
    }
}

/// A single user-supplied exclusion rule.
#[derive(Debug, Clone)]
pub enum ExclusionPattern {
    /// Plain text: exact base name first, then case-insensitive substring of
    /// the base name or root-relative path.
    Literal(String),
    /// Contains `*`: compiled to a case-insensitive, fully anchored regex.
    Wildcard { raw: String, regex: Regex },
    /// An image picked from the list; matches that exact root-relative path.
    Selected(String),
}

impl ExclusionPattern {
    /// Classifies and compiles a raw pattern string.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains('*') {
            Ok(ExclusionPattern::Wildcard {
                raw: raw.to_string(),
                regex: wildcard_to_regex(raw)?,
            })
        } else {
            Ok(ExclusionPattern::Literal(raw.to_string()))
        }
    }

    /// The text the user typed (or the selected relative path).
    pub fn as_str(&self) -> &str {
        match self {
            ExclusionPattern::Literal(raw) => raw,
            ExclusionPattern::Wildcard { raw, .. } => raw,
            ExclusionPattern::Selected(path) => path,
        }
    }

    /// Tests this pattern against an image.
    ///
    /// `relative_path` uses `/` separators; the base name is its last segment.
    pub fn matches(&self, relative_path: &str) -> bool {
        let file_name = base_name(relative_path);

        if let ExclusionPattern::Selected(path) = self {
            return path == relative_path;
        }

        if self.as_str() == file_name {
            return true;
        }

        match self {
            ExclusionPattern::Wildcard { regex, .. } => {
                regex.is_match(file_name) || regex.is_match(relative_path)
            }
            ExclusionPattern::Literal(raw) => {
                let needle = raw.to_lowercase();
                file_name.to_lowercase().contains(&needle)
                    || relative_path.to_lowercase().contains(&needle)
            }
            ExclusionPattern::Selected(_) => false,
        }
    }
}

/// The exclusion set for one run.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    patterns: Vec<ExclusionPattern>,
}

impl ExclusionMatcher {
    /// Compiles raw pattern strings, dropping blank entries.
    pub fn new<S: AsRef<str>>(raw_patterns: &[S]) -> Result<Self> {
        let patterns = raw_patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(ExclusionPattern::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Builds a matcher from images picked out of a list.
    pub fn from_selection<S: AsRef<str>>(relative_paths: &[S]) -> Self {
        Self {
            patterns: relative_paths
                .iter()
                .map(|p| ExclusionPattern::Selected(p.as_ref().to_string()))
                .collect(),
        }
    }

    /// Returns `true` when any pattern excludes the image at `relative_path`.
    pub fn should_exclude(&self, relative_path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(relative_path))
    }
}

/// Splits comma-separated pattern input, trimming entries and dropping blanks.
pub fn parse_pattern_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Translates a `*` wildcard into a case-insensitive, anchored regex.
///
/// `*` matches any sequence of characters; every other character is literal.
pub fn wildcard_to_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Ok(RegexBuilder::new(&format!("^(?s:{body})$"))
        .case_insensitive(true)
        .build()?)
}

fn base_name(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> ExclusionMatcher {
        ExclusionMatcher::new(patterns).unwrap()
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let m = matcher(&[]);
        assert!(!m.should_exclude("a.png"));
        assert!(!m.should_exclude("deep/dir/b.jpg"));
    }

    #[test]
    fn test_wildcard_translation() {
        let m = matcher(&["*thumbnail*"]);
        assert!(m.should_exclude("hero-thumbnail.png"));
        assert!(m.should_exclude("thumbnail.jpg"));
        assert!(!m.should_exclude("thumb.png"));

        let m = matcher(&["temp*"]);
        assert!(m.should_exclude("temp1.jpg"));
        assert!(!m.should_exclude("atemp.jpg"));
    }

    #[test]
    fn test_wildcard_is_case_insensitive_and_checks_relative_path() {
        let m = matcher(&["icons/*.PNG"]);
        assert!(m.should_exclude("icons/star.png"));
        assert!(!m.should_exclude("other/star.png"));
    }

    #[test]
    fn test_wildcard_escapes_metacharacters() {
        let re = wildcard_to_regex("a+b(1).png").unwrap();
        assert!(re.is_match("a+b(1).png"));
        assert!(!re.is_match("aab1.png"));

        let re = wildcard_to_regex("img[1]*.jpg").unwrap();
        assert!(re.is_match("img[1]-large.jpg"));
        assert!(!re.is_match("img1-large.jpg"));

        let re = wildcard_to_regex("x.png").unwrap();
        assert!(!re.is_match("xxpng"));
    }

    #[test]
    fn test_exact_name_match() {
        let m = matcher(&["Logo.png"]);
        assert!(m.should_exclude("assets/Logo.png"));
    }

    #[test]
    fn test_substring_matches_name_or_path() {
        let m = matcher(&["ICON"]);
        assert!(m.should_exclude("img/app-icon.png"));

        let m = matcher(&["vendor/"]);
        assert!(m.should_exclude("vendor/brand.jpg"));
        assert!(!m.should_exclude("img/brand.jpg"));
    }

    #[test]
    fn test_or_semantics_across_patterns() {
        let paths = ["a.png", "temp1.jpg", "x/hero-thumbnail.png", "keep.jpeg"];
        let singles = ["nomatch", "temp*", "thumbnail"];
        let all = matcher(&singles);

        for path in paths {
            let any_single = singles.iter().any(|p| matcher(&[p]).should_exclude(path));
            assert_eq!(all.should_exclude(path), any_single, "{path}");

            let mut reversed = singles.to_vec();
            reversed.reverse();
            assert_eq!(matcher(&reversed).should_exclude(path), any_single, "{path}");
        }
    }

    #[test]
    fn test_selection_matches_exact_relative_path_only() {
        let m = ExclusionMatcher::from_selection(&["sub/a.png"]);
        assert!(m.should_exclude("sub/a.png"));
        assert!(!m.should_exclude("a.png"));
        assert!(!m.should_exclude("other/sub/a.png"));
    }

    #[test]
    fn test_parse_pattern_list() {
        assert_eq!(
            parse_pattern_list(" logo.png, *thumb* ,, temp "),
            vec!["logo.png", "*thumb*", "temp"]
        );
        assert!(parse_pattern_list(" , ").is_empty());
    }

    #[test]
    fn test_quality_presets() {
        let values: Vec<u8> = QualityPreset::ALL.iter().map(|p| p.quality()).collect();
        assert_eq!(values, vec![90, 80, 70, 60]);
        assert_eq!(QualityPreset::default().quality(), 80);
        assert_eq!(QualityPreset::High.label(), "High Quality (90)");
    }
}
