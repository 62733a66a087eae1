//! User decisions for a conversion run.
//!
//! The orchestrator asks everything through [`Prompter`], so the same pipeline
//! runs interactively ([`TerminalPrompter`]) or from command-line flags
//! ([`FlagPrompter`]).

use crate::assets::ImageAsset;
use crate::errors::Result;
use crate::patterns::{QualityPreset, parse_pattern_list};
use crate::scanner::{CandidateDir, validate_directory};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::path::{Path, PathBuf};

/// How the user wants to keep images out of the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionChoice {
    None,
    /// Raw patterns, already split on commas.
    Patterns(Vec<String>),
    /// Root-relative paths of images picked from a list.
    Selected(Vec<String>),
}

/// The yes/no questions of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Convert { count: usize },
    UpdateReferences,
    ApplyChanges { files: usize },
    DeleteOriginals,
}

impl Confirmation {
    pub fn message(&self) -> String {
        match self {
            Confirmation::Convert { count } => {
                format!("Convert {count} image(s) to WebP format?")
            }
            Confirmation::UpdateReferences => {
                "📝 Update code files to use new WebP images? (Only changes file extensions safely)"
                    .to_string()
            }
            Confirmation::ApplyChanges { files } => {
                format!("Apply these changes to {files} code file(s)?")
            }
            Confirmation::DeleteOriginals => {
                "🗑️  Delete original files after successful conversion?".to_string()
            }
        }
    }

    /// Deleting is the only question that defaults to "no".
    pub fn default_answer(&self) -> bool {
        !matches!(self, Confirmation::DeleteOriginals)
    }
}

/// Source of every decision the orchestrator needs.
pub trait Prompter {
    /// Picks the conversion root from `candidates` or asks for another path.
    fn choose_directory(&mut self, candidates: &[CandidateDir], base: &Path) -> Result<PathBuf>;

    /// Picks the WebP quality.
    fn choose_quality(&mut self) -> Result<u8>;

    /// Decides which of `images` stay out of the conversion.
    fn choose_exclusions(&mut self, images: &[ImageAsset]) -> Result<ExclusionChoice>;

    fn confirm(&mut self, question: Confirmation) -> Result<bool>;
}

/// Asks on the terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
    default_quality: u8,
    default_exclude: Vec<String>,
}

impl TerminalPrompter {
    /// `default_quality` preselects the matching menu entry, if there is one.
    /// `default_exclude` prefills the pattern prompt.
    pub fn new(default_quality: Option<u8>, default_exclude: Vec<String>) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            default_quality: default_quality.unwrap_or(QualityPreset::default().quality()),
            default_exclude,
        }
    }
}

impl Prompter for TerminalPrompter {
    fn choose_directory(&mut self, candidates: &[CandidateDir], base: &Path) -> Result<PathBuf> {
        let mut items: Vec<String> = candidates
            .iter()
            .map(|c| {
                if c.is_base() {
                    format!("🏠 Current directory ({} images found)", c.image_count)
                } else {
                    format!("📁 ./{}/ ({} images found)", c.label, c.image_count)
                }
            })
            .collect();
        items.push("📂 Specify a different path".to_string());

        let choice = Select::with_theme(&self.theme)
            .with_prompt("📁 Where are your images located?")
            .items(&items)
            .default(0)
            .interact()?;

        if let Some(candidate) = candidates.get(choice) {
            return Ok(candidate.path.clone());
        }

        let input = Input::<String>::with_theme(&self.theme)
            .with_prompt("📁 Enter the directory path containing images")
            .default("./".to_string())
            .validate_with(|input: &String| validate_directory(input, base).map(|_| ()))
            .interact_text()?;

        Ok(validate_directory(&input, base)?)
    }

    fn choose_quality(&mut self) -> Result<u8> {
        let items: Vec<String> = QualityPreset::ALL.iter().map(|p| p.label()).collect();
        let default = QualityPreset::ALL
            .iter()
            .position(|p| p.quality() == self.default_quality)
            .unwrap_or(1);

        let choice = Select::with_theme(&self.theme)
            .with_prompt("🎨 Choose WebP quality")
            .items(&items)
            .default(default)
            .interact()?;

        Ok(QualityPreset::ALL[choice].quality())
    }

    fn choose_exclusions(&mut self, images: &[ImageAsset]) -> Result<ExclusionChoice> {
        let modes = [
            "Convert every image",
            "Exclude images by pattern (name, wildcard or text)",
            "Pick images to exclude from a list",
        ];
        let mode = Select::with_theme(&self.theme)
            .with_prompt("🚫 Exclude any images?")
            .items(&modes)
            .default(if self.default_exclude.is_empty() { 0 } else { 1 })
            .interact()?;

        match mode {
            1 => {
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt("Patterns to exclude (comma-separated, e.g. *thumbnail*, logo.png)");
                if !self.default_exclude.is_empty() {
                    input = input.default(self.default_exclude.join(", "));
                }
                let raw = input
                    .validate_with(|input: &String| {
                        if parse_pattern_list(input).is_empty() {
                            Err("Please enter at least one pattern")
                        } else {
                            Ok(())
                        }
                    })
                    .interact_text()?;
                Ok(ExclusionChoice::Patterns(parse_pattern_list(&raw)))
            }
            2 => {
                let items: Vec<&str> = images.iter().map(|i| i.relative_path.as_str()).collect();
                let picked = MultiSelect::with_theme(&self.theme)
                    .with_prompt("Select images to exclude (space to toggle, enter to confirm)")
                    .items(&items)
                    .interact()?;
                if picked.is_empty() {
                    return Ok(ExclusionChoice::None);
                }
                Ok(ExclusionChoice::Selected(
                    picked.into_iter().map(|i| items[i].to_string()).collect(),
                ))
            }
            _ => Ok(ExclusionChoice::None),
        }
    }

    fn confirm(&mut self, question: Confirmation) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(question.message())
            .default(question.default_answer())
            .interact()?)
    }
}

/// Answers from command-line flags; never reads the terminal.
#[derive(Debug, Clone)]
pub struct FlagPrompter {
    pub root: PathBuf,
    pub quality: u8,
    pub exclude: Vec<String>,
    pub update_refs: bool,
    pub delete_originals: bool,
}

impl Prompter for FlagPrompter {
    fn choose_directory(&mut self, _candidates: &[CandidateDir], base: &Path) -> Result<PathBuf> {
        let root = self.root.to_string_lossy();
        Ok(validate_directory(&root, base)?)
    }

    fn choose_quality(&mut self) -> Result<u8> {
        if self.quality > 100 {
            return Err(format!("quality must be between 0 and 100, got {}", self.quality).into());
        }
        Ok(self.quality)
    }

    fn choose_exclusions(&mut self, _images: &[ImageAsset]) -> Result<ExclusionChoice> {
        let patterns: Vec<String> = self
            .exclude
            .iter()
            .flat_map(|p| parse_pattern_list(p))
            .collect();
        if patterns.is_empty() {
            Ok(ExclusionChoice::None)
        } else {
            Ok(ExclusionChoice::Patterns(patterns))
        }
    }

    fn confirm(&mut self, question: Confirmation) -> Result<bool> {
        Ok(match question {
            Confirmation::Convert { .. } => true,
            Confirmation::UpdateReferences | Confirmation::ApplyChanges { .. } => self.update_refs,
            Confirmation::DeleteOriginals => self.delete_originals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn flags(root: &Path) -> FlagPrompter {
        FlagPrompter {
            root: root.to_path_buf(),
            quality: 80,
            exclude: vec!["a.png, *thumb*".to_string(), " ".to_string()],
            update_refs: true,
            delete_originals: false,
        }
    }

    #[test]
    fn test_flag_prompter_answers_from_flags() {
        let temp_dir = TempDir::new().unwrap();
        let mut p = flags(temp_dir.path());

        assert!(p.confirm(Confirmation::Convert { count: 3 }).unwrap());
        assert!(p.confirm(Confirmation::UpdateReferences).unwrap());
        assert!(p.confirm(Confirmation::ApplyChanges { files: 1 }).unwrap());
        assert!(!p.confirm(Confirmation::DeleteOriginals).unwrap());
        assert_eq!(
            p.choose_exclusions(&[]).unwrap(),
            ExclusionChoice::Patterns(vec!["a.png".to_string(), "*thumb*".to_string()])
        );
        assert_eq!(p.choose_quality().unwrap(), 80);
    }

    #[test]
    fn test_flag_prompter_rejects_bad_input() {
        let temp_dir = TempDir::new().unwrap();
        let mut p = flags(&temp_dir.path().join("missing"));
        assert!(p.choose_directory(&[], temp_dir.path()).is_err());

        p.quality = 101;
        assert!(p.choose_quality().is_err());
    }

    #[test]
    fn test_confirmation_defaults() {
        assert!(Confirmation::Convert { count: 1 }.default_answer());
        assert!(Confirmation::UpdateReferences.default_answer());
        assert!(!Confirmation::DeleteOriginals.default_answer());
        assert_eq!(
            Confirmation::Convert { count: 2 }.message(),
            "Convert 2 image(s) to WebP format?"
        );
    }
}
