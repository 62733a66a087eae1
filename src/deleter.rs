use crate::assets::ImageAsset;
use crate::config::Settings;
use crate::errors::Result;
use crate::output_formatter::{format_deletion_report, format_issue};
use crate::patterns::ExclusionMatcher;
use crate::walker::{WalkIssue, find_images};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one original image.
#[derive(Debug, Clone)]
pub enum DeleteOutcome {
    Deleted(PathBuf),
    /// `dry_run` was set; the file would have been deleted.
    WouldDelete(PathBuf),
    /// No `.webp` sibling on disk, so the original stays.
    NoWebp(PathBuf),
    /// Matched an exclusion pattern.
    Excluded(PathBuf),
    Failed { path: PathBuf, message: String },
}

/// Totals of one deletion pass.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    pub deleted: usize,
    pub skipped: usize,
    pub outcomes: Vec<DeleteOutcome>,
    pub failures: Vec<WalkIssue>,
}

/// Deletes the original if, and only if, its `.webp` sibling exists right now.
pub fn delete_original(image: &ImageAsset, dry_run: bool) -> DeleteOutcome {
    let path = image.path.clone();
    if !image.webp_path().is_file() {
        return DeleteOutcome::NoWebp(path);
    }
    if dry_run {
        return DeleteOutcome::WouldDelete(path);
    }

    match fs::remove_file(&path) {
        Ok(()) => DeleteOutcome::Deleted(path),
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            DeleteOutcome::Failed {
                path,
                message: e.to_string(),
            }
        }
    }
}

/// Walks `root` and removes every original that has a converted counterpart.
///
/// Images matching `exclusions` are never touched.
pub fn delete_originals(
    root: &Path,
    exclusions: &ExclusionMatcher,
    dry_run: bool,
) -> DeletionReport {
    let walk = find_images(root);
    let mut report = DeletionReport {
        failures: walk.issues,
        ..DeletionReport::default()
    };

    for image in &walk.items {
        let outcome = if exclusions.should_exclude(&image.relative_path) {
            DeleteOutcome::Excluded(image.path.clone())
        } else {
            delete_original(image, dry_run)
        };

        match &outcome {
            DeleteOutcome::Deleted(_) | DeleteOutcome::WouldDelete(_) => report.deleted += 1,
            DeleteOutcome::NoWebp(_) | DeleteOutcome::Excluded(_) => report.skipped += 1,
            DeleteOutcome::Failed { path, message } => report.failures.push(WalkIssue {
                path: Some(path.clone()),
                message: message.clone(),
            }),
        }
        report.outcomes.push(outcome);
    }

    report
}

/// The main entry point for the `delete` command.
pub fn run_delete(dir: PathBuf, dry_run: bool, exclude: Vec<String>, settings: &Settings) -> Result<()> {
    let exclusions = ExclusionMatcher::new(&settings.exclusions_with(exclude))?;

    println!("Searching for converted originals in {}...\n", dir.display());
    let report = delete_originals(&dir, &exclusions, dry_run);
    print!("{}", format_deletion_report(&report, &dir, dry_run));
    for issue in &report.failures {
        eprintln!("{}", format_issue(issue));
    }

    if dry_run {
        println!("\nRun without --dry-run to remove these files");
    }
    Ok(())
}
