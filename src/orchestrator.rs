use crate::assets::ImageAsset;
use crate::config::Settings;
use crate::converter::{ConversionReport, ImageCodec, WebpCodec, convert_images};
use crate::deleter::{DeletionReport, delete_originals};
use crate::errors::{Error, Result};
use crate::output_formatter::{
    format_conversion_summary, format_deletion_report, format_issue, format_outcome,
    format_preview_text, format_rewrite_report,
};
use crate::patterns::ExclusionMatcher;
use crate::prompt::{Confirmation, ExclusionChoice, FlagPrompter, Prompter, TerminalPrompter};
use crate::replacer::{ReferenceRewriter, RewriteReport};
use crate::scanner::detect_image_dirs;
use crate::walker::{WalkIssue, find_images};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// What a run did, phase by phase. Phases that did not run are `None`.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub root: PathBuf,
    pub quality: u8,
    pub cancelled: bool,
    pub conversion: Option<ConversionReport>,
    pub rewrite: Option<RewriteReport>,
    pub deletion: Option<DeletionReport>,
}

/// Drives one conversion run from directory choice to deletion.
///
/// Every step is sequential: each image is fully converted before the next
/// one starts, and a phase only begins after the previous one returned.
pub struct Orchestrator<'a, C: ?Sized, P: ?Sized, W> {
    codec: &'a C,
    prompter: &'a mut P,
    out: W,
    settings: Settings,
    base: PathBuf,
    show_progress: bool,
}

impl<'a, C, P, W> Orchestrator<'a, C, P, W>
where
    C: ImageCodec + ?Sized,
    P: Prompter + ?Sized,
    W: Write,
{
    /// `base` is where candidate directories are looked for and relative
    /// paths are resolved from.
    pub fn new(codec: &'a C, prompter: &'a mut P, out: W, settings: Settings, base: PathBuf) -> Self {
        Self {
            codec,
            prompter,
            out,
            settings,
            base,
            show_progress: false,
        }
    }

    /// Draws a progress bar while converting.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        let candidates = detect_image_dirs(&self.base);
        let root = self.prompter.choose_directory(&candidates, &self.base)?;
        writeln!(self.out, "\n📂 Using directory: {}", root.display())?;

        let walk = find_images(&root);
        self.report_issues(&walk.issues)?;
        let images = walk.items;
        if images.is_empty() {
            return Err(Error::NoImages { root });
        }

        let mut summary = RunSummary {
            root: root.clone(),
            ..RunSummary::default()
        };

        summary.quality = self.prompter.choose_quality()?;
        let exclusions = self.resolve_exclusions(&images)?;
        let eligible = images
            .iter()
            .filter(|i| !exclusions.should_exclude(&i.relative_path))
            .count();

        writeln!(
            self.out,
            "\n📊 Found {} image(s) to convert ({} excluded)",
            eligible,
            images.len() - eligible
        )?;

        if eligible > 0 && !self.prompter.confirm(Confirmation::Convert { count: eligible })? {
            writeln!(self.out, "👋 Operation cancelled")?;
            summary.cancelled = true;
            return Ok(summary);
        }

        writeln!(self.out, "\n🔄 Converting images...")?;
        let conversion = self.convert(&images, summary.quality, &exclusions, &root)?;
        write!(self.out, "{}", format_conversion_summary(&conversion))?;

        if conversion.converted > 0 {
            if self.prompter.confirm(Confirmation::UpdateReferences)? {
                summary.rewrite = self.update_references(&root, &conversion)?;
            }

            if self.prompter.confirm(Confirmation::DeleteOriginals)? {
                writeln!(self.out, "\n🗑️  Deleting original files...")?;
                let deletion = delete_originals(&root, &exclusions, false);
                write!(self.out, "{}", format_deletion_report(&deletion, &root, false))?;
                self.report_issues(&deletion.failures)?;
                summary.deletion = Some(deletion);
            }
        }

        summary.conversion = Some(conversion);
        writeln!(self.out, "\n🎉 All done! Your images have been optimized.")?;
        Ok(summary)
    }

    /// The prompter's answer is the whole exclusion set. Configured patterns
    /// only reach it as the prompter's default.
    fn resolve_exclusions(&mut self, images: &[ImageAsset]) -> Result<ExclusionMatcher> {
        match self.prompter.choose_exclusions(images)? {
            ExclusionChoice::None => Ok(ExclusionMatcher::default()),
            ExclusionChoice::Patterns(patterns) => ExclusionMatcher::new(&patterns),
            ExclusionChoice::Selected(paths) => Ok(ExclusionMatcher::from_selection(&paths)),
        }
    }

    fn convert(
        &mut self,
        images: &[ImageAsset],
        quality: u8,
        exclusions: &ExclusionMatcher,
        root: &Path,
    ) -> Result<ConversionReport> {
        let pb = if self.show_progress {
            let pb = ProgressBar::new(images.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .map_err(|e| Error::Config(e.to_string()))?
                    .progress_chars("##-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let out = &mut self.out;
        let mut write_error = None;
        let report = convert_images(images, self.codec, quality, exclusions, |outcome| {
            pb.inc(1);
            let line = format_outcome(outcome, root);
            if let Err(e) = pb.suspend(|| writeln!(out, "{line}")) {
                write_error.get_or_insert(e);
            }
        });
        pb.finish_and_clear();

        match write_error {
            Some(e) => Err(e.into()),
            None => Ok(report),
        }
    }

    fn update_references(
        &mut self,
        root: &Path,
        conversion: &ConversionReport,
    ) -> Result<Option<RewriteReport>> {
        writeln!(self.out, "\n📝 Scanning code files for image references...")?;
        writeln!(self.out, "🔒 Safe mode: Only updating file extensions (.jpg/.png → .webp)")?;

        let rewriter = ReferenceRewriter::new(&conversion.sources())?
            .with_code_extensions(&self.settings.code_extensions)
            .with_skip_dirs(&self.settings.skip_dirs);

        let preview = rewriter.preview(root);
        self.report_issues(&preview.failures)?;
        if preview.is_empty() {
            writeln!(self.out, "📝 No code files found that reference the converted images")?;
            return Ok(None);
        }

        write!(self.out, "{}", format_preview_text(&preview, root))?;
        let files = preview.files.len();
        if !self.prompter.confirm(Confirmation::ApplyChanges { files })? {
            writeln!(self.out, "⏭️  Skipped code updates")?;
            return Ok(None);
        }

        let report = rewriter.apply(root);
        write!(self.out, "{}", format_rewrite_report(&report, root))?;
        self.report_issues(&report.failures)?;
        info!(
            "rewrote {} reference(s) in {} file(s)",
            report.total_replacements(),
            report.files_updated()
        );
        Ok(Some(report))
    }

    fn report_issues(&mut self, issues: &[WalkIssue]) -> Result<()> {
        for issue in issues {
            writeln!(self.out, "{}", format_issue(issue))?;
        }
        Ok(())
    }
}

/// The main entry point for the interactive wizard.
pub fn run_interactive(settings: Settings) -> Result<RunSummary> {
    println!("🖼️  Welcome to Images to WebP Converter!");
    println!("═══════════════════════════════════════");

    let base = std::env::current_dir()?;
    let mut prompter = TerminalPrompter::new(settings.quality, settings.exclude.clone());
    let mut orchestrator = Orchestrator::new(&WebpCodec, &mut prompter, io::stdout(), settings, base)
        .with_progress(true);
    orchestrator.run()
}

/// The main entry point for the `convert` command: same pipeline, answers from flags.
pub fn run_convert(
    dir: PathBuf,
    quality: Option<u8>,
    exclude: Vec<String>,
    update_refs: bool,
    delete_originals: bool,
    settings: Settings,
) -> Result<RunSummary> {
    let base = std::env::current_dir()?;
    let mut prompter = FlagPrompter {
        root: dir,
        quality: quality.or(settings.quality).unwrap_or(80),
        exclude: settings.exclusions_with(exclude),
        update_refs,
        delete_originals,
    };
    let mut orchestrator = Orchestrator::new(&WebpCodec, &mut prompter, io::stdout(), settings, base)
        .with_progress(true);
    orchestrator.run()
}
