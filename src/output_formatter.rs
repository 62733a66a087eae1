//! Rendering of phase results.
//!
//! Nothing in the conversion, rewrite or deletion code prints. Each phase
//! returns a report and the functions here turn it into the lines the user
//! sees.

use crate::assets::relative_path;
use crate::converter::{ConversionReport, FileOutcome};
use crate::deleter::{DeleteOutcome, DeletionReport};
use crate::errors::Result;
use crate::replacer::{PreviewReport, RewriteReport};
use crate::walker::WalkIssue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Output formats for a reference preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A simple, human-readable text format.
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// Comma-Separated Values format.
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

/// Formats a reference preview in one of the [`OutputFormat`]s.
pub struct OutputFormatter {
    format: OutputFormat,
    tool_name: String,
    tool_version: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            tool_name: "webpify".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Writes the preview; file paths are shown relative to `root`.
    pub fn write_preview<W: Write>(
        &self,
        writer: &mut W,
        preview: &PreviewReport,
        root: &Path,
    ) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => format_preview_text(preview, root),
            OutputFormat::Json => self.format_json(preview, root)?,
            OutputFormat::Csv => format_csv(preview, root)?,
        };
        writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn format_json(&self, preview: &PreviewReport, root: &Path) -> Result<String> {
        #[derive(Serialize)]
        struct JsonOutput {
            tool: ToolInfo,
            generated_at: DateTime<Utc>,
            files_scanned: usize,
            total_references: usize,
            files: Vec<JsonFile>,
        }

        #[derive(Serialize)]
        struct ToolInfo {
            name: String,
            version: String,
        }

        #[derive(Serialize)]
        struct JsonFile {
            file: String,
            changes: Vec<JsonChange>,
        }

        #[derive(Serialize)]
        struct JsonChange {
            line: usize,
            from: String,
            to: String,
        }

        let output = JsonOutput {
            tool: ToolInfo {
                name: self.tool_name.clone(),
                version: self.tool_version.clone(),
            },
            generated_at: Utc::now(),
            files_scanned: preview.files_scanned,
            total_references: preview.total_references(),
            files: preview
                .files
                .iter()
                .map(|f| JsonFile {
                    file: relative_path(root, &f.file_path),
                    changes: f
                        .references
                        .iter()
                        .map(|r| JsonChange {
                            line: r.line_number,
                            from: r.matched_text.clone(),
                            to: r.replacement_text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&output)? + "\n")
    }
}

/// The dry-run listing: one header per file, one line per change.
pub fn format_preview_text(preview: &PreviewReport, root: &Path) -> String {
    let mut output = format!("\n👁️  Preview of changes ({} files):\n", preview.files.len());
    for file in &preview.files {
        output.push_str(&format!("📄 {}:\n", relative_path(root, &file.file_path)));
        for r in &file.references {
            output.push_str(&format!(
                "   Line {}: \"{}\" → \"{}\"\n",
                r.line_number, r.matched_text, r.replacement_text
            ));
        }
    }
    output
}

fn format_csv(preview: &PreviewReport, root: &Path) -> Result<String> {
    use csv::Writer;

    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(["File", "Line", "From", "To"])?;

    for file in &preview.files {
        let name = relative_path(root, &file.file_path);
        for r in &file.references {
            let line = r.line_number.to_string();
            wtr.write_record([
                name.as_str(),
                line.as_str(),
                r.matched_text.as_str(),
                r.replacement_text.as_str(),
            ])?;
        }
    }

    let data = wtr.into_inner().map_err(|e| format!("CSV writer error: {}", e))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// One progress line per converted, skipped or failed image.
pub fn format_outcome(outcome: &FileOutcome, root: &Path) -> String {
    match outcome {
        FileOutcome::Converted(image) => format!(
            "✅ Converted: {} → {}",
            relative_path(root, &image.source),
            image
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ),
        FileOutcome::Skipped { source } => {
            format!("⏭️  Skipped: {} (excluded)", relative_path(root, source))
        }
        FileOutcome::Failed { source, message } => {
            format!("❌ Error converting {}: {}", relative_path(root, source), message)
        }
    }
}

/// End-of-conversion totals. Errors and skips are always listed so partial
/// failure stays visible.
pub fn format_conversion_summary(report: &ConversionReport) -> String {
    format!(
        "\n📈 Conversion complete!\n✅ Successfully converted: {} images\n⏭️  Skipped: {} images\n❌ Errors: {} images\n",
        report.converted, report.skipped, report.errors
    )
}

pub fn format_rewrite_report(report: &RewriteReport, root: &Path) -> String {
    let mut output = String::new();
    for (path, count) in &report.updated {
        output.push_str(&format!(
            "📝 Updated: {} ({} references)\n",
            relative_path(root, path),
            count
        ));
    }
    output.push_str(&format!(
        "✅ Updated {} code file(s) with {} image reference(s)\n",
        report.files_updated(),
        report.total_replacements()
    ));
    output
}

pub fn format_delete_outcome(outcome: &DeleteOutcome, root: &Path) -> Option<String> {
    match outcome {
        DeleteOutcome::Deleted(p) => Some(format!("🗑️  Deleted: {}", relative_path(root, p))),
        DeleteOutcome::WouldDelete(p) => Some(format!("Would delete: {}", relative_path(root, p))),
        DeleteOutcome::NoWebp(p) => Some(format!(
            "⚠️  Skipped: {} (no WebP version found)",
            relative_path(root, p)
        )),
        DeleteOutcome::Excluded(p) => {
            Some(format!("⏭️  Kept: {} (excluded)", relative_path(root, p)))
        }
        // Failures are reported with the other issues.
        DeleteOutcome::Failed { .. } => None,
    }
}

pub fn format_deletion_report(report: &DeletionReport, root: &Path, dry_run: bool) -> String {
    let mut output = String::new();
    for outcome in &report.outcomes {
        if let Some(line) = format_delete_outcome(outcome, root) {
            output.push_str(&line);
            output.push('\n');
        }
    }
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    output.push_str(&format!(
        "✅ {} {} original files ({} skipped)\n",
        verb, report.deleted, report.skipped
    ));
    output
}

/// One diagnostic line for an entry that could not be processed.
pub fn format_issue(issue: &WalkIssue) -> String {
    match &issue.path {
        Some(path) => format!("❌ Error accessing {}: {}", path.display(), issue.message),
        None => format!("❌ Error: {}", issue.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConvertedImage;
    use crate::replacer::{CodeReference, FileChanges};
    use std::path::PathBuf;

    fn preview() -> PreviewReport {
        let file = PathBuf::from("/site/pages/index.html");
        PreviewReport {
            files: vec![FileChanges {
                file_path: file.clone(),
                references: vec![CodeReference {
                    file_path: file,
                    line_number: 3,
                    matched_text: "logo.png".to_string(),
                    replacement_text: "logo.webp".to_string(),
                }],
            }],
            files_scanned: 4,
            failures: vec![],
        }
    }

    #[test]
    fn test_text_preview() {
        let text = format_preview_text(&preview(), Path::new("/site"));
        assert!(text.contains("Preview of changes (1 files)"));
        assert!(text.contains("📄 pages/index.html:"));
        assert!(text.contains("Line 3: \"logo.png\" → \"logo.webp\""));
    }

    #[test]
    fn test_json_preview() {
        let mut out = Vec::new();
        OutputFormatter::new(OutputFormat::Json)
            .write_preview(&mut out, &preview(), Path::new("/site"))
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["tool"]["name"], "webpify");
        assert_eq!(value["total_references"], 1);
        assert_eq!(value["files"][0]["file"], "pages/index.html");
        assert_eq!(value["files"][0]["changes"][0]["to"], "logo.webp");
    }

    #[test]
    fn test_csv_preview() {
        let mut out = Vec::new();
        OutputFormatter::new(OutputFormat::from("CSV"))
            .write_preview(&mut out, &preview(), Path::new("/site"))
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "File,Line,From,To");
        assert_eq!(lines[1], "pages/index.html,3,logo.png,logo.webp");
    }

    #[test]
    fn test_outcome_lines() {
        let root = Path::new("/site");
        let converted = FileOutcome::Converted(ConvertedImage {
            source: PathBuf::from("/site/img/a.png"),
            output: PathBuf::from("/site/img/a.webp"),
        });
        assert_eq!(format_outcome(&converted, root), "✅ Converted: img/a.png → a.webp");

        let failed = FileOutcome::Failed {
            source: PathBuf::from("/site/b.jpg"),
            message: "bad data".to_string(),
        };
        assert_eq!(format_outcome(&failed, root), "❌ Error converting b.jpg: bad data");
    }

    #[test]
    fn test_summary_always_lists_counts() {
        let summary = format_conversion_summary(&ConversionReport::default());
        assert!(summary.contains("Successfully converted: 0"));
        assert!(summary.contains("Skipped: 0"));
        assert!(summary.contains("Errors: 0"));
    }
}
