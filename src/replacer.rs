use crate::assets::{has_image_suffix, with_webp_extension};
use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::output_formatter::{OutputFormat, OutputFormatter, format_issue, format_rewrite_report};
use crate::walker::{WalkIssue, find_code_files, find_images, normalize_extensions};
use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Extensions of files that may reference images.
pub const DEFAULT_CODE_EXTENSIONS: &[&str] = &[
    "html", "css", "js", "jsx", "ts", "tsx", "vue", "svelte", "php", "md",
];

/// Directories never searched for references.
pub const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", ".next", "vendor"];

/// One proposed or applied substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeReference {
    pub file_path: PathBuf,
    /// 1-based.
    pub line_number: usize,
    pub matched_text: String,
    pub replacement_text: String,
}

/// A validated occurrence of an image filename inside a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Byte offset where the filename starts.
    pub start: usize,
    /// Byte offset one past the filename.
    pub end: usize,
    pub line_number: usize,
    pub from: String,
    pub to: String,
}

/// Proposed changes for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChanges {
    pub file_path: PathBuf,
    pub references: Vec<CodeReference>,
}

/// Result of a preview pass. Nothing on disk was touched.
#[derive(Debug, Clone, Default)]
pub struct PreviewReport {
    /// Only files with at least one reference, in walk order.
    pub files: Vec<FileChanges>,
    pub files_scanned: usize,
    pub failures: Vec<WalkIssue>,
}

impl PreviewReport {
    pub fn total_references(&self) -> usize {
        self.files.iter().map(|f| f.references.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Result of an apply pass.
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    /// Rewritten files and how many references each one got.
    pub updated: Vec<(PathBuf, usize)>,
    pub files_scanned: usize,
    pub failures: Vec<WalkIssue>,
}

impl RewriteReport {
    pub fn files_updated(&self) -> usize {
        self.updated.len()
    }

    pub fn total_replacements(&self) -> usize {
        self.updated.iter().map(|(_, n)| n).sum()
    }
}

/// Finds and rewrites references to converted images in text files.
///
/// Only the filename itself is ever replaced, and only its trailing image
/// extension changes. Quotes, directories, query strings and everything else
/// around the match stay byte-for-byte identical.
pub struct ReferenceRewriter {
    filenames: Vec<Regex>,
    code_extensions: Vec<String>,
    skip_dirs: Vec<String>,
}

impl ReferenceRewriter {
    /// Creates a rewriter for the base names of `images`.
    ///
    /// Duplicate base names (the same name in two directories) are searched once.
    pub fn new<P: AsRef<Path>>(images: &[P]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        for image in images {
            if let Some(name) = image.as_ref().file_name().and_then(|n| n.to_str()) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }

        let filenames = names
            .iter()
            .map(|name| filename_pattern(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            filenames,
            code_extensions: normalize_extensions(DEFAULT_CODE_EXTENSIONS),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect(),
        })
    }

    /// Replaces the set of extensions searched.
    pub fn with_code_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.code_extensions = normalize_extensions(extensions);
        self
    }

    /// Replaces the set of directory names never descended into.
    pub fn with_skip_dirs<S: AsRef<str>>(mut self, skip_dirs: &[S]) -> Self {
        self.skip_dirs = skip_dirs.iter().map(|d| d.as_ref().to_string()).collect();
        self
    }

    /// Locates every valid filename occurrence in `content`.
    ///
    /// Edits come back sorted by offset and never overlap. Preview and apply
    /// both go through here, so they always agree.
    pub fn find_references(&self, content: &str) -> Vec<Edit> {
        let mut edits: Vec<Edit> = Vec::new();

        for pattern in &self.filenames {
            for m in pattern.find_iter(content) {
                let text = m.as_str();
                if !has_image_suffix(text) || !is_standalone(content, m.start(), m.end()) {
                    continue;
                }
                edits.push(Edit {
                    start: m.start(),
                    end: m.end(),
                    line_number: line_number_at(content, m.start()),
                    from: text.to_string(),
                    to: with_webp_extension(text),
                });
            }
        }

        edits.sort_by_key(|e| e.start);
        let mut last_end = 0;
        edits.retain(|e| {
            let keep = e.start >= last_end;
            if keep {
                last_end = e.end;
            }
            keep
        });
        edits
    }

    /// Applies every reference to `content`, returning the new text and the edits made.
    pub fn rewrite_content(&self, content: &str) -> (String, Vec<Edit>) {
        let edits = self.find_references(content);
        if edits.is_empty() {
            return (content.to_string(), edits);
        }

        let mut output = String::with_capacity(content.len());
        let mut cursor = 0;
        for edit in &edits {
            output.push_str(&content[cursor..edit.start]);
            output.push_str(&edit.to);
            cursor = edit.end;
        }
        output.push_str(&content[cursor..]);
        (output, edits)
    }

    /// Lists the references in one file without changing it.
    pub fn scan_file(&self, path: &Path) -> Result<Vec<CodeReference>> {
        let content = read_text(path)?;
        Ok(self
            .find_references(&content)
            .into_iter()
            .map(|edit| to_reference(path, edit))
            .collect())
    }

    /// Rewrites one file in place and returns how many references changed.
    ///
    /// The file is only written when something changed, and then atomically
    /// and in full.
    pub fn rewrite_file(&self, path: &Path) -> Result<usize> {
        let content = read_text(path)?;
        let (new_content, edits) = self.rewrite_content(&content);
        if edits.is_empty() {
            return Ok(0);
        }

        write_atomically(path, &new_content).map_err(|e| Error::Processing {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        debug!("rewrote {} reference(s) in {}", edits.len(), path.display());
        Ok(edits.len())
    }

    /// Dry run over every candidate file under `root`.
    pub fn preview(&self, root: &Path) -> PreviewReport {
        let walk = find_code_files(root, &self.code_extensions, &self.skip_dirs);
        let mut report = PreviewReport {
            files_scanned: walk.items.len(),
            failures: walk.issues,
            ..PreviewReport::default()
        };

        for path in walk.items {
            match self.scan_file(&path) {
                Ok(references) if !references.is_empty() => report.files.push(FileChanges {
                    file_path: path,
                    references,
                }),
                Ok(_) => {}
                Err(e) => report.failures.push(file_failure(&path, e)),
            }
        }

        report
    }

    /// Rewrites every candidate file under `root` that references a converted image.
    pub fn apply(&self, root: &Path) -> RewriteReport {
        let walk = find_code_files(root, &self.code_extensions, &self.skip_dirs);
        let mut report = RewriteReport {
            files_scanned: walk.items.len(),
            failures: walk.issues,
            ..RewriteReport::default()
        };

        for path in walk.items {
            match self.rewrite_file(&path) {
                Ok(0) => {}
                Ok(count) => report.updated.push((path, count)),
                Err(e) => report.failures.push(file_failure(&path, e)),
            }
        }

        report
    }
}

/// The main entry point for the `refs` command.
///
/// Every image under `dir` that already has a `.webp` sibling counts as
/// converted. With `dry_run` the proposed changes are printed in `format`;
/// otherwise the files are rewritten.
pub fn run_refs(dir: PathBuf, dry_run: bool, format: OutputFormat, settings: &Settings) -> Result<()> {
    let walk = find_images(&dir);
    let converted: Vec<PathBuf> = walk
        .items
        .into_iter()
        .filter(|image| image.webp_path().is_file())
        .map(|image| image.path)
        .collect();

    for issue in &walk.issues {
        eprintln!("{}", format_issue(issue));
    }
    if converted.is_empty() {
        println!("No images with a WebP version found in {}", dir.display());
        return Ok(());
    }

    let rewriter = ReferenceRewriter::new(&converted)?
        .with_code_extensions(&settings.code_extensions)
        .with_skip_dirs(&settings.skip_dirs);

    if dry_run {
        let preview = rewriter.preview(&dir);
        for issue in &preview.failures {
            eprintln!("{}", format_issue(issue));
        }
        let mut stdout = std::io::stdout();
        OutputFormatter::new(format).write_preview(&mut stdout, &preview, &dir)?;
        return Ok(());
    }

    let report = rewriter.apply(&dir);
    for issue in &report.failures {
        eprintln!("{}", format_issue(issue));
    }
    print!("{}", format_rewrite_report(&report, &dir));
    println!("\n{}", "-".repeat(50));
    println!("Files scanned : {}", report.files_scanned);
    println!("Files changed : {}", report.files_updated());
    println!("Total edits   : {}", report.total_replacements());
    Ok(())
}

/// Builds the literal search pattern for one image filename.
pub fn filename_pattern(file_name: &str) -> Result<Regex> {
    Ok(Regex::new(&regex::escape(file_name))?)
}

/// Returns `true` if the match at `start..end` is a whole filename rather than
/// a slice of a longer one.
///
/// The character before must not be part of a file name (`/`, quotes, `(` and
/// whitespace are fine). After the match, another name character or a `.`
/// starting a further extension disqualifies it, so `logo.png.bak` and
/// `mylogo.png` are left alone.
fn is_standalone(content: &str, start: usize, end: usize) -> bool {
    let before_ok = content[..start]
        .chars()
        .next_back()
        .map(|c| !(is_name_char(c) || c == '.'))
        .unwrap_or(true);
    if !before_ok {
        return false;
    }

    let mut after = content[end..].chars();
    match after.next() {
        None => true,
        Some('.') => !after.next().map(is_word_char).unwrap_or(false),
        Some(c) => !is_name_char(c),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_name_char(c: char) -> bool {
    is_word_char(c) || c == '-'
}

fn line_number_at(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

fn to_reference(path: &Path, edit: Edit) -> CodeReference {
    CodeReference {
        file_path: path.to_path_buf(),
        line_number: edit.line_number,
        matched_text: edit.from,
        replacement_text: edit.to,
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Processing {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(format!("Could not get parent directory for {}", path.display()).into());
        }
    };

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_bytes())?;

    // Preserve file permissions
    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(path)?;
    Ok(())
}

fn file_failure(path: &Path, err: Error) -> WalkIssue {
    warn!("{}", err);
    let message = match err {
        Error::Processing { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    WalkIssue {
        path: Some(path.to_path_buf()),
        message,
    }
}
