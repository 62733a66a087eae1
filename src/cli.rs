use crate::patterns::QualityPreset;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Convert JPEG/PNG images to WebP and update the code that references them.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "🖼️  Convert JPEG/PNG images to WebP and update code references",
    long_about = "webpify - Recursively converts .jpg, .jpeg and .png images to WebP.

Optionally rewrites references in html, css, js/ts, vue, svelte, php and md
files (only the file extension changes) and deletes originals that have a
WebP version.

QUICK EXAMPLES:
  webpify                                  # Interactive wizard
  webpify convert ./public -q 90           # Convert without prompts
  webpify convert . --update-refs -e '*thumbnail*'
  webpify refs . --dry-run -f json         # Preview reference updates
  webpify delete ./public --dry-run        # Preview which originals go"
)]
pub struct Args {
    /// Path to a YAML config file (defaults to webpify.yaml when present).
    #[arg(short, long, global = true, env = "WEBPIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The set of available commands for the `webpify` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Guided conversion with prompts (the default when no command is given)
    Interactive,

    /// Convert every image under a directory without prompting
    ///
    /// EXAMPLES:
    ///   webpify convert ./public                       # Quality 80
    ///   webpify convert . --preset high                # Quality 90
    ///   webpify convert . -e 'logo.png,*thumbnail*'    # Skip some images
    ///   webpify convert . --update-refs --delete-originals
    Convert {
        /// The directory to convert.
        dir: PathBuf,

        /// WebP quality (0-100).
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100), conflicts_with = "preset")]
        quality: Option<u8>,

        /// A named quality preset.
        #[arg(long, value_enum)]
        preset: Option<QualityPreset>,

        /// Comma-separated exclusion patterns: exact name, `*` wildcard or text.
        #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
        exclude: Vec<String>,

        /// Rewrite references to the converted images in code files.
        #[arg(long)]
        update_refs: bool,

        /// Delete originals that now have a WebP version.
        #[arg(long)]
        delete_originals: bool,
    },

    /// Update code references for images that already have a WebP version
    ///
    /// EXAMPLES:
    ///   webpify refs . --dry-run              # Show what would change
    ///   webpify refs . --dry-run -f csv       # As CSV
    ///   webpify refs src/                     # Apply
    Refs {
        /// The directory to search.
        dir: PathBuf,

        /// Preview the changes without modifying any files.
        #[arg(long)]
        dry_run: bool,

        /// The preview format (`text`, `json` or `csv`).
        #[arg(short = 'f', long = "format", default_value = "text")]
        format: String,
    },

    /// Delete originals that have a WebP version next to them
    ///
    /// EXAMPLES:
    ///   webpify delete ./public --dry-run
    ///   webpify delete . -e 'og-*'
    Delete {
        /// The directory to clean up.
        dir: PathBuf,

        /// Preview which originals would be removed without deleting them.
        #[arg(long)]
        dry_run: bool,

        /// Comma-separated exclusion patterns for originals to keep.
        #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
        exclude: Vec<String>,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
