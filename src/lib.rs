//! `webpify` converts JPEG/PNG images in a directory tree to WebP.
//!
//! It provides the core logic for the `webpify` command-line tool but can also
//! be used as a library. The main components are:
//!
//! - `walker`: recursive, best-effort discovery of images and code files.
//! - `patterns`: exclusion patterns (exact name, `*` wildcard, substring) and
//!   quality presets.
//! - `converter`: the `ImageCodec` boundary and the sequential conversion pass.
//! - `replacer`: finds and rewrites image filename references in code files,
//!   touching only the extension.
//! - `deleter`: removes originals once their `.webp` sibling exists.
//! - `orchestrator`: runs the whole pipeline, asking a `Prompter` for every
//!   decision.
//!
//! Everything runs on one thread, one file at a time.

pub mod assets;
pub mod cli;
pub mod config;
pub mod converter;
pub mod deleter;
pub mod errors;
pub mod orchestrator;
pub mod output_formatter;
pub mod patterns;
pub mod prompt;
pub mod replacer;
pub mod scanner;
pub mod walker;

// Re-export main types for easier access by library users.
pub use converter::{ImageCodec, WebpCodec};
pub use errors::{Error, Result};
pub use orchestrator::{Orchestrator, RunSummary};
pub use output_formatter::{OutputFormat, OutputFormatter};
pub use patterns::ExclusionMatcher;
pub use replacer::ReferenceRewriter;
