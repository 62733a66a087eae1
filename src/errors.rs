use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in the `webpify` application.
///
/// Per-file problems (an unreadable directory, a codec failure, a file that
/// cannot be rewritten) are recorded in the phase reports and never escape as
/// an `Error`. Whatever reaches the caller ends the run.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred during regex compilation.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A general configuration or validation error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error that occurred during the processing of a single file.
    #[error("File processing failed for {path}: {source}")]
    Processing {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The image could not be decoded.
    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// The WebP encoder rejected the image.
    #[error("WebP encoding failed: {0}")]
    Encode(String),

    /// The selected root holds no `.jpg`, `.jpeg` or `.png` files.
    #[error("No supported images (.jpg, .jpeg, .png) found in: {}", root.display())]
    NoImages { root: PathBuf },

    /// An interactive prompt could not read from the terminal.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    /// An error related to CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, webpify::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
