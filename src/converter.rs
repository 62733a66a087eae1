use crate::assets::ImageAsset;
use crate::errors::{Error, Result};
use crate::patterns::ExclusionMatcher;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Turns one source image into a WebP file.
///
/// Format sniffing, colour handling and the actual compression are entirely the
/// codec's business. The conversion loop only cares whether it succeeded.
pub trait ImageCodec {
    /// Encodes `source` at `quality` (0-100) and writes the result to `destination`.
    fn encode(&self, source: &Path, destination: &Path, quality: u8) -> Result<()>;
}

/// Lossy WebP encoding through libwebp, decoding sources with `image`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebpCodec;

impl ImageCodec for WebpCodec {
    fn encode(&self, source: &Path, destination: &Path, quality: u8) -> Result<()> {
        let rgba = image::open(source)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_simple(false, f32::from(quality.min(100)))
            .map_err(|e| Error::Encode(format!("{e:?}")))?;

        write_output(destination, &encoded)
    }
}

/// Writes `bytes` next to `destination` and renames the file into place.
///
/// `destination` either ends up complete or does not exist at all.
pub fn write_output(destination: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(bytes)?;
    temp_file.as_file().sync_all()?;
    // Dropping the temp file on failure removes it.
    temp_file.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

/// An image converted during the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// What happened to a single image.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Converted(ConvertedImage),
    /// Matched an exclusion pattern.
    Skipped { source: PathBuf },
    Failed { source: PathBuf, message: String },
}

/// Totals of one conversion pass.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub converted: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Successful conversions, in walk order.
    pub converted_images: Vec<ConvertedImage>,
    pub failures: Vec<(PathBuf, String)>,
}

impl ConversionReport {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Converted(image) => {
                self.converted += 1;
                self.converted_images.push(image.clone());
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { source, message } => {
                self.errors += 1;
                self.failures.push((source.clone(), message.clone()));
            }
        }
    }

    /// Source paths of the converted images.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.converted_images.iter().map(|c| c.source.clone()).collect()
    }
}

/// Converts a single image to its `.webp` sibling.
pub fn convert_image<C: ImageCodec + ?Sized>(
    codec: &C,
    image: &ImageAsset,
    quality: u8,
) -> FileOutcome {
    let output = image.webp_path();
    debug!("encoding {} at quality {}", image.path.display(), quality);

    match codec.encode(&image.path, &output, quality) {
        Ok(()) => FileOutcome::Converted(ConvertedImage {
            source: image.path.clone(),
            output,
        }),
        Err(e) => FileOutcome::Failed {
            source: image.path.clone(),
            message: e.to_string(),
        },
    }
}

/// Converts `images` one at a time, skipping the excluded ones.
///
/// `on_file` sees every outcome as soon as it is known, so callers can print
/// progress without the loop knowing about the terminal. A failed image never
/// stops the pass.
pub fn convert_images<C, F>(
    images: &[ImageAsset],
    codec: &C,
    quality: u8,
    exclusions: &ExclusionMatcher,
    mut on_file: F,
) -> ConversionReport
where
    C: ImageCodec + ?Sized,
    F: FnMut(&FileOutcome),
{
    let mut report = ConversionReport::default();

    for image in images {
        let outcome = if exclusions.should_exclude(&image.relative_path) {
            FileOutcome::Skipped {
                source: image.path.clone(),
            }
        } else {
            convert_image(codec, image, quality)
        };

        on_file(&outcome);
        report.record(&outcome);
    }

    info!(
        "conversion finished: {} converted, {} skipped, {} errors",
        report.converted, report.skipped, report.errors
    );
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::walker::find_images;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Writes a marker file instead of encoding; fails for names containing "broken".
    #[derive(Default)]
    pub(crate) struct FakeCodec {
        pub calls: RefCell<Vec<(PathBuf, u8)>>,
    }

    impl ImageCodec for FakeCodec {
        fn encode(&self, source: &Path, destination: &Path, quality: u8) -> Result<()> {
            self.calls.borrow_mut().push((source.to_path_buf(), quality));
            let name = source.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.contains("broken") {
                return Err(Error::Encode("unsupported image".to_string()));
            }
            write_output(destination, b"RIFF....WEBP")
        }
    }

    #[test]
    fn test_convert_images_counts_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("a.png"), b"png").unwrap();
        fs::write(root.join("sub/b.jpg"), b"jpg").unwrap();
        fs::write(root.join("broken.jpeg"), b"bad").unwrap();
        fs::write(root.join("temp1.png"), b"png").unwrap();

        let images = find_images(root).items;
        let exclusions = ExclusionMatcher::new(&["temp*"]).unwrap();
        let codec = FakeCodec::default();
        let mut seen = 0;

        let report = convert_images(&images, &codec, 70, &exclusions, |_| seen += 1);

        assert_eq!(seen, 4);
        assert_eq!(report.converted, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.skipped, 1);
        assert!(root.join("a.webp").exists());
        assert!(root.join("sub/b.webp").exists());
        assert!(!root.join("temp1.webp").exists());
        assert!(!root.join("broken.webp").exists());
        assert_eq!(report.failures[0].0, root.join("broken.jpeg"));
        assert!(codec.calls.borrow().iter().all(|(_, q)| *q == 70));
    }

    #[test]
    fn test_webp_codec_encodes_png() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("pixel.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 30, 30]))
            .save(&source)
            .unwrap();
        let output = temp_dir.path().join("pixel.webp");

        WebpCodec.encode(&source, &output, 80).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_failed_write_leaves_no_output_behind() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("taken.webp");
        fs::create_dir_all(destination.join("inner")).unwrap();

        assert!(write_output(&destination, b"RIFF....WEBP").is_err());

        assert!(destination.is_dir());
        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken.webp")]);
    }

    #[test]
    fn test_write_output_replaces_whole_file() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("a.webp");
        fs::write(&destination, b"stale and much longer content").unwrap();

        write_output(&destination, b"RIFF....WEBP").unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"RIFF....WEBP");
    }

    #[test]
    fn test_webp_codec_reports_undecodable_input() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("fake.jpg");
        fs::write(&source, b"definitely not a jpeg").unwrap();
        let output = temp_dir.path().join("fake.webp");

        assert!(WebpCodec.encode(&source, &output, 80).is_err());
        assert!(!output.exists());
    }
}
