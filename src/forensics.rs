//! Error-level analysis on payment screenshots
//!
//! Compares an image against a recompressed copy of itself. Regions that
//! survived a different number of compression passes than the rest of the
//! image stand out in the difference, which is a signal of localized
//! editing. The result is an evidence artifact for human review, not an
//! automatic fraud trigger.

use image::{ImageOutputFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Typed forensics failure; the engine treats any of these as
/// "no artifact produced".
#[derive(Debug, Error)]
pub enum ForensicsError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image re-encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write evidence artifact: {0}")]
    Write(#[from] std::io::Error),
}

/// Normalized difference image plus a handle for later persistence.
///
/// Ephemeral: the buffer exists for one analysis call; callers persist
/// it through [`ElaReport::write_to`] if they want to keep it.
#[derive(Debug)]
pub struct ElaReport {
    /// Brightness-normalized difference image
    pub image: RgbImage,
    /// Unique artifact identifier, used to derive the file name
    pub artifact_id: String,
    /// Largest raw per-channel difference observed
    pub max_diff: u8,
}

impl ElaReport {
    /// File name the artifact is stored under.
    pub fn file_name(&self) -> String {
        format!("ela_{}.jpg", self.artifact_id)
    }

    /// Persist the artifact into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ForensicsError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        self.image.save(&path)?;
        Ok(path)
    }
}

/// Recompression-difference analyzer.
pub struct ElaAnalyzer {
    quality: u8,
}

impl ElaAnalyzer {
    /// Analyzer targeting the given JPEG recompression quality (0-100).
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Produce the difference artifact for the image at `path`.
    pub fn analyze(&self, path: &Path) -> Result<ElaReport, ForensicsError> {
        let original = image::open(path)
            .map_err(|source| ForensicsError::Decode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgb8();

        // Recompress into a per-call buffer; nothing shared, nothing to
        // clean up on any exit path.
        let mut recompressed_bytes = Vec::new();
        original.write_to(
            &mut Cursor::new(&mut recompressed_bytes),
            ImageOutputFormat::Jpeg(self.quality),
        )?;
        let recompressed = image::load_from_memory(&recompressed_bytes)?.to_rgb8();

        let report = difference_report(&original, &recompressed);
        debug!(
            path = %path.display(),
            max_diff = report.max_diff,
            artifact = %report.file_name(),
            "Error-level analysis complete"
        );
        Ok(report)
    }
}

/// Brightness scale that maps the largest observed difference to full
/// brightness. A zero difference is treated as one so the scale is
/// always well-defined.
fn amplification_scale(max_diff: u8) -> f64 {
    255.0 / f64::from(max_diff.max(1))
}

/// Per-channel absolute difference, normalized so the most different
/// pixel reaches full brightness.
fn difference_report(original: &RgbImage, recompressed: &RgbImage) -> ElaReport {
    let mut diff = RgbImage::new(original.width(), original.height());
    let mut max_diff = 0u8;

    for (orig, (recomp, out)) in original
        .pixels()
        .zip(recompressed.pixels().zip(diff.pixels_mut()))
    {
        for c in 0..3 {
            let d = orig.0[c].abs_diff(recomp.0[c]);
            max_diff = max_diff.max(d);
            out.0[c] = d;
        }
    }

    let scale = amplification_scale(max_diff);
    for pixel in diff.pixels_mut() {
        for c in 0..3 {
            pixel.0[c] = (f64::from(pixel.0[c]) * scale).min(255.0) as u8;
        }
    }

    ElaReport {
        image: diff,
        artifact_id: uuid::Uuid::new_v4().simple().to_string(),
        max_diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_amplification_scale_never_divides_by_zero() {
        assert_eq!(amplification_scale(0), 255.0);
        assert_eq!(amplification_scale(1), 255.0);
        assert_eq!(amplification_scale(255), 1.0);
    }

    #[test]
    fn test_identical_images_yield_uniformly_dark_artifact() {
        let img = RgbImage::from_pixel(8, 8, Rgb([120, 60, 30]));
        let report = difference_report(&img, &img);

        assert_eq!(report.max_diff, 0);
        assert!(report.image.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_most_different_pixel_reaches_full_brightness() {
        let original = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        let mut recompressed = original.clone();
        recompressed.put_pixel(2, 2, Rgb([104, 100, 100]));
        recompressed.put_pixel(0, 0, Rgb([102, 100, 100]));

        let report = difference_report(&original, &recompressed);
        assert_eq!(report.max_diff, 4);
        // max diff scaled to 255, half of it to ~127
        assert_eq!(report.image.get_pixel(2, 2).0[0], 255);
        assert_eq!(report.image.get_pixel(0, 0).0[0], 127);
        assert_eq!(report.image.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_analyze_roundtrip_on_disk() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        img.save(file.path()).unwrap();

        let analyzer = ElaAnalyzer::new(90);
        let report = analyzer.analyze(file.path()).unwrap();

        assert_eq!(report.image.dimensions(), (16, 16));
        assert!(!report.artifact_id.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let written = report.write_to(dir.path()).unwrap();
        assert!(written.exists());
    }

    #[test]
    fn test_analyze_missing_file_is_decode_error() {
        let analyzer = ElaAnalyzer::new(90);
        let err = analyzer.analyze(Path::new("/nonexistent/shot.png")).unwrap_err();
        assert!(matches!(err, ForensicsError::Decode { .. }));
    }
}
