//! Optical character recognition over evidence images
//!
//! Both recognizers share the same preprocessing: grayscale conversion and
//! Otsu binarization, which separates foreground text from background
//! without manual threshold tuning. Recognition runs through Tesseract on
//! a helper thread bounded by the configured timeout so a wedged
//! recognizer degrades to an empty result instead of hanging the engine.

pub mod numeric;
pub mod text;

use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold};
use rusty_tesseract::Args;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub use numeric::NumericReader;
pub use text::{ScreenshotAnalysis, TextExtractor};

/// Typed OCR failure, so callers can tell "nothing recognized" (an Ok
/// empty result) apart from a broken decode or a stuck recognizer.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("recognizer failed: {0}")]
    Recognizer(String),
    #[error("recognition timed out after {0:?}")]
    Timeout(Duration),
}

/// Decode an image and binarize it for recognition.
pub(crate) fn preprocess(path: &Path) -> Result<GrayImage, OcrError> {
    let img = image::open(path).map_err(|source| OcrError::Decode {
        path: path.display().to_string(),
        source,
    })?;

    let gray = img.to_luma8();
    let level = otsu_level(&gray);
    debug!(path = %path.display(), otsu_level = level, "Binarized image for OCR");
    Ok(threshold(&gray, level))
}

/// Run Tesseract on the binarized image, bounded by `timeout`.
///
/// The recognition happens on a detached helper thread; if it does not
/// answer in time the caller gets a `Timeout` error and the thread is
/// left to finish on its own.
pub(crate) fn recognize_with_timeout(
    binarized: GrayImage,
    args: Args,
    timeout: Duration,
) -> Result<String, OcrError> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(run_tesseract(&binarized, &args));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(OcrError::Timeout(timeout)),
    }
}

/// Hand the binarized image to Tesseract via a uniquely named scratch
/// file. The scratch lives only for this call and is removed on every
/// exit path, including failures.
fn run_tesseract(binarized: &GrayImage, args: &Args) -> Result<String, OcrError> {
    let scratch = tempfile::Builder::new()
        .prefix("ocr_scratch_")
        .suffix(".png")
        .tempfile()
        .map_err(|e| OcrError::Recognizer(e.to_string()))?;
    binarized
        .save(scratch.path())
        .map_err(|e| OcrError::Recognizer(e.to_string()))?;

    let image = rusty_tesseract::Image::from_path(scratch.path())
        .map_err(|e| OcrError::Recognizer(e.to_string()))?;
    rusty_tesseract::image_to_string(&image, args).map_err(|e| OcrError::Recognizer(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_preprocess_produces_two_valued_image() {
        // Half dark, half bright: Otsu should split cleanly into 0/255.
        let mut img = GrayImage::new(10, 10);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = Luma([if x < 5 { 20 } else { 220 }]);
        }

        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        img.save(file.path()).unwrap();

        let binarized = preprocess(file.path()).unwrap();
        assert!(binarized
            .pixels()
            .all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_preprocess_missing_file_is_decode_error() {
        let err = preprocess(Path::new("/nonexistent/readout.png")).unwrap_err();
        assert!(matches!(err, OcrError::Decode { .. }));
    }
}
