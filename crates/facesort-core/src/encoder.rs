//! Photo → faces: localization plus one embedding per face.

use crate::detector::{DetectorError, FaceDetector, DEFAULT_MIN_CONFIDENCE};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::Face;
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// SCRFD detection model file name inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name inside the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Finds faces in a photo and embeds each of them.
pub trait FaceEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<Face>, EncodeError>;
}

/// Options for building an [`OnnxFaceEncoder`].
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    pub min_confidence: f32,
    /// Keep at most this many faces per photo, highest confidence first.
    pub max_faces: Option<usize>,
    pub intra_threads: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_faces: None,
            intra_threads: 2,
        }
    }
}

/// SCRFD detection followed by ArcFace embedding.
pub struct OnnxFaceEncoder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
    max_faces: Option<usize>,
}

impl OnnxFaceEncoder {
    /// Load both models from `model_dir`. Fails fast if either is missing.
    pub fn load(model_dir: &Path, options: &EncoderOptions) -> Result<Self, EncodeError> {
        let (det_path, rec_path) = model_paths(model_dir);

        let detector = FaceDetector::load(&det_path, options.intra_threads)?
            .with_min_confidence(options.min_confidence);
        let recognizer = FaceRecognizer::load(&rec_path, options.intra_threads)?;

        Ok(Self {
            detector,
            recognizer,
            max_faces: options.max_faces,
        })
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<Face>, EncodeError> {
        let mut boxes = self.detector.detect(image)?;
        if let Some(max) = self.max_faces {
            boxes.truncate(max);
        }

        let mut faces = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            if bbox.landmarks.is_none() {
                tracing::debug!(confidence = bbox.confidence, "skipping face without landmarks");
                continue;
            }
            let embedding = self.recognizer.extract(image, &bbox)?;
            faces.push(Face { bbox, embedding });
        }
        Ok(faces)
    }
}

/// Detector and recognizer model paths inside `model_dir`.
pub fn model_paths(model_dir: &Path) -> (PathBuf, PathBuf) {
    (
        model_dir.join(DETECTOR_MODEL_FILE),
        model_dir.join(RECOGNIZER_MODEL_FILE),
    )
}
