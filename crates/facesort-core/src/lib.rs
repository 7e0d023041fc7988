//! facesort-core: face detection, recognition and person grouping.
//!
//! Uses SCRFD for face detection and ArcFace for face embeddings, both
//! running via ONNX Runtime, then groups faces into people by greedy
//! comparison against each person's first face.

pub mod alignment;
pub mod cluster;
pub mod compare;
pub mod detector;
pub mod encoder;
pub mod recognizer;
pub mod types;

pub use cluster::{Assignment, PersonGroup, PersonGroups};
pub use compare::{CosineComparator, EuclideanComparator, FaceComparator, Metric};
pub use detector::FaceDetector;
pub use encoder::{EncodeError, EncoderOptions, FaceEncoder, OnnxFaceEncoder};
pub use recognizer::FaceRecognizer;
pub use types::{BoundingBox, Embedding, Face};
