use serde::{Deserialize, Serialize};

/// A detected face, in pixel coordinates of the decoded photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Eyes, nose tip and mouth corners, in that order. Needed for alignment.
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// L2-normalized face vector; ArcFace produces 512 values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Which recognizer produced it, `None` for hand-built vectors.
    pub model_version: Option<String>,
}

impl Embedding {
    /// Wrap raw values that did not come from a model (tests, fixtures).
    pub fn from_values(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    /// Cosine similarity in [-1, 1]; 0.0 if either side is a zero vector.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let (dot, sq_a, sq_b) = self
            .values
            .iter()
            .zip(&other.values)
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, sq_a, sq_b), (a, b)| {
                (dot + a * b, sq_a + a * a, sq_b + b * b)
            });

        match (sq_a * sq_b).sqrt() {
            norm if norm > 0.0 => dot / norm,
            _ => 0.0,
        }
    }

    /// L2 distance. For unit vectors this is `sqrt(2 - 2 * similarity)`.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        let squared: f32 = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum();
        squared.sqrt()
    }
}

/// One face found in a photo: where it is and who it looks like.
#[derive(Debug, Clone)]
pub struct Face {
    pub bbox: BoundingBox,
    pub embedding: Embedding,
}
