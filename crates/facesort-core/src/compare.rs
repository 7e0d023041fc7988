//! Same-person decision between two face embeddings.

use crate::types::Embedding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cosine similarity at or above which two ArcFace embeddings are the same person.
pub const DEFAULT_COSINE_THRESHOLD: f32 = 0.40;
/// Euclidean distance at or below which two unit embeddings are the same person.
/// sqrt(2 - 2 * 0.40) ≈ 1.095, rounded to the cosine default's boundary.
pub const DEFAULT_EUCLIDEAN_TOLERANCE: f32 = 1.10;

/// Binary same/different-person comparator.
pub trait FaceComparator {
    fn same_person(&self, a: &Embedding, b: &Embedding) -> bool;
}

/// Same person when cosine similarity is at least `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CosineComparator {
    pub threshold: f32,
}

impl Default for CosineComparator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COSINE_THRESHOLD,
        }
    }
}

impl FaceComparator for CosineComparator {
    fn same_person(&self, a: &Embedding, b: &Embedding) -> bool {
        a.similarity(b) >= self.threshold
    }
}

/// Same person when Euclidean distance is at most `tolerance`.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanComparator {
    pub tolerance: f32,
}

impl Default for EuclideanComparator {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_EUCLIDEAN_TOLERANCE,
        }
    }
}

impl FaceComparator for EuclideanComparator {
    fn same_person(&self, a: &Embedding, b: &Embedding) -> bool {
        a.euclidean_distance(b) <= self.tolerance
    }
}

/// Comparison metric, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl Metric {
    /// Build the comparator for this metric. Only the matching bound is used.
    pub fn comparator(self, threshold: f32, tolerance: f32) -> Box<dyn FaceComparator> {
        match self {
            Metric::Cosine => Box::new(CosineComparator { threshold }),
            Metric::Euclidean => Box::new(EuclideanComparator { tolerance }),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => f.write_str("cosine"),
            Metric::Euclidean => f.write_str("euclidean"),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(format!("unknown metric {other:?} (expected cosine or euclidean)")),
        }
    }
}
