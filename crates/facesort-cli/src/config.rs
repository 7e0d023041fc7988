use anyhow::{ensure, Context, Result};
use facesort_core::compare::{DEFAULT_COSINE_THRESHOLD, DEFAULT_EUCLIDEAN_TOLERANCE};
use facesort_core::detector::DEFAULT_MIN_CONFIDENCE;
use facesort_core::{EncoderOptions, FaceComparator, Metric};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Run configuration: defaults, then config file, then `FACESORT_*`
/// environment variables. Command-line flags are applied on top by `main`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory containing `det_10g.onnx` and `w600k_r50.onnx`.
    pub model_dir: PathBuf,
    pub metric: Metric,
    /// Cosine similarity for a same-person match (metric = cosine).
    pub threshold: f32,
    /// Euclidean distance for a same-person match (metric = euclidean).
    pub tolerance: f32,
    /// Minimum SCRFD detection score for a face to count.
    pub min_confidence: f32,
    /// Keep at most this many faces per photo, most confident first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_faces: Option<usize>,
    /// Descend into subfolders of the input folder.
    pub recursive: bool,
    /// Only export people found in at least this many photos.
    pub min_photos: usize,
    /// ONNX Runtime intra-op threads per model.
    pub intra_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            metric: Metric::Cosine,
            threshold: DEFAULT_COSINE_THRESHOLD,
            tolerance: DEFAULT_EUCLIDEAN_TOLERANCE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_faces: None,
            recursive: false,
            min_photos: 1,
            intra_threads: 2,
        }
    }
}

impl Config {
    /// Load defaults, the config file and environment overrides.
    ///
    /// `explicit` must exist. Without it, the per-user config file is read
    /// only if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `FACESORT_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("FACESORT_MODEL_DIR") {
            self.model_dir = PathBuf::from(dir);
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_METRIC") {
            self.metric = v;
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_THRESHOLD") {
            self.threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_TOLERANCE") {
            self.tolerance = v;
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_MIN_CONFIDENCE") {
            self.min_confidence = v;
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_MAX_FACES") {
            self.max_faces = Some(v);
        }
        if let Some(v) = parse_var::<Flag>(&lookup, "FACESORT_RECURSIVE") {
            self.recursive = v.0;
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_MIN_PHOTOS") {
            self.min_photos = v;
        }
        if let Some(v) = parse_var(&lookup, "FACESORT_INTRA_THREADS") {
            self.intra_threads = v;
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (-1.0..=1.0).contains(&self.threshold),
            "threshold must be within [-1, 1], got {}",
            self.threshold
        );
        ensure!(self.tolerance >= 0.0, "tolerance must be non-negative, got {}", self.tolerance);
        ensure!(
            (0.0..=1.0).contains(&self.min_confidence),
            "min_confidence must be within [0, 1], got {}",
            self.min_confidence
        );
        ensure!(self.max_faces != Some(0), "max_faces must be at least 1");
        ensure!(self.min_photos >= 1, "min_photos must be at least 1");
        ensure!(self.intra_threads >= 1, "intra_threads must be at least 1");
        Ok(())
    }

    pub fn encoder_options(&self) -> EncoderOptions {
        EncoderOptions {
            min_confidence: self.min_confidence,
            max_faces: self.max_faces,
            intra_threads: self.intra_threads,
        }
    }

    pub fn comparator(&self) -> Box<dyn FaceComparator> {
        self.metric.comparator(self.threshold, self.tolerance)
    }
}

/// `<data_dir>/facesort/models`, or `./models` when no data dir is known.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("facesort").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

/// `<config_dir>/facesort/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("facesort").join("config.toml"))
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}

/// Boolean env value: `true`/`false`/`1`/`0`, case-insensitive.
struct Flag(bool);

impl FromStr for Flag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Flag(true)),
            "false" | "0" => Ok(Flag(false)),
            _ => Err(()),
        }
    }
}
