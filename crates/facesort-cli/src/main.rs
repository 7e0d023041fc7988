use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use facesort_core::encoder::model_paths;
use facesort_core::{Metric, OnnxFaceEncoder};
use facesort_fs::{ExportOptions, ScanOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod pipeline;

use config::Config;
use pipeline::{ExportTarget, PipelineOptions};

#[derive(Parser)]
#[command(name = "facesort", version, about = "Group a photo folder into one folder per person")]
struct Cli {
    /// Config file (default: <config dir>/facesort/config.toml, if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect faces and copy each photo into a folder per person
    Sort {
        /// Folder of photos to sort
        #[arg(default_value = "inputPhotos")]
        input: PathBuf,
        /// Folder that receives person_1, person_2, ...
        #[arg(default_value = "outputPhotos")]
        output: PathBuf,
        /// Write the person folders into this zip file instead of OUTPUT
        #[arg(long, value_name = "FILE")]
        zip: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
        /// Report what would be copied without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Show the resolved configuration and check that the models load
    Check {
        #[command(flatten)]
        tuning: Tuning,
    },
}

/// Flags that override the config file and environment.
#[derive(Args)]
struct Tuning {
    /// Directory containing det_10g.onnx and w600k_r50.onnx
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,
    /// Face comparison metric: cosine or euclidean
    #[arg(long)]
    metric: Option<Metric>,
    /// Cosine similarity needed for a same-person match
    #[arg(long)]
    threshold: Option<f32>,
    /// Euclidean distance allowed for a same-person match
    #[arg(long)]
    tolerance: Option<f32>,
    /// Minimum face detection score
    #[arg(long)]
    min_confidence: Option<f32>,
    /// Keep at most this many faces per photo
    #[arg(long)]
    max_faces: Option<usize>,
    /// Also sort photos in subfolders (`--recursive=false` turns it off)
    #[arg(
        short,
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    recursive: Option<bool>,
    /// Only export people seen in at least this many photos
    #[arg(long)]
    min_photos: Option<usize>,
}

impl Tuning {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.model_dir {
            config.model_dir = v;
        }
        if let Some(v) = self.metric {
            config.metric = v;
        }
        if let Some(v) = self.threshold {
            config.threshold = v;
        }
        if let Some(v) = self.tolerance {
            config.tolerance = v;
        }
        if let Some(v) = self.min_confidence {
            config.min_confidence = v;
        }
        if let Some(v) = self.max_faces {
            config.max_faces = Some(v);
        }
        if let Some(v) = self.recursive {
            config.recursive = v;
        }
        if let Some(v) = self.min_photos {
            config.min_photos = v;
        }
    }
}

fn resolve_config(path: Option<&Path>, tuning: Tuning) -> Result<Config> {
    let mut config = Config::load(path)?;
    tuning.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sort {
            input,
            output,
            zip,
            tuning,
            dry_run,
            json,
        } => {
            let config = resolve_config(cli.config.as_deref(), tuning)?;

            let mut encoder = OnnxFaceEncoder::load(&config.model_dir, &config.encoder_options())
                .with_context(|| format!("loading face models from {}", config.model_dir.display()))?;
            let comparator = config.comparator();

            let (output, target) = match zip {
                Some(archive) => (archive, ExportTarget::Zip),
                None => (output, ExportTarget::Folders),
            };
            let options = PipelineOptions {
                scan: ScanOptions {
                    recursive: config.recursive,
                },
                export: ExportOptions {
                    min_photos: config.min_photos,
                    dry_run,
                },
                target,
                progress: !json && std::io::stderr().is_terminal(),
            };
            let summary = pipeline::run(&input, &output, &mut encoder, comparator.as_ref(), options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let verb = if dry_run { "would copy" } else { "copied" };
                println!(
                    "{} photos scanned, {} people found, {verb} {} photos into {} folders in {}",
                    summary.photos_scanned,
                    summary.people,
                    summary.export.copied,
                    summary.export.people.len(),
                    output.display()
                );
                if summary.photos_failed > 0 || !summary.export.failures.is_empty() {
                    println!(
                        "{} photos could not be read, {} copies failed (see log)",
                        summary.photos_failed,
                        summary.export.failures.len()
                    );
                }
            }
        }
        Commands::Check { tuning } => {
            let config = resolve_config(cli.config.as_deref(), tuning)?;
            print!("{}", toml::to_string_pretty(&config)?);

            let (det, rec) = model_paths(&config.model_dir);
            for path in [&det, &rec] {
                let state = if path.is_file() { "found" } else { "missing" };
                println!("# {}: {state}", path.display());
            }

            OnnxFaceEncoder::load(&config.model_dir, &config.encoder_options())
                .with_context(|| format!("loading face models from {}", config.model_dir.display()))?;
            println!("# models: loaded");
        }
    }

    Ok(())
}
