use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use facesort_core::{FaceComparator, FaceEncoder, PersonGroups};
use facesort_fs::{
    export_groups, export_zip, load_photo, scan_photos, ExportOptions, ExportReport, ScanOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where grouped photos end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    /// `output` is a folder that receives `person_N` subfolders.
    #[default]
    Folders,
    /// `output` is a zip file with `person_N/` entries.
    Zip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub scan: ScanOptions,
    pub export: ExportOptions,
    pub target: ExportTarget,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

/// Outcome of one sorting run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub target: ExportTarget,
    pub photos_scanned: usize,
    pub photos_with_faces: usize,
    pub photos_without_faces: usize,
    pub photos_failed: usize,
    pub faces_detected: usize,
    /// Distinct people found, before `min_photos` filtering.
    pub people: usize,
    pub export: ExportReport,
}

/// Scan `input`, group its photos by person and copy them into `output`,
/// a folder or a zip file depending on `options.target`.
///
/// A photo that cannot be decoded or encoded is logged and counted, never
/// fatal. Only an unreadable input folder or an unwritable output aborts
/// the run.
pub fn run(
    input: &Path,
    output: &Path,
    encoder: &mut dyn FaceEncoder,
    comparator: &dyn FaceComparator,
    options: PipelineOptions,
) -> Result<RunSummary> {
    let started_at = Utc::now();
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        target = ?options.target,
        "starting photo processing"
    );
    let photos = scan_photos(input, options.scan)?;

    let mut groups = PersonGroups::new();
    let mut summary = RunSummary {
        started_at,
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        target: options.target,
        photos_scanned: photos.len(),
        photos_with_faces: 0,
        photos_without_faces: 0,
        photos_failed: 0,
        faces_detected: 0,
        people: 0,
        export: ExportReport::default(),
    };

    let progress = if options.progress {
        ProgressBar::new(photos.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?.progress_chars("=> "),
    );

    for (i, photo) in photos.iter().enumerate() {
        let name = display_name(photo);
        progress.set_position(i as u64);
        progress.set_message(name.clone());
        tracing::debug!(photo = %name, index = i + 1, total = photos.len(), "processing photo");

        let faces = match load_photo(photo)
            .map_err(anyhow::Error::from)
            .and_then(|image| encoder.encode(&image).map_err(anyhow::Error::from))
        {
            Ok(faces) => faces,
            Err(e) => {
                let error = format!("{e:#}");
                progress.suspend(|| {
                    tracing::error!(photo = %name, path = %photo.display(), error = %error, "error processing photo")
                });
                summary.photos_failed += 1;
                continue;
            }
        };

        if faces.is_empty() {
            progress.suspend(|| {
                tracing::info!(photo = %name, path = %photo.display(), "no faces found in photo")
            });
            summary.photos_without_faces += 1;
            continue;
        }

        summary.photos_with_faces += 1;
        summary.faces_detected += faces.len();
        for face in &faces {
            groups.assign(photo, &face.embedding, comparator);
        }
    }
    progress.finish_and_clear();

    summary.people = groups.len();
    let grouped: Vec<Vec<PathBuf>> = groups.into_groups().into_iter().map(|g| g.photos).collect();
    summary.export = match options.target {
        ExportTarget::Folders => export_groups(&grouped, output, options.export),
        ExportTarget::Zip => export_zip(&grouped, output, options.export),
    }
    .with_context(|| format!("exporting to {}", output.display()))?;

    tracing::info!(
        photos = summary.photos_scanned,
        failed = summary.photos_failed,
        copied = summary.export.copied,
        "processed {} unique faces",
        summary.people
    );
    tracing::info!("photo processing completed");
    Ok(summary)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
