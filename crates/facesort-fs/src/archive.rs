//! Zip export: the same `person_N` layout written into a single archive.

use crate::export::{
    plan_export, unnamed_failure, ExportError, ExportFailure, ExportOptions, ExportReport,
    ExportedPerson, ExportedPhoto,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write each group of photos into `archive_path` as `person_N/<file>` entries.
///
/// Photos are stored uncompressed. A source photo that cannot be read is
/// logged and recorded as a failure; any error writing the archive itself
/// aborts the export. A dry run plans the entries without creating the file.
pub fn export_zip(
    groups: &[Vec<PathBuf>],
    archive_path: &Path,
    options: ExportOptions,
) -> Result<ExportReport, ExportError> {
    let write_err = |source: ZipError| ExportError::WriteArchive {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut writer = if options.dry_run {
        None
    } else {
        Some(ZipWriter::new(create_archive(archive_path)?))
    };
    let entry_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let plan = plan_export(groups, options.min_photos);
    let mut report = ExportReport {
        skipped_groups: plan.skipped_groups,
        ..Default::default()
    };

    for planned in plan.people {
        if let Some(writer) = writer.as_mut() {
            writer
                .add_directory(format!("{}/", planned.folder), entry_options)
                .map_err(write_err)?;
        }

        let folder = PathBuf::from(&planned.folder);
        let mut person = ExportedPerson {
            folder: folder.clone(),
            photos: Vec::with_capacity(planned.photos.len()),
        };

        for (photo, name) in planned.photos {
            let Some(name) = name else {
                report.failures.push(unnamed_failure(photo));
                continue;
            };
            let entry = format!("{}/{}", planned.folder, name.to_string_lossy());

            if let Some(writer) = writer.as_mut() {
                let bytes = match fs::read(photo) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(photo = %photo.display(), error = %e, "error saving photo");
                        report.failures.push(ExportFailure {
                            photo: photo.to_path_buf(),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };
                writer.start_file(entry.clone(), entry_options).map_err(write_err)?;
                writer
                    .write_all(&bytes)
                    .map_err(|e| write_err(ZipError::Io(e)))?;
            }

            report.copied += 1;
            person.photos.push(ExportedPhoto {
                source: photo.to_path_buf(),
                destination: PathBuf::from(entry),
            });
        }

        tracing::debug!(
            archive = %archive_path.display(),
            folder = %planned.folder,
            photos = person.photos.len(),
            dry_run = options.dry_run,
            "archived person"
        );
        report.people.push(person);
    }

    if let Some(writer) = writer {
        writer.finish().map_err(write_err)?;
    }
    Ok(report)
}

fn create_archive(path: &Path) -> Result<File, ExportError> {
    let create_err = |source| ExportError::CreateArchive {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(create_err)?;
    }
    File::create(path).map_err(create_err)
}
