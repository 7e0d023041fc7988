//! Copy grouped photos into one numbered folder per person.

use serde::Serialize;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of per-person output folders: `person_1`, `person_2`, ...
pub const PERSON_FOLDER_PREFIX: &str = "person_";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot create output folder {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create archive {}: {source}", path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write archive {}: {source}", path.display())]
    WriteArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Groups with fewer photos than this are not exported.
    pub min_photos: usize,
    /// Plan and report without touching the filesystem.
    pub dry_run: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            min_photos: 1,
            dry_run: false,
        }
    }
}

/// For archive exports, `folder` and `destination` are entry paths inside the archive.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedPhoto {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedPerson {
    pub folder: PathBuf,
    pub photos: Vec<ExportedPhoto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub photo: PathBuf,
    pub error: String,
}

/// What an export did (or, for a dry run, would do).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub people: Vec<ExportedPerson>,
    /// Groups dropped by `min_photos`.
    pub skipped_groups: usize,
    /// Photos copied (planned, for a dry run).
    pub copied: usize,
    pub failures: Vec<ExportFailure>,
}

/// One kept group, numbered, with a clash-free file name per photo.
pub(crate) struct PlannedPerson<'a> {
    /// `person_N`, relative to the export root.
    pub folder: String,
    /// Photos and their names inside the folder. `None` when the path has no file name.
    pub photos: Vec<(&'a Path, Option<OsString>)>,
}

pub(crate) struct ExportPlan<'a> {
    pub people: Vec<PlannedPerson<'a>>,
    pub skipped_groups: usize,
}

/// Drop groups below `min_photos` and number the rest from 1 in the order given.
pub(crate) fn plan_export(groups: &[Vec<PathBuf>], min_photos: usize) -> ExportPlan<'_> {
    let mut plan = ExportPlan {
        people: Vec::new(),
        skipped_groups: 0,
    };

    for photos in groups {
        if photos.len() < min_photos {
            plan.skipped_groups += 1;
            continue;
        }

        let mut used_names = HashSet::new();
        let photos = photos
            .iter()
            .map(|p| {
                let name = p.file_name().map(|n| unique_name(n, &mut used_names));
                (p.as_path(), name)
            })
            .collect();

        plan.people.push(PlannedPerson {
            folder: format!("{PERSON_FOLDER_PREFIX}{}", plan.people.len() + 1),
            photos,
        });
    }

    plan
}

pub(crate) fn unnamed_failure(photo: &Path) -> ExportFailure {
    tracing::error!(photo = %photo.display(), "photo path has no file name");
    ExportFailure {
        photo: photo.to_path_buf(),
        error: "path has no file name".to_string(),
    }
}

/// Export each group of photos into `output_dir/person_N`.
///
/// Kept groups are numbered from 1 in the order given. A failed folder or
/// copy is logged and recorded in the report; only failing to create
/// `output_dir` itself aborts the export.
pub fn export_groups(
    groups: &[Vec<PathBuf>],
    output_dir: &Path,
    options: ExportOptions,
) -> Result<ExportReport, ExportError> {
    if !options.dry_run {
        fs::create_dir_all(output_dir).map_err(|source| ExportError::CreateOutput {
            path: output_dir.to_path_buf(),
            source,
        })?;
    }

    let plan = plan_export(groups, options.min_photos);
    let mut report = ExportReport {
        skipped_groups: plan.skipped_groups,
        ..Default::default()
    };

    for planned in plan.people {
        let folder = output_dir.join(&planned.folder);
        let mut person = ExportedPerson {
            folder: folder.clone(),
            photos: Vec::with_capacity(planned.photos.len()),
        };

        if !options.dry_run {
            if let Err(e) = fs::create_dir_all(&folder) {
                tracing::error!(folder = %folder.display(), error = %e, "cannot create person folder");
                report.failures.extend(planned.photos.iter().map(|(p, _)| ExportFailure {
                    photo: p.to_path_buf(),
                    error: format!("cannot create {}: {e}", folder.display()),
                }));
                report.people.push(person);
                continue;
            }
        }

        for (photo, name) in planned.photos {
            let Some(name) = name else {
                report.failures.push(unnamed_failure(photo));
                continue;
            };
            let destination = folder.join(name);

            if !options.dry_run {
                if let Err(e) = fs::copy(photo, &destination) {
                    tracing::error!(
                        photo = %photo.display(),
                        destination = %destination.display(),
                        error = %e,
                        "error saving photo"
                    );
                    report.failures.push(ExportFailure {
                        photo: photo.to_path_buf(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            report.copied += 1;
            person.photos.push(ExportedPhoto {
                source: photo.to_path_buf(),
                destination,
            });
        }

        tracing::debug!(
            folder = %folder.display(),
            photos = person.photos.len(),
            dry_run = options.dry_run,
            "exported person"
        );
        report.people.push(person);
    }

    Ok(report)
}

/// Pick a file name not yet used in this folder: `a.jpg`, then `a-2.jpg`, `a-3.jpg`, ...
fn unique_name(file_name: &OsStr, used: &mut HashSet<OsString>) -> OsString {
    if used.insert(file_name.to_os_string()) {
        return file_name.to_os_string();
    }

    let path = Path::new(file_name);
    let stem = path.file_stem().unwrap_or(file_name).to_string_lossy();
    let ext = path.extension().map(|e| e.to_string_lossy());

    (2..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            OsString::from(name)
        })
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or_else(|| file_name.to_os_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &[u8]) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        path.to_path_buf()
    }

    #[test]
    fn test_export_copies_into_numbered_folders() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let a = write(&input.path().join("a.jpg"), b"aaa");
        let b = write(&input.path().join("b.png"), b"bbb");
        let out_dir = output.path().join("sorted");

        let groups = vec![vec![a.clone(), b.clone()], vec![b.clone()]];
        let report = export_groups(&groups, &out_dir, ExportOptions::default()).unwrap();

        assert_eq!(report.people.len(), 2);
        assert_eq!(report.copied, 3);
        assert!(report.failures.is_empty());
        assert_eq!(fs::read(out_dir.join("person_1/a.jpg")).unwrap(), b"aaa");
        assert_eq!(fs::read(out_dir.join("person_1/b.png")).unwrap(), b"bbb");
        assert_eq!(fs::read(out_dir.join("person_2/b.png")).unwrap(), b"bbb");
        assert!(!out_dir.join("person_3").exists());
    }

    #[test]
    fn test_export_min_photos_renumbers() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let a = write(&input.path().join("a.jpg"), b"a");
        let b = write(&input.path().join("b.jpg"), b"b");
        let c = write(&input.path().join("c.jpg"), b"c");

        let groups = vec![vec![a.clone()], vec![b.clone(), c.clone()]];
        let options = ExportOptions { min_photos: 2, ..Default::default() };
        let report = export_groups(&groups, output.path(), options).unwrap();

        assert_eq!(report.skipped_groups, 1);
        assert_eq!(report.people.len(), 1);
        assert!(output.path().join("person_1/b.jpg").exists());
        assert!(output.path().join("person_1/c.jpg").exists());
        assert!(!output.path().join("person_2").exists());
    }

    #[test]
    fn test_export_name_clash_gets_suffix() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let first = write(&input.path().join("2019/beach.jpg"), b"2019");
        let second = write(&input.path().join("2020/beach.jpg"), b"2020");

        let groups = vec![vec![first, second]];
        let report = export_groups(&groups, output.path(), ExportOptions::default()).unwrap();

        assert_eq!(report.copied, 2);
        assert_eq!(fs::read(output.path().join("person_1/beach.jpg")).unwrap(), b"2019");
        assert_eq!(fs::read(output.path().join("person_1/beach-2.jpg")).unwrap(), b"2020");
    }

    #[test]
    fn test_export_missing_source_is_recorded_and_skipped() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let gone = input.path().join("gone.jpg");
        let ok = write(&input.path().join("ok.jpg"), b"ok");

        let groups = vec![vec![gone.clone(), ok]];
        let report = export_groups(&groups, output.path(), ExportOptions::default()).unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].photo, gone);
        assert!(output.path().join("person_1/ok.jpg").exists());
    }

    #[test]
    fn test_export_dry_run_touches_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let a = write(&input.path().join("a.jpg"), b"a");
        let out_dir = output.path().join("never");

        let groups = vec![vec![a]];
        let options = ExportOptions { dry_run: true, ..Default::default() };
        let report = export_groups(&groups, &out_dir, options).unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(report.people[0].photos[0].destination, out_dir.join("person_1/a.jpg"));
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_export_output_blocked_by_file() {
        let output = tempfile::tempdir().unwrap();
        let blocker = write(&output.path().join("taken"), b"file");
        let err = export_groups(&[], &blocker.join("sub"), ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::CreateOutput { .. }));
    }

    #[test]
    fn test_plan_keeps_unnamed_photo_for_reporting() {
        let groups = vec![vec![PathBuf::from("/"), PathBuf::from("/in/a.jpg")]];
        let plan = plan_export(&groups, 1);
        assert_eq!(plan.people[0].folder, "person_1");
        assert_eq!(plan.people[0].photos[0].1, None);
        assert_eq!(plan.people[0].photos[1].1, Some(OsString::from("a.jpg")));
    }

    #[test]
    fn test_unique_name_without_extension() {
        let mut used = HashSet::new();
        assert_eq!(unique_name(OsStr::new("IMG"), &mut used), OsString::from("IMG"));
        assert_eq!(unique_name(OsStr::new("IMG"), &mut used), OsString::from("IMG-2"));
        assert_eq!(unique_name(OsStr::new("IMG"), &mut used), OsString::from("IMG-3"));
    }
}
