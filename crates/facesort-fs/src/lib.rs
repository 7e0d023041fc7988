//! facesort-fs: the filesystem side of facesort.
//!
//! Finds photos in an input folder, decodes them for face detection,
//! and copies grouped photos into per-person output folders or a zip archive.

pub mod archive;
pub mod export;
pub mod photo;
pub mod scan;

pub use archive::export_zip;
pub use export::{export_groups, ExportError, ExportOptions, ExportReport};
pub use photo::{load_photo, PhotoError};
pub use scan::{scan_photos, ScanError, ScanOptions};
