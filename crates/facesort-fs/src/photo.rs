//! Photo decoding into upright 8-bit RGB.

use image::{DynamicImage, ImageDecoder, ImageError, ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// Decode a photo from disk into RGB, rotated per its EXIF orientation.
///
/// The format is sniffed from content, so a PNG saved as `.jpg` still loads.
pub fn load_photo(path: &Path) -> Result<RgbImage, PhotoError> {
    let open_err = |source| PhotoError::Open {
        path: path.to_path_buf(),
        source,
    };
    let decode_err = |source| PhotoError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?;

    let mut decoder = reader.into_decoder().map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);

    tracing::trace!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        ?orientation,
        "decoded photo"
    );
    Ok(image.into_rgb8())
}
