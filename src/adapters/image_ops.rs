use super::{guard_path, require_existing, AdapterError};
use crate::config::Settings;
use crate::sandbox::AuthorizedPath;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

fn load_resized(
    source: &AuthorizedPath,
    width: u32,
    height: u32,
) -> Result<DynamicImage, AdapterError> {
    let image_error = |source_err: image::ImageError| AdapterError::Image {
        path: source.as_path().display().to_string(),
        source: source_err,
    };
    let image = image::open(source.as_path()).map_err(image_error)?;
    Ok(image.resize_exact(width, height, FilterType::Triangle))
}

/// Resizes the image at `image_path`, overwriting it. The in-place variant
/// of the operation; `resize_to` leaves the source untouched.
pub fn resize_in_place(
    settings: &Settings,
    image_path: &str,
    width: u32,
    height: u32,
) -> Result<(), AdapterError> {
    let authorized = guard_path(settings, Path::new(image_path))?;
    require_existing(&authorized)?;
    let resized = load_resized(&authorized, width, height)?;
    resized
        .save(authorized.as_path())
        .map_err(|source_err| AdapterError::Image {
            path: authorized.as_path().display().to_string(),
            source: source_err,
        })
}

pub fn resize_to(
    settings: &Settings,
    image_path: &str,
    output_path: &str,
    width: u32,
    height: u32,
) -> Result<(), AdapterError> {
    let source = guard_path(settings, Path::new(image_path))?;
    let target = guard_path(settings, Path::new(output_path))?;
    require_existing(&source)?;
    let resized = load_resized(&source, width, height)?;
    resized
        .save(target.as_path())
        .map_err(|source_err| AdapterError::Image {
            path: target.as_path().display().to_string(),
            source: source_err,
        })
}
