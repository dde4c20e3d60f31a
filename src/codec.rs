//! Raster decode/encode boundary.
//!
//! The annotation core never touches pixel formats directly; it goes through
//! an [`ImageCodec`]. [`DefaultCodec`] is backed by the `image` crate.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Decode and encode rasters.
pub trait ImageCodec {
    /// Decode encoded bytes into an RGBA raster.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage>;

    /// Encode a raster in the given format.
    fn encode(&self, image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>>;
}

/// Codec for PNG and JPEG using the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodec;

impl DefaultCodec {
    /// File extensions this codec can read and write.
    pub fn extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg"]
    }
}

impl ImageCodec for DefaultCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        log::trace!("DefaultCodec: decoded {}x{} image", img.width(), img.height());
        Ok(img)
    }

    fn encode(&self, image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let dynamic = DynamicImage::ImageRgba8(image.clone());
        match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(dynamic.to_rgb8())
                .write_to(&mut Cursor::new(&mut bytes), format)?,
            ImageFormat::Png => dynamic.write_to(&mut Cursor::new(&mut bytes), format)?,
            other => {
                return Err(Error::invalid_argument(format!(
                    "unsupported output format {:?}",
                    other
                )));
            }
        }
        log::trace!(
            "DefaultCodec: encoded {}x{} image as {:?} ({} bytes)",
            image.width(),
            image.height(),
            format,
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Pick an output format from a file extension.
pub fn format_for_path(path: &Path) -> Result<ImageFormat> {
    ImageFormat::from_path(path).map_err(Error::from)
}
