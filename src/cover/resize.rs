//! JPEG cover variants via the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::{CoverEncoder, EncodeError, EncodedImage, VariantSpec};

/// Decodes any format `image` understands, crops to fill the variant's box
/// and re-encodes as JPEG at the variant's quality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer;

impl CoverEncoder for ImageResizer {
    fn encode(&self, data: &[u8], variant: &VariantSpec) -> Result<EncodedImage, EncodeError> {
        let img = image::load_from_memory(data)?;
        let resized = img
            .resize_to_fill(variant.width, variant.height, FilterType::Lanczos3)
            .to_rgb8();

        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, variant.quality.clamp(1, 100));
        resized.write_with_encoder(encoder)?;

        Ok(EncodedImage {
            data: buf,
            format: "jpeg".to_string(),
            width: resized.width(),
            height: resized.height(),
        })
    }
}
