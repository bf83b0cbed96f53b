//! Cover art extraction and encoding.
//!
//! Covers come from the first picture embedded in an audio file's tags.
//! Each cover is re-encoded into a fixed set of named size variants
//! ([`VariantSpec`]) before being stored as base64 text.
//!
//! The resize/encode step sits behind the [`CoverEncoder`] trait so tests can
//! substitute a fake encoder; [`ImageResizer`] is the production
//! implementation built on the `image` crate.

mod embedded;
mod resize;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use embedded::first_picture;
pub use resize::ImageResizer;

/// Raw picture bytes as found in a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedPicture {
    pub data: Vec<u8>,
    /// MIME type (image/jpeg, image/png)
    pub mime_type: String,
}

/// A named output size for cover images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Variant name stored in the `size` column
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Encoder quality, 1-100 (lower = smaller files)
    pub quality: u8,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32, quality: u8) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            quality,
        }
    }

    /// `small` 140×140 and `medium` 600×600, the latter compressed harder.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("small", 140, 140, 50),
            Self::new("medium", 600, 600, 10),
        ]
    }
}

/// Encoded image bytes with their final geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    /// Output format name, e.g. "jpeg"
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// Image resize/encode service.
pub trait CoverEncoder: Send + Sync {
    /// Resize `data` to the variant's geometry and re-encode it.
    fn encode(&self, data: &[u8], variant: &VariantSpec) -> Result<EncodedImage, EncodeError>;
}

/// Cover encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encoder task failed: {0}")]
    Task(String),
}

/// Encode every variant of one picture on the blocking pool.
///
/// All variants succeed or none are returned.
pub async fn encode_variants(
    encoder: Arc<dyn CoverEncoder>,
    data: Vec<u8>,
    variants: Vec<VariantSpec>,
) -> Result<Vec<(VariantSpec, EncodedImage)>, EncodeError> {
    tokio::task::spawn_blocking(move || {
        variants
            .into_iter()
            .map(|variant| {
                let image = encoder.encode(&data, &variant)?;
                Ok((variant, image))
            })
            .collect::<Result<Vec<_>, EncodeError>>()
    })
    .await
    .map_err(|e| EncodeError::Task(e.to_string()))?
}
