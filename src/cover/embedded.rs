//! Extract cover art embedded in audio file tags.
//!
//! Uses lofty to read picture data from:
//! - ID3v2 tags (MP3)
//! - Vorbis comments (FLAC, OGG)
//! - MP4 atoms (M4A/AAC)

use lofty::picture::MimeType;
use lofty::tag::Tag;

use super::EmbeddedPicture;

/// Take the first picture stored in a tag, whatever its picture type.
pub fn first_picture(tag: &Tag) -> Option<EmbeddedPicture> {
    let picture = tag.pictures().first()?;

    let mime_type = match picture.mime_type() {
        Some(MimeType::Jpeg) => "image/jpeg",
        Some(MimeType::Png) => "image/png",
        Some(MimeType::Gif) => "image/gif",
        Some(MimeType::Bmp) => "image/bmp",
        Some(MimeType::Tiff) => "image/tiff",
        _ => "image/jpeg", // Default assumption
    };

    Some(EmbeddedPicture {
        data: picture.data().to_vec(),
        mime_type: mime_type.to_string(),
    })
}
