//! Default image transformer.

use image::DynamicImage;
use tracing::debug;

/// Decodes `data` with the `image` crate, returning `None` for anything it
/// cannot recognize.
#[must_use]
pub fn decode_image(data: &[u8]) -> Option<DynamicImage> {
    match image::load_from_memory(data) {
        Ok(image) => Some(image),
        Err(e) => {
            debug!("Image data did not decode: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_non_image_data() {
        assert!(decode_image(b"not an image").is_none());
        assert!(decode_image(&[]).is_none());
    }
}
