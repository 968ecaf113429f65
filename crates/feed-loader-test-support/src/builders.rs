//! Synthetic image payloads and feed fixtures for testing.

use std::io::Cursor;

use feed_loader_core::FeedImage;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use url::Url;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Builder for encoded image payloads.
///
/// Every method returns the bytes a backend would deliver, not a decoded
/// image.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Valid Payloads ===

    /// Encodes a 1x1 PNG filled with the given color.
    #[must_use]
    pub fn png_with_color(r: u8, g: u8, b: u8) -> Vec<u8> {
        Self::solid(1, 1, [r, g, b], ImageFormat::Png)
    }

    /// Encodes a solid-color image of the given size and format.
    ///
    /// # Panics
    ///
    /// Panics if the `image` crate cannot encode the requested format.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |_, _| Rgb(rgb));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, format)
            .unwrap_or_else(|e| panic!("failed to encode synthetic {format:?}: {e}"));
        bytes.into_inner()
    }

    /// A red 1x1 PNG.
    #[must_use]
    pub fn red_png() -> Vec<u8> {
        Self::png_with_color(255, 0, 0)
    }

    /// A green 1x1 PNG.
    #[must_use]
    pub fn green_png() -> Vec<u8> {
        Self::png_with_color(0, 255, 0)
    }

    // === Invalid Payloads ===

    /// Bytes that start like a PNG but cannot be decoded.
    #[must_use]
    pub fn truncated_png() -> Vec<u8> {
        PNG_SIGNATURE.to_vec()
    }

    /// Bytes that are not an image at all.
    #[must_use]
    pub fn invalid_data() -> Vec<u8> {
        b"invalid data".to_vec()
    }
}

/// Builder for feed entries.
pub struct FeedImageBuilder;

impl FeedImageBuilder {
    /// Parses a URL, panicking on malformed input.
    ///
    /// # Panics
    ///
    /// Panics if `s` is not a valid absolute URL.
    #[must_use]
    pub fn url(s: &str) -> Url {
        Url::parse(s).unwrap_or_else(|e| panic!("invalid test URL {s}: {e}"))
    }

    /// Any valid URL.
    #[must_use]
    pub fn any_url() -> Url {
        Self::url("https://any-url.com")
    }

    /// A feed entry with the given fields.
    #[must_use]
    pub fn make(description: Option<&str>, location: Option<&str>, url: &str) -> FeedImage {
        FeedImage::new(
            description.map(str::to_string),
            location.map(str::to_string),
            Self::url(url),
        )
    }

    /// A feed entry with every field filled in.
    #[must_use]
    pub fn east_side_gallery() -> FeedImage {
        Self::make(
            Some(
                "The East Side Gallery is an open-air gallery in Berlin. It consists of a series \
                 of murals painted directly on a 1,316 m long remnant of the Berlin Wall.",
            ),
            Some("East Side Gallery\nMemorial in Berlin, Germany"),
            "https://example.com/east-side-gallery.png",
        )
    }

    /// A feed entry with a short description.
    #[must_use]
    pub fn garth_pier() -> FeedImage {
        Self::make(
            Some("Garth Pier is a Grade II listed structure in Bangor, Gwynedd, North Wales."),
            Some("Garth Pier"),
            "https://example.com/garth-pier.png",
        )
    }

    /// A feed entry with a location but no description.
    #[must_use]
    pub fn cannon_street() -> FeedImage {
        Self::make(
            None,
            Some("Cannon Street, London"),
            "https://example.com/cannon-street.png",
        )
    }

    /// Another entry with a location but no description.
    #[must_use]
    pub fn brighton_seafront() -> FeedImage {
        Self::make(
            None,
            Some("Brighton Seafront"),
            "https://example.com/brighton-seafront.png",
        )
    }

    /// A feed whose images are expected to load.
    #[must_use]
    pub fn feed_with_content() -> Vec<FeedImage> {
        vec![Self::east_side_gallery(), Self::garth_pier()]
    }

    /// A feed whose images are expected to fail.
    #[must_use]
    pub fn feed_with_failed_image_loading() -> Vec<FeedImage> {
        vec![Self::cannon_street(), Self::brighton_seafront()]
    }
}
