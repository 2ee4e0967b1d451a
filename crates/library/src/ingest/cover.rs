//! Cover image decoding.

use std::io::Cursor;

use base64::Engine;
use base64::alphabet::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use exn::ResultExt;
use image::ImageFormat;

use crate::ingest::error::{CoverErrorKind, CoverResult};

// Embedded binaries are wrapped at arbitrary widths and padding is often
// wrong, so decoding is deliberately forgiving.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a base64 image payload (any format `image` understands) and
/// re-encode it as PNG.
///
/// CPU-bound; call from a blocking context.
pub(crate) fn decode_to_png(data: &str) -> CoverResult<Vec<u8>> {
    let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let bytes = LENIENT.decode(cleaned).or_raise(|| CoverErrorKind::Decode)?;
    let bitmap = image::load_from_memory(&bytes).or_raise(|| CoverErrorKind::Decode)?;
    let mut png = Cursor::new(Vec::new());
    bitmap.write_to(&mut png, ImageFormat::Png).or_raise(|| CoverErrorKind::Decode)?;
    Ok(png.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    /// A tiny image, base64-encoded in the given format and wrapped over
    /// several lines like FB2 binaries usually are.
    pub(crate) fn encoded_image(format: ImageFormat) -> String {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, image::Rgb([200, 10, 10])));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes.into_inner());
        encoded.as_bytes().chunks(8).map(|c| String::from_utf8_lossy(c).into_owned()).collect::<Vec<_>>().join("\n  ")
    }

    #[test]
    fn test_decode_png_and_jpeg() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg] {
            let png = decode_to_png(&encoded_image(format)).unwrap();
            let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (3, 2));
        }
    }

    #[test]
    fn test_decode_without_padding() {
        let encoded = encoded_image(ImageFormat::Png);
        let unpadded = encoded.trim_end_matches('=');
        assert!(decode_to_png(unpadded).is_ok());
    }

    #[test]
    fn test_decode_failures() {
        let err = decode_to_png("***not base64***").unwrap_err();
        assert_eq!(*err, CoverErrorKind::Decode);
        // Valid base64, but not an image.
        let err = decode_to_png("aGVsbG8gd29ybGQ=").unwrap_err();
        assert_eq!(*err, CoverErrorKind::Decode);
        assert!(decode_to_png("").is_err());
    }
}
