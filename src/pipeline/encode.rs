//! Wrap a rendered page for the vision request: PNG bytes, base64, and the
//! `high` detail hint so small print is tiled rather than downsampled.

use crate::error::Pdf2ParaError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode page `page_num` as a base64 PNG attachment.
pub fn encode_page(page_num: usize, img: &DynamicImage) -> Result<ImageData, Pdf2ParaError> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| Pdf2ParaError::RasterisationFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {e}"),
        })?;

    let data = STANDARD.encode(&png);
    debug!("Page {}: {} PNG bytes, {} base64 bytes", page_num, png.len(), data.len());

    Ok(ImageData::new(data, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn produces_decodable_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255])));
        let data = encode_page(1, &img).unwrap();
        assert_eq!(data.mime_type, "image/png");

        let bytes = STANDARD.decode(&data.data).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let round = image::load_from_memory(&bytes).unwrap();
        assert_eq!((round.width(), round.height()), (4, 3));
    }
}
