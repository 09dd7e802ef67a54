use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

use crate::types::ImageInput;

/// Longest side sent to a vendor; larger images are scaled down.
pub const MAX_SIDE: u32 = 2800;
/// JPEG quality used when re-encoding PNG uploads.
pub const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Get an upload ready for a vendor: PNG becomes JPEG and oversized images
/// are downscaled. Anything else, including formats the decoder does not
/// know, passes through untouched.
pub fn prepare_for_upload(input: ImageInput) -> Result<ImageInput, PreprocessError> {
    let format = match image::guess_format(input.bytes()) {
        Ok(format) => format,
        Err(_) => return Ok(input),
    };
    let is_png = format == ImageFormat::Png;

    let img = match image::load_from_memory_with_format(input.bytes(), format) {
        Ok(img) => img,
        Err(e) if is_png => return Err(e.into()),
        Err(_) => return Ok(input),
    };

    let oversized = img.width() > MAX_SIDE || img.height() > MAX_SIDE;
    if !is_png && !oversized {
        return Ok(input);
    }

    let img = if oversized {
        img.resize(MAX_SIDE, MAX_SIDE, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    if is_png || format == ImageFormat::Jpeg {
        to_input(encode_as_jpeg(img)?, ImageFormat::Jpeg)
    } else {
        to_input(encode_as(img, format)?, format)
    }
}

fn encode_as_jpeg(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

fn encode_as(img: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

fn to_input(bytes: Vec<u8>, format: ImageFormat) -> Result<ImageInput, PreprocessError> {
    ImageInput::new(bytes, format.to_mime_type()).map_err(|e| PreprocessError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};

    fn encoded(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn gray(width: u32, height: u32) -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(width, height, |x, _| Luma([(x % 256) as u8]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn png_becomes_jpeg() {
        let rgba: RgbaImage = ImageBuffer::from_fn(8, 8, |_, _| Rgba([10, 20, 30, 128]));
        let png = encoded(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let input = ImageInput::new(png, "image/png").unwrap();

        let out = prepare_for_upload(input).unwrap();
        assert_eq!(out.mime_type(), "image/jpeg");
        assert_eq!(image::guess_format(out.bytes()).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(out.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn small_jpeg_passes_through() {
        let jpeg = encoded(DynamicImage::ImageRgb8(gray(16, 16).to_rgb8()), ImageFormat::Jpeg);
        let input = ImageInput::new(jpeg.clone(), "image/jpeg").unwrap();
        let out = prepare_for_upload(input).unwrap();
        assert_eq!(out.bytes(), jpeg.as_slice());
    }

    #[test]
    fn unknown_bytes_pass_through() {
        let input = ImageInput::new(b"not an image".to_vec(), "image/heic").unwrap();
        let out = prepare_for_upload(input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn truncated_png_is_an_error() {
        let mut png = encoded(gray(8, 8), ImageFormat::Png);
        png.truncate(20);
        let input = ImageInput::new(png, "image/png").unwrap();
        assert!(matches!(prepare_for_upload(input), Err(PreprocessError::Load(_))));
    }

    #[test]
    fn large_image_is_downscaled() {
        let jpeg = encoded(DynamicImage::ImageRgb8(gray(3000, 100).to_rgb8()), ImageFormat::Jpeg);
        let input = ImageInput::new(jpeg, "image/jpeg").unwrap();
        let out = prepare_for_upload(input).unwrap();
        let decoded = image::load_from_memory(out.bytes()).unwrap();
        assert!(decoded.width() <= MAX_SIDE && decoded.height() <= MAX_SIDE);
        assert_eq!(out.mime_type(), "image/jpeg");
    }
}
