// src/services/image_processor.rs
use crate::errors::GardenError;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView, ImageFormat as ImgFormat};
use log::{debug, warn};

/// A decoded upload ready to be sent to a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub media_type: String,
}

impl PreparedImage {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.data)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

pub struct ImageProcessor {
    max_dimension: u32,
    max_bytes: usize,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor {
    pub fn new() -> Self {
        // Anthropic caps base64 images at 5MB; base64 adds ~33%.
        Self {
            max_dimension: 2048,
            max_bytes: 3_750_000,
        }
    }

    /// Decode a raw base64 string or a `data:` URI into bytes.
    pub fn decode_base64(&self, input: &str) -> Result<Vec<u8>, GardenError> {
        let payload = match input.trim().strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| GardenError::Validation("Malformed data URI".to_string()))?,
            None => input.trim(),
        };

        if payload.is_empty() {
            return Err(GardenError::Validation("Image is empty".to_string()));
        }

        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| GardenError::Validation(format!("Image is not valid base64: {}", e)))
    }

    pub fn prepare_base64(&self, input: &str) -> Result<PreparedImage, GardenError> {
        let data = self.decode_base64(input)?;
        self.prepare(data)
    }

    /// Normalize raw upload bytes. Oversized decodable images are scaled
    /// down and re-encoded as JPEG; formats the decoder does not know are
    /// passed through untouched.
    pub fn prepare(&self, data: Vec<u8>) -> Result<PreparedImage, GardenError> {
        if data.is_empty() {
            return Err(GardenError::Validation("Image is empty".to_string()));
        }

        let media_type = media_type_of(&data).to_string();

        let img = match image::load_from_memory(&data) {
            Ok(img) => img,
            Err(e) => {
                warn!("Passing through undecodable image ({} bytes): {}", data.len(), e);
                return Ok(PreparedImage { data, media_type });
            }
        };

        let (width, height) = img.dimensions();
        if data.len() <= self.max_bytes
            && width <= self.max_dimension
            && height <= self.max_dimension
        {
            return Ok(PreparedImage { data, media_type });
        }

        let size_ratio = (self.max_bytes as f64 / data.len() as f64).sqrt() * 0.9;
        let dim_ratio = self.max_dimension as f64 / width.max(height) as f64;
        let ratio = size_ratio.min(dim_ratio).min(1.0);
        let new_width = ((width as f64 * ratio) as u32).max(256).min(width);
        let new_height = ((height as f64 * ratio) as u32).max(256).min(height);

        debug!(
            "Resizing image {}x{} ({} bytes) to {}x{}",
            width,
            height,
            data.len(),
            new_width,
            new_height
        );

        let resized = img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);

        let mut output = Vec::new();
        DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Jpeg)
            .map_err(|e| {
                GardenError::ImageProcessing(format!("Failed to encode resized image: {}", e))
            })?;

        Ok(PreparedImage {
            data: output,
            media_type: "image/jpeg".to_string(),
        })
    }
}

fn media_type_of(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImgFormat::Png) => "image/png",
        Ok(ImgFormat::WebP) => "image/webp",
        Ok(ImgFormat::Gif) => "image/gif",
        _ => "image/jpeg",
    }
}
