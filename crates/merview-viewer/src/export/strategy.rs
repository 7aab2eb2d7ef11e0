use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageEncoder as _;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use super::sink::DownloadPayload;
use crate::error::ExportError;

pub const PNG_MIME: &str = "image/png";
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// One way of turning a raster surface into a deliverable payload.
///
/// The exporter tries its strategies in order and stops at the first success.
pub trait RasterStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `quality` is in `0.0..=1.0`; lossless encoders map it onto their compression effort.
    fn serialize(
        &self,
        pixmap: &tiny_skia::Pixmap,
        quality: f32,
    ) -> Result<DownloadPayload, ExportError>;
}

/// Binary PNG delivered as a blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngBlobStrategy;

/// PNG re-encoded as a `data:` URL, for sinks that only take URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngDataUrlStrategy;

pub fn compression_for(quality: f32) -> CompressionType {
    if quality >= 0.9 {
        CompressionType::Best
    } else if quality >= 0.5 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    }
}

fn straight_rgba(pixmap: &tiny_skia::Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len() * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

impl RasterStrategy for PngBlobStrategy {
    fn name(&self) -> &'static str {
        "png-blob"
    }

    fn serialize(
        &self,
        pixmap: &tiny_skia::Pixmap,
        quality: f32,
    ) -> Result<DownloadPayload, ExportError> {
        let rgba = straight_rgba(pixmap);
        let mut bytes = Vec::new();
        PngEncoder::new_with_quality(&mut bytes, compression_for(quality), FilterType::Adaptive)
            .write_image(
                &rgba,
                pixmap.width(),
                pixmap.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| ExportError::serialize(self.name(), e))?;
        Ok(DownloadPayload::Blob {
            mime: PNG_MIME,
            bytes,
        })
    }
}

impl RasterStrategy for PngDataUrlStrategy {
    fn name(&self) -> &'static str {
        "png-data-url"
    }

    fn serialize(
        &self,
        pixmap: &tiny_skia::Pixmap,
        _quality: f32,
    ) -> Result<DownloadPayload, ExportError> {
        let bytes = pixmap
            .encode_png()
            .map_err(|e| ExportError::serialize(self.name(), e))?;
        Ok(DownloadPayload::DataUrl(format!(
            "{PNG_DATA_URL_PREFIX}{}",
            STANDARD.encode(bytes)
        )))
    }
}

pub fn default_strategies() -> Vec<Box<dyn RasterStrategy>> {
    vec![Box::new(PngBlobStrategy), Box::new(PngDataUrlStrategy)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_pixmap() -> tiny_skia::Pixmap {
        let mut pixmap = tiny_skia::Pixmap::new(3, 2).expect("pixmap");
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        pixmap
    }

    #[test]
    fn blob_is_a_decodable_png() {
        let payload = PngBlobStrategy
            .serialize(&red_pixmap(), 0.95)
            .expect("serialize");
        let DownloadPayload::Blob { mime, bytes } = payload else {
            panic!("expected a blob payload");
        };
        assert_eq!(mime, PNG_MIME);
        let img = image::load_from_memory(&bytes).expect("png").to_rgba8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn data_url_carries_png_bytes() {
        let payload = PngDataUrlStrategy
            .serialize(&red_pixmap(), 0.95)
            .expect("serialize");
        let DownloadPayload::DataUrl(url) = &payload else {
            panic!("expected a data URL payload");
        };
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        let bytes = payload.into_bytes().expect("bytes");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn quality_maps_to_compression_effort() {
        assert!(matches!(compression_for(0.95), CompressionType::Best));
        assert!(matches!(compression_for(0.6), CompressionType::Default));
        assert!(matches!(compression_for(0.1), CompressionType::Fast));
    }
}
