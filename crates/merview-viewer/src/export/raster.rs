use std::sync::{Arc, OnceLock};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ExportError;

pub const SVG_DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

/// Encodes SVG markup as a `data:` URL, the form image decoders and `<img src>` accept.
pub fn svg_data_url(markup: &str) -> String {
    format!("{SVG_DATA_URL_PREFIX}{}", STANDARD.encode(markup.as_bytes()))
}

/// Decodes the payload of a base64 `data:` URL.
pub fn data_url_bytes(url: &str) -> Result<Vec<u8>, ExportError> {
    let rest = url.strip_prefix("data:").ok_or(ExportError::DataUrl)?;
    let (_, payload) = rest.split_once(";base64,").ok_or(ExportError::DataUrl)?;
    STANDARD.decode(payload).map_err(|_| ExportError::DataUrl)
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    }))
}

/// A decoded vector image with a known natural size.
pub struct DecodedImage {
    tree: usvg::Tree,
}

impl DecodedImage {
    pub fn natural_size(&self) -> (f32, f32) {
        let size = self.tree.size();
        (size.width(), size.height())
    }
}

pub fn decode_svg_data_url(url: &str) -> Result<DecodedImage, ExportError> {
    let bytes = data_url_bytes(url)?;

    let mut opt = usvg::Options::default();
    opt.fontdb = font_database();
    opt.font_family = "Arial".to_string();
    opt.shape_rendering = usvg::ShapeRendering::GeometricPrecision;
    opt.text_rendering = usvg::TextRendering::OptimizeLegibility;
    opt.image_rendering = usvg::ImageRendering::OptimizeQuality;

    let tree = usvg::Tree::from_data(&bytes, &opt).map_err(|e| ExportError::decode(e.to_string()))?;
    let size = tree.size();
    if !(size.width().is_finite() && size.height().is_finite())
        || size.width() <= 0.0
        || size.height() <= 0.0
    {
        return Err(ExportError::decode("image has no natural size"));
    }
    Ok(DecodedImage { tree })
}

/// Draws `image` onto an opaque `background` at `scale` times its natural size.
///
/// The image is stretched to fill the whole surface, so rounding the pixel size up never leaves
/// an unpainted edge.
pub fn rasterize(
    image: &DecodedImage,
    scale: f32,
    background: tiny_skia::Color,
) -> Result<tiny_skia::Pixmap, ExportError> {
    let (width, height) = image.natural_size();
    let width_px = (width * scale).ceil().max(1.0) as u32;
    let height_px = (height * scale).ceil().max(1.0) as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width_px, height_px).ok_or(ExportError::SurfaceAlloc {
            width: width_px,
            height: height_px,
        })?;
    pixmap.fill(background);

    let transform =
        tiny_skia::Transform::from_scale(width_px as f32 / width, height_px as f32 / height);
    resvg::render(&image.tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// CSS-ish color: `transparent`, `white`, `black` or a `#rgb[a]` / `#rrggbb[aa]` hex literal.
pub fn parse_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    let [r, g, b, a] = match s.as_str() {
        "transparent" => [0, 0, 0, 0],
        "white" => [255, 255, 255, 255],
        "black" => [0, 0, 0, 255],
        _ => parse_hex(s.strip_prefix('#')?)?,
    };
    Some(tiny_skia::Color::from_rgba8(r, g, b, a))
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let digits = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()?;
    let channels: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        _ => return None,
    };
    let mut rgba = [255; 4];
    rgba[..channels.len()].copy_from_slice(&channels);
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_BLACK: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5"><rect width="5" height="5" fill="black"/></svg>"#;

    #[test]
    fn data_url_round_trips_markup() {
        let url = svg_data_url(HALF_BLACK);
        assert!(url.starts_with(SVG_DATA_URL_PREFIX));
        assert_eq!(data_url_bytes(&url).expect("decode"), HALF_BLACK.as_bytes());
    }

    #[test]
    fn rejects_urls_without_base64_payload() {
        assert!(matches!(
            data_url_bytes("data:image/svg+xml,<svg/>"),
            Err(ExportError::DataUrl)
        ));
        assert!(matches!(data_url_bytes("<svg/>"), Err(ExportError::DataUrl)));
    }

    #[test]
    fn rasterize_doubles_size_on_white() {
        let image = decode_svg_data_url(&svg_data_url(HALF_BLACK)).expect("decode");
        assert_eq!(image.natural_size(), (10.0, 5.0));

        let pixmap = rasterize(&image, 2.0, tiny_skia::Color::WHITE).expect("raster");
        assert_eq!((pixmap.width(), pixmap.height()), (20, 10));

        let left = pixmap.pixel(2, 5).expect("left pixel");
        assert_eq!((left.red(), left.green(), left.blue(), left.alpha()), (0, 0, 0, 255));
        let right = pixmap.pixel(18, 5).expect("right pixel");
        assert_eq!(
            (right.red(), right.green(), right.blue(), right.alpha()),
            (255, 255, 255, 255)
        );
    }

    #[test]
    fn undecodable_markup_is_a_decode_error() {
        let err = decode_svg_data_url(&svg_data_url("graph TD; A-->B")).err();
        assert!(matches!(err, Some(ExportError::Decode { .. })));
    }

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!(parse_color("white"), Some(tiny_skia::Color::WHITE));
        assert_eq!(
            parse_color("#f00"),
            Some(tiny_skia::Color::from_rgba8(255, 0, 0, 255))
        );
        assert_eq!(
            parse_color("#00ff0080"),
            Some(tiny_skia::Color::from_rgba8(0, 255, 0, 128))
        );
        assert_eq!(parse_color("rebeccapurple"), None);
    }
}
