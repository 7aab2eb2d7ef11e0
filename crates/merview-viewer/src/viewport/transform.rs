use std::fmt;

use euclid::default::Vector2D;

pub const TRANSFORM_ORIGIN: &str = "center center";

/// The visual transform of a displayed artifact: a pan offset followed by a uniform scale
/// around the artifact's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Vector2D<f64>,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            offset: Vector2D::zero(),
            scale: 1.0,
        }
    }

    pub fn origin(&self) -> &'static str {
        TRANSFORM_ORIGIN
    }

    /// CSS `transform` value, e.g. `translate(50px, 30px) scale(1.2)`.
    pub fn to_css(&self) -> String {
        self.to_string()
    }

    /// SVG `transform` attribute equivalent for a content box of `width` x `height`.
    ///
    /// SVG has no transform-origin on most renderers, so the scale is wrapped in a translation
    /// to and from the box center.
    pub fn to_svg_attribute(&self, width: f64, height: f64) -> String {
        let (cx, cy) = (width / 2.0, height / 2.0);
        format!(
            "translate({} {}) translate({} {}) scale({}) translate({} {})",
            fmt_num(self.offset.x),
            fmt_num(self.offset.y),
            fmt_num(cx),
            fmt_num(cy),
            fmt_num(self.scale),
            fmt_num(-cx),
            fmt_num(-cy),
        )
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}px, {}px) scale({})",
            fmt_num(self.offset.x),
            fmt_num(self.offset.y),
            fmt_num(self.scale)
        )
    }
}

fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    // Drop float noise like 1.2000000000000002.
    let rounded = (v * 1e6).round() / 1e6;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}
