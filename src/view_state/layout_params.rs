//! Global layout parameters for invalidation tracking.

/// Font handle passed to the text shaper.
///
/// The core treats fonts as opaque values: two fonts are interchangeable
/// exactly when they compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    /// Font family name.
    pub family: String,
    /// Nominal size in pixels.
    pub pixel_size: u16,
}

impl Font {
    /// Create a new font handle.
    pub fn new(family: impl Into<String>, pixel_size: u16) -> Self {
        Self {
            family: family.into(),
            pixel_size,
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("monospace", 16)
    }
}

/// Parameters that affect every paragraph's layout.
///
/// A cached layout is only trusted while the params it was computed with
/// equal the engine's current params.
///
/// # Equality Semantics
/// Two LayoutParams are equal if they would produce identical layouts for
/// identical text.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Layout width in pixels.
    pub width: f64,
    /// Font used for shaping.
    pub font: Font,
}

impl LayoutParams {
    /// Create new layout params.
    pub fn new(width: f64, font: Font) -> Self {
        Self { width, font }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::new(800.0, Font::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_same_params() {
        let params1 = LayoutParams::new(800.0, Font::new("serif", 14));
        let params2 = LayoutParams::new(800.0, Font::new("serif", 14));
        assert_eq!(params1, params2);
    }

    #[test]
    fn test_inequality_different_width() {
        let params1 = LayoutParams::new(800.0, Font::default());
        let params2 = LayoutParams::new(640.0, Font::default());
        assert_ne!(params1, params2);
    }

    #[test]
    fn test_inequality_different_font_size() {
        let params1 = LayoutParams::new(800.0, Font::new("serif", 14));
        let params2 = LayoutParams::new(800.0, Font::new("serif", 16));
        assert_ne!(params1, params2);
    }

    #[test]
    fn test_inequality_different_family() {
        let params1 = LayoutParams::new(800.0, Font::new("serif", 14));
        let params2 = LayoutParams::new(800.0, Font::new("sans", 14));
        assert_ne!(params1, params2);
    }

    #[test]
    fn test_default_is_monospace_16_at_800() {
        let params = LayoutParams::default();
        assert_eq!(params.width, 800.0);
        assert_eq!(params.font, Font::new("monospace", 16));
    }
}
