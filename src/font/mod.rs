//! # Font Metrics
//!
//! A font-backed [`TextShaper`] for consumers that have the font file the
//! renderer will draw with. Advances come from the font's `hmtx` table via
//! ttf-parser, so line breaks match the rendered glyphs far better than the
//! fallback approximation. No OpenType shaping (kerning, ligatures) is
//! applied.

use std::collections::HashMap;

use crate::text::{shape_with, widest_token, ShapedText, TextShaper};

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    /// Advance used for characters the font has no glyph for.
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

impl FontMetrics {
    /// Parse metrics from font data. Returns `None` when the data is not a
    /// font ttf-parser understands.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Basic Multilingual Plane only; anything else uses the default advance.
        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(FontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        })
    }

    /// Get the advance width of a character in pixels.
    pub fn char_width(&self, ch: char, font_size: f32) -> f32 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f32 / self.units_per_em as f32) * font_size
    }

    /// Default line height in pixels: ascender − descender + line gap.
    pub fn line_height(&self, font_size: f32) -> f32 {
        let units = self.ascender as f32 - self.descender as f32 + self.line_gap as f32;
        if units <= 0.0 {
            return font_size * 1.2;
        }
        units / self.units_per_em as f32 * font_size
    }
}

/// Shapes text with the advances of one font.
#[derive(Debug, Clone)]
pub struct FontShaper {
    metrics: FontMetrics,
    /// Overrides the font's own line height, as a multiple of font size.
    line_height: Option<f32>,
}

impl FontShaper {
    pub fn new(metrics: FontMetrics) -> Self {
        Self {
            metrics,
            line_height: None,
        }
    }

    /// Parse `data` and build a shaper from it.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        FontMetrics::from_font_data(data).map(Self::new)
    }

    pub fn with_line_height(mut self, multiple: f32) -> Self {
        self.line_height = Some(multiple);
        self
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn line_height_for(&self, font_size: f32) -> f32 {
        match self.line_height {
            Some(multiple) => multiple * font_size,
            None => self.metrics.line_height(font_size),
        }
    }
}

impl TextShaper for FontShaper {
    fn shape(&self, content: &str, font_size: f32, max_width: Option<f32>) -> ShapedText {
        shape_with(content, max_width, self.line_height_for(font_size), |ch| {
            self.metrics.char_width(ch, font_size)
        })
    }

    fn min_content_width(&self, content: &str, font_size: f32) -> f32 {
        widest_token(content, |ch| self.metrics.char_width(ch, font_size))
    }
}
