//! Font metrics registry (spec.md §4.H): static tables for the 14 standard fonts,
//! plus a TrueType table reader for embedded fonts. Neither path parses a font
//! program beyond the tables needed for measurement — glyph outlines are out of
//! scope (spec.md Non-goals).

pub mod standard14;
pub mod truetype;

pub use standard14::Standard14Font;
pub use truetype::TrueTypeMetrics;

/// A font able to report the advance width of a character, in thousandths of an em.
pub trait GlyphMetrics {
    fn advance_width(&self, ch: char) -> f64;
}

/// `MeasureString` (spec.md §4.H): `(Σ widths) × sizePt / 1000`.
pub fn measure_string<F: GlyphMetrics>(font: &F, text: &str, size_pt: f64) -> f64 {
    let total_units: f64 = text.chars().map(|c| font.advance_width(c)).sum();
    total_units * size_pt / 1000.0
}
