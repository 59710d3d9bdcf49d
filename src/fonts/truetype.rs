//! Embedded TrueType font tables (spec.md §4.H): `cmap` for rune→glyph, `hmtx`/`hhea`
//! for glyph advance widths, scaled by `head`'s `UnitsPerEm`. Wraps `ttf_parser::Face`
//! rather than walking the sfnt directory by hand, per this crate's "use the
//! ecosystem crate the pack already reaches for" rule.

use std::collections::HashMap;

use crate::error::{Error, ParseError, Result};
use crate::fonts::GlyphMetrics;

/// The subset of an embedded TrueType/OpenType font needed for text measurement: a
/// rune→glyph map and a glyph→advance-width (in thousandths of an em) map. Glyph
/// outlines are never extracted (spec.md Non-goals).
pub struct TrueTypeMetrics {
    glyph_for_rune: HashMap<char, u16>,
    width_for_glyph: HashMap<u16, f64>,
    default_width: f64,
}

impl TrueTypeMetrics {
    /// Parses `data` (a complete `FontFile2`/sfnt blob, as embedded in a PDF's
    /// `/FontFile2` stream) at face index 0.
    ///
    /// `cmap` subtable preference order is (platform 3, encoding 10) → (platform 0,
    /// encoding 4) → (platform 3, encoding 1), per spec.md §4.H; `ttf_parser`'s own
    /// `Face::glyph_index` already implements this preference order internally, so
    /// this wrapper does not re-walk the subtable list itself.
    pub fn parse(data: &[u8]) -> Result<TrueTypeMetrics> {
        let face = ttf_parser::Face::parse(data, 0).map_err(|_| Error::Parse(ParseError::InvalidFileHeader))?;

        let units_per_em = face.units_per_em() as f64;
        if units_per_em <= 0.0 {
            return Err(Error::Parse(ParseError::InvalidFileHeader));
        }

        let mut glyph_for_rune = HashMap::new();
        for codepoint in 0u32..=0x10_FFFF {
            let Some(ch) = char::from_u32(codepoint) else { continue };
            if let Some(glyph_id) = face.glyph_index(ch) {
                glyph_for_rune.insert(ch, glyph_id.0);
            }
        }

        let mut width_for_glyph = HashMap::new();
        for glyph_index in 0..face.number_of_glyphs() {
            let glyph_id = ttf_parser::GlyphId(glyph_index);
            if let Some(advance) = face.glyph_hor_advance(glyph_id) {
                width_for_glyph.insert(glyph_index, advance as f64 * 1000.0 / units_per_em);
            }
        }

        let default_width = face.glyph_hor_advance(ttf_parser::GlyphId(0)).map(|a| a as f64 * 1000.0 / units_per_em).unwrap_or(0.0);

        Ok(TrueTypeMetrics { glyph_for_rune, width_for_glyph, default_width })
    }

    /// Glyph ID backing `ch`, if the font's `cmap` maps it to one.
    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.glyph_for_rune.get(&ch).copied()
    }

    /// Advance width of `glyph_id`, in thousandths of an em, falling back to glyph 0's
    /// width (conventionally `.notdef`) for an ID the `hmtx` table has no entry for.
    pub fn glyph_width(&self, glyph_id: u16) -> f64 {
        self.width_for_glyph.get(&glyph_id).copied().unwrap_or(self.default_width)
    }
}

impl GlyphMetrics for TrueTypeMetrics {
    /// Advance width for `ch` via its mapped glyph, or the default width if `cmap`
    /// has no entry for it (an unmapped rune, often because it falls outside the
    /// font's coverage).
    fn advance_width(&self, ch: char) -> f64 {
        match self.glyph_id(ch) {
            Some(gid) => self.glyph_width(gid),
            None => self.default_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_font_data() {
        let err = TrueTypeMetrics::parse(b"not a font file").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidFileHeader)));
    }

    #[test]
    fn rejects_empty_data() {
        let err = TrueTypeMetrics::parse(&[]).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidFileHeader)));
    }
}
