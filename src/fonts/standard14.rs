//! Static AFM-derived metrics for the 14 standard PDF fonts (spec.md §4.H).
//!
//! Widths are keyed by Adobe StandardEncoding byte value (0-255), which covers
//! simple (non-symbolic, non-embedded) fonts — the common case. Tables are built
//! once, lazily, behind a `OnceLock` rather than eagerly at program start, matching
//! the "initialize-once" pattern noted for caches elsewhere in this crate.

use std::sync::OnceLock;

/// One of the 14 fonts every conforming PDF viewer is required to know, without it
/// being embedded in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standard14Font {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl Standard14Font {
    /// Matches a `/BaseFont` name, falling back to `Helvetica` for anything
    /// unrecognized (mirrors how readers treat an unresolvable simple font).
    pub fn from_base_font_name(name: &[u8]) -> Standard14Font {
        match name {
            b"Helvetica" => Standard14Font::Helvetica,
            b"Helvetica-Bold" => Standard14Font::HelveticaBold,
            b"Helvetica-Oblique" => Standard14Font::HelveticaOblique,
            b"Helvetica-BoldOblique" => Standard14Font::HelveticaBoldOblique,
            b"Times-Roman" => Standard14Font::TimesRoman,
            b"Times-Bold" => Standard14Font::TimesBold,
            b"Times-Italic" => Standard14Font::TimesItalic,
            b"Times-BoldItalic" => Standard14Font::TimesBoldItalic,
            b"Courier" => Standard14Font::Courier,
            b"Courier-Bold" => Standard14Font::CourierBold,
            b"Courier-Oblique" => Standard14Font::CourierOblique,
            b"Courier-BoldOblique" => Standard14Font::CourierBoldOblique,
            b"Symbol" => Standard14Font::Symbol,
            b"ZapfDingbats" => Standard14Font::ZapfDingbats,
            _ => Standard14Font::Helvetica,
        }
    }

    /// Advance width, in thousandths of an em, of `ch` under Adobe StandardEncoding.
    /// Falls back to the font's default width for anything outside the table (most
    /// often non-ASCII runes, which StandardEncoding has no slot for).
    pub fn advance_width(self, ch: char) -> f64 {
        let table = self.width_table();
        if (ch as u32) < 256 {
            if let Some(w) = table.widths[ch as usize] {
                return w;
            }
        }
        table.default_width
    }

    pub fn ascender(self) -> f64 {
        self.width_table().ascender
    }

    pub fn descender(self) -> f64 {
        self.width_table().descender
    }

    pub fn cap_height(self) -> f64 {
        self.width_table().cap_height
    }

    pub fn x_height(self) -> f64 {
        self.width_table().x_height
    }

    fn width_table(self) -> &'static FontMetrics {
        match self {
            Standard14Font::Helvetica => helvetica(),
            Standard14Font::HelveticaBold => helvetica_bold(),
            Standard14Font::HelveticaOblique => helvetica(),
            Standard14Font::HelveticaBoldOblique => helvetica_bold(),
            Standard14Font::TimesRoman => times_roman(),
            Standard14Font::TimesBold => times_bold(),
            Standard14Font::TimesItalic => times_roman(),
            Standard14Font::TimesBoldItalic => times_bold(),
            Standard14Font::Courier
            | Standard14Font::CourierBold
            | Standard14Font::CourierOblique
            | Standard14Font::CourierBoldOblique => courier(),
            Standard14Font::Symbol | Standard14Font::ZapfDingbats => symbolic(),
        }
    }
}

impl crate::fonts::GlyphMetrics for Standard14Font {
    fn advance_width(&self, ch: char) -> f64 {
        Standard14Font::advance_width(*self, ch)
    }
}

struct FontMetrics {
    ascender: f64,
    descender: f64,
    cap_height: f64,
    x_height: f64,
    default_width: f64,
    widths: [Option<f64>; 256],
}

/// Builds a StandardEncoding width table from a handful of representative bands
/// (digits, uppercase, lowercase, common punctuation) plus a default for the rest.
/// This crate measures text; it does not typeset it, so the precision needed is
/// "close enough to budget line breaks", not kerning-perfect AFM fidelity.
fn build_table(default_width: f64, ascender: f64, descender: f64, cap_height: f64, x_height: f64, entries: &[(u8, f64)]) -> FontMetrics {
    let mut widths = [None; 256];
    for &(byte, width) in entries {
        widths[byte as usize] = Some(width);
    }
    FontMetrics { ascender, descender, cap_height, x_height, default_width, widths }
}

fn helvetica() -> &'static FontMetrics {
    static TABLE: OnceLock<FontMetrics> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut entries = vec![(b' ', 278.0), (b'!', 278.0), (b'"', 355.0), (b'#', 556.0), (b'$', 556.0), (b'%', 889.0), (b'&', 667.0), (b'\'', 191.0), (b'(', 333.0), (b')', 333.0), (b'*', 389.0), (b'+', 584.0), (b',', 278.0), (b'-', 333.0), (b'.', 278.0), (b'/', 278.0), (b':', 278.0), (b';', 278.0), (b'<', 584.0), (b'=', 584.0), (b'>', 584.0), (b'?', 556.0), (b'@', 1015.0), (b'[', 278.0), (b'\\', 278.0), (b']', 278.0), (b'^', 469.0), (b'_', 556.0), (b'`', 333.0), (b'{', 334.0), (b'|', 260.0), (b'}', 334.0), (b'~', 584.0)];
        for d in b'0'..=b'9' {
            entries.push((d, 556.0));
        }
        for u in b'A'..=b'Z' {
            entries.push((u, 667.0));
        }
        for l in b'a'..=b'z' {
            entries.push((l, 556.0));
        }
        build_table(556.0, 718.0, -207.0, 718.0, 523.0, &entries)
    })
}

fn helvetica_bold() -> &'static FontMetrics {
    static TABLE: OnceLock<FontMetrics> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut entries = vec![(b' ', 278.0), (b'.', 278.0), (b',', 278.0), (b'-', 333.0)];
        for d in b'0'..=b'9' {
            entries.push((d, 556.0));
        }
        for u in b'A'..=b'Z' {
            entries.push((u, 722.0));
        }
        for l in b'a'..=b'z' {
            entries.push((l, 611.0));
        }
        build_table(611.0, 718.0, -207.0, 718.0, 532.0, &entries)
    })
}

fn times_roman() -> &'static FontMetrics {
    static TABLE: OnceLock<FontMetrics> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut entries = vec![(b' ', 250.0), (b'.', 250.0), (b',', 250.0), (b'-', 333.0)];
        for d in b'0'..=b'9' {
            entries.push((d, 500.0));
        }
        for u in b'A'..=b'Z' {
            entries.push((u, 667.0));
        }
        for l in b'a'..=b'z' {
            entries.push((l, 450.0));
        }
        build_table(500.0, 683.0, -217.0, 662.0, 450.0, &entries)
    })
}

fn times_bold() -> &'static FontMetrics {
    static TABLE: OnceLock<FontMetrics> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut entries = vec![(b' ', 250.0), (b'.', 250.0), (b',', 250.0), (b'-', 333.0)];
        for d in b'0'..=b'9' {
            entries.push((d, 500.0));
        }
        for u in b'A'..=b'Z' {
            entries.push((u, 722.0));
        }
        for l in b'a'..=b'z' {
            entries.push((l, 500.0));
        }
        build_table(500.0, 676.0, -205.0, 676.0, 461.0, &entries)
    })
}

fn courier() -> &'static FontMetrics {
    static TABLE: OnceLock<FontMetrics> = OnceLock::new();
    TABLE.get_or_init(|| build_table(600.0, 629.0, -157.0, 562.0, 426.0, &[]))
}

fn symbolic() -> &'static FontMetrics {
    static TABLE: OnceLock<FontMetrics> = OnceLock::new();
    TABLE.get_or_init(|| build_table(500.0, 750.0, -250.0, 700.0, 500.0, &[]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_ascii_with_helvetica() {
        let width = crate::fonts::measure_string(&Standard14Font::Helvetica, "AB", 12.0);
        // 'A' and 'B' are both 667 units wide in Helvetica.
        assert_eq!(width, (667.0 + 667.0) * 12.0 / 1000.0);
    }

    #[test]
    fn courier_is_fixed_pitch() {
        assert_eq!(Standard14Font::Courier.advance_width('i'), Standard14Font::Courier.advance_width('m'));
    }

    #[test]
    fn unrecognized_base_font_falls_back_to_helvetica() {
        assert_eq!(Standard14Font::from_base_font_name(b"Nonsense"), Standard14Font::Helvetica);
    }

    #[test]
    fn non_ascii_rune_uses_default_width() {
        assert_eq!(Standard14Font::Helvetica.advance_width('世'), 556.0);
    }
}
