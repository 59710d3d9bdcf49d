//! Object-level parser (spec.md §4.B) built on the `lexer` token primitives.
//!
//! `value` is the generic "parse one PDF value" entry point used for array and
//! dictionary elements; it folds the "int int R" three-token lookahead into a
//! single pass so references read naturally wherever a value can appear.
//! `indirect_object` is the top-level "N G obj ... endobj" entry point used by
//! both the initial xref/trailer walk and by `Document::resolve`.

use std::collections::HashMap;

use crate::error::{Error, ParseError, Result, XrefError};
use crate::lexer::{next_token, ws0, ParserInput, Token};
use crate::limits::Limits;
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::xref::{Xref, XrefEntry};

/// Looks up the byte offset of an already-known indirect object, so the stream
/// length can be resolved even when `/Length` is itself an indirect reference
/// (spec.md §4.B step 2, "if resolvable").
pub trait OffsetResolver {
    fn offset_of(&self, id: ObjectId) -> Option<usize>;
}

impl OffsetResolver for Xref {
    fn offset_of(&self, id: ObjectId) -> Option<usize> {
        match self.get(id.0) {
            Some(XrefEntry::Normal { offset, generation }) if *generation == id.1 => Some(*offset as usize),
            _ => None,
        }
    }
}

fn nom_err<'a>(input: ParserInput<'a>) -> nom::Err<nom::error::Error<ParserInput<'a>>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
}

fn to_parse_error(buffer_exhausted: bool) -> Error {
    if buffer_exhausted {
        ParseError::UnterminatedComposite.into()
    } else {
        ParseError::UnexpectedToken.into()
    }
}

/// Parses one PDF value: a primitive, an array, a dictionary, or (via lookahead)
/// an indirect reference. Never recognises "N G obj" — that is only legal at the
/// top level and is handled by [`indirect_object`].
pub fn value(input: ParserInput) -> nom::IResult<ParserInput, Object> {
    let (rest, tok) = next_token(input)?;
    match tok {
        Token::Null => Ok((rest, Object::Null)),
        Token::Boolean(b) => Ok((rest, Object::Boolean(b))),
        Token::Name(n) => Ok((rest, Object::Name(n))),
        Token::String(s) => Ok((rest, Object::String(s, StringFormat::Literal))),
        Token::HexString(s) => Ok((rest, Object::String(s, StringFormat::Hexadecimal))),
        Token::Real(f) => Ok((rest, Object::Real(f))),
        Token::Integer(i) => Ok(reference_lookahead(rest, i)),
        Token::ArrayStart => array_tail(rest),
        Token::DictStart => dict_tail(rest),
        Token::ArrayEnd | Token::DictEnd | Token::Eof | Token::Keyword(_) => Err(nom_err(rest)),
    }
}

/// After an `Integer` token, peeks up to two more tokens for the `int R`
/// pattern. On a miss, returns the plain integer and leaves `rest` untouched
/// (nom combinators never advance on a failed alternative, so there is nothing
/// to roll back here beyond just not taking the longer match).
fn reference_lookahead(rest: ParserInput, first: i64) -> (ParserInput, Object) {
    if let Ok((rest2, Token::Integer(gen))) = next_token(rest) {
        if let Ok((rest3, Token::Keyword(kw))) = next_token(rest2) {
            if kw == b"R" {
                return (rest3, Object::Reference((first as u32, gen as u16)));
            }
        }
    }
    (rest, Object::Integer(first))
}

fn array_tail(mut input: ParserInput) -> nom::IResult<ParserInput, Object> {
    let mut items = Vec::new();
    loop {
        if let Ok((rest, Token::ArrayEnd)) = next_token(input) {
            return Ok((rest, Object::Array(items)));
        }
        let (rest, item) = value(input)?;
        items.push(item);
        input = rest;
    }
}

fn dict_tail(mut input: ParserInput) -> nom::IResult<ParserInput, Object> {
    let mut dict = Dictionary::new();
    loop {
        if let Ok((rest, Token::DictEnd)) = next_token(input) {
            return Ok((rest, Object::Dictionary(dict)));
        }
        let (rest, key_tok) = next_token(input)?;
        let Token::Name(key) = key_tok else {
            return Err(nom_err(input));
        };
        let (rest, val) = value(rest)?;
        dict.set(key, val);
        input = rest;
    }
}

/// Parses "N G obj" and returns the object id plus the span immediately after
/// the `obj` keyword.
fn indirect_header(input: ParserInput) -> nom::IResult<ParserInput, ObjectId> {
    let (rest, _) = ws0(input)?;
    let (rest, n_tok) = next_token(rest)?;
    let Token::Integer(n) = n_tok else { return Err(nom_err(rest)) };
    let (rest, g_tok) = next_token(rest)?;
    let Token::Integer(g) = g_tok else { return Err(nom_err(rest)) };
    let (rest, kw_tok) = next_token(rest)?;
    let Token::Keyword(kw) = kw_tok else { return Err(nom_err(rest)) };
    if kw != b"obj" {
        return Err(nom_err(rest));
    }
    Ok((rest, (n as u32, g as u16)))
}

fn skip_ws_bytes(bytes: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < bytes.len() && crate::lexer::is_pdf_whitespace(bytes[i]) {
        i += 1;
    }
    &bytes[i..]
}

/// How many bytes of end-of-line sequence immediately follow the `stream`
/// keyword: exactly one LF or CRLF per PDF 1.7 §7.3.8.1. A bare CR (some
/// producers emit one) is tolerated as a single-byte terminator too.
fn stream_eol_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(b'\r') if bytes.get(1) == Some(&b'\n') => 2,
        Some(b'\r') | Some(b'\n') => 1,
        _ => 0,
    }
}

fn scan_endstream(buffer: &[u8], data_start: usize) -> usize {
    let haystack = &buffer[data_start..];
    let needle = b"endstream";
    let found = haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap_or(haystack.len());
    let mut end = found;
    if end > 0 && haystack[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && haystack[end - 1] == b'\r' {
            end -= 1;
        }
    } else if end > 0 && haystack[end - 1] == b'\r' {
        end -= 1;
    }
    end
}

/// Resolves `/Length`, trusting a direct integer or an already-known indirect
/// reference only if the bytes that follow actually line up with `endstream`
/// (spec.md §4.B, §9 stream-length fallback).
fn resolve_length(
    buffer: &[u8], dict: &Dictionary, data_start: usize, resolver: Option<&dyn OffsetResolver>,
) -> Option<usize> {
    let raw = dict.get(b"Length").ok()?;
    let len = match raw {
        Object::Integer(n) if *n >= 0 => *n as usize,
        Object::Reference(id) => {
            let off = resolver?.offset_of(*id)?;
            let (_, obj) = indirect_object(buffer, off, None, None).ok()?;
            let n = obj.as_i64().ok()?;
            if n < 0 {
                return None;
            }
            n as usize
        }
        _ => return None,
    };
    let end = data_start.checked_add(len)?;
    if end > buffer.len() {
        return None;
    }
    if skip_ws_bytes(&buffer[end..]).starts_with(b"endstream") {
        Some(len)
    } else {
        None
    }
}

/// Parses one indirect object ("N G obj ... endobj") starting at `offset`.
/// `resolver`, when given, is used to look up an indirect `/Length`'s own
/// offset; `limits` bounds the stream content length scan.
pub fn indirect_object(
    buffer: &[u8], offset: usize, resolver: Option<&dyn OffsetResolver>, limits: Option<&Limits>,
) -> Result<(ObjectId, Object)> {
    if offset >= buffer.len() {
        return Err(Error::InvalidOffset(offset));
    }
    let input = ParserInput::new_extra(&buffer[offset..], "object");
    let (rest, id) = indirect_header(input).map_err(|_| to_parse_error(false))?;
    let (rest, obj) = value(rest).map_err(|_| to_parse_error(rest.fragment().is_empty()))?;

    let Object::Dictionary(dict) = obj else {
        let (after, kw) = next_token(rest).map_err(|_| to_parse_error(true))?;
        return match kw {
            Token::Keyword(k) if k == b"endobj" => Ok((id, obj)),
            _ => {
                let _ = after;
                Ok((id, obj))
            }
        };
    };

    let after_dict = rest;
    match next_token(after_dict) {
        Ok((after_kw, Token::Keyword(kw))) if kw == b"stream" => {
            let tail = after_kw.fragment();
            let eol = stream_eol_len(tail);
            let data_start = offset + after_kw.location_offset() + eol;
            if data_start > buffer.len() {
                return Err(Error::InvalidStream("stream data starts past end of file".into()));
            }
            let max = limits.map(|l| l.max_decompressed_size).unwrap_or(usize::MAX);
            let len = resolve_length(buffer, &dict, data_start, resolver)
                .unwrap_or_else(|| scan_endstream(buffer, data_start).min(max));
            let data_end = (data_start + len).min(buffer.len());
            let content = buffer[data_start..data_end].to_vec();
            let mut stream = Stream::new(dict, content);
            stream.dict.set("Length", Object::Integer(len as i64));
            stream.start_position = Some(data_start);
            Ok((id, Object::Stream(stream)))
        }
        _ => Ok((id, Object::Dictionary(dict))),
    }
}

/// Locates the `%PDF-M.m` header, tolerating leading junk bytes some
/// producers prepend (spec.md §4.B step 1). Returns the version string and
/// the byte offset the header starts at (all further offsets in the xref
/// chain are relative to the file as a whole, not this offset).
pub fn header_version(buffer: &[u8]) -> Result<String> {
    let window = &buffer[..buffer.len().min(1024)];
    let pos = window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .ok_or(ParseError::InvalidFileHeader)?;
    let rest = &buffer[pos + 5..buffer.len().min(pos + 5 + 16)];
    let end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n' || crate::lexer::is_pdf_whitespace(b))
        .unwrap_or(rest.len());
    Ok(String::from_utf8_lossy(&rest[..end]).trim().to_string())
}

/// Scans backward from the end of the file for `startxref` followed by a
/// non-negative integer followed by `%%EOF`, per spec.md §4.B step 2 (the
/// last 1024 bytes, where producers place the trailing `startxref`/`%%EOF`
/// pair).
pub fn locate_startxref(buffer: &[u8]) -> Result<usize> {
    let tail_start = buffer.len().saturating_sub(1024);
    let tail = &buffer[tail_start..];
    let needle = b"startxref";
    let pos = tail
        .windows(needle.len())
        .rposition(|w| w == needle)
        .ok_or(XrefError::Start)?;
    let after = &tail[pos + needle.len()..];
    let after = skip_ws_bytes(after);
    let digits_len = after.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return Err(XrefError::Start.into());
    }
    let offset = std::str::from_utf8(&after[..digits_len])
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or(XrefError::Start)?;

    let after_digits = skip_ws_bytes(&after[digits_len..]);
    if !after_digits.starts_with(b"%%EOF") {
        return Err(XrefError::Start.into());
    }
    Ok(offset)
}

fn decode_xref_stream(stream: &Stream, limits: &Limits) -> Result<(Xref, Dictionary)> {
    let dict = stream.dict.clone();
    let w_obj = dict.get(b"W").map_err(|_| XrefError::StreamDict)?;
    let w_arr = w_obj.as_array().map_err(|_| XrefError::StreamDict)?;
    if w_arr.len() != 3 {
        return Err(XrefError::StreamDict.into());
    }
    let w: Vec<usize> = w_arr
        .iter()
        .map(|o| o.as_i64().map(|n| n.max(0) as usize))
        .collect::<Result<_>>()
        .map_err(|_| XrefError::StreamDict)?;
    let size = dict.get(b"Size").and_then(Object::as_i64).map_err(|_| XrefError::StreamDict)? as u32;
    let index: Vec<(u32, u32)> = match dict.get(b"Index") {
        Ok(Object::Array(a)) => a
            .chunks(2)
            .filter_map(|c| {
                let a = c.first()?.as_i64().ok()? as u32;
                let b = c.get(1)?.as_i64().ok()? as u32;
                Some((a, b))
            })
            .collect(),
        _ => vec![(0, size)],
    };

    let decoded = crate::filters::decode_stream(stream, limits.max_decompressed_size)?;
    let entry_len = w[0] + w[1] + w[2];
    if entry_len == 0 {
        return Err(XrefError::StreamDict.into());
    }

    let mut xref = Xref::new(size);
    let mut pos = 0usize;
    for (start, count) in index {
        for i in 0..count {
            if pos + entry_len > decoded.len() {
                break;
            }
            let entry = &decoded[pos..pos + entry_len];
            pos += entry_len;
            let mut off = 0usize;
            let mut read_field = |width: usize| -> u64 {
                let mut v = 0u64;
                for _ in 0..width {
                    v = (v << 8) | entry[off] as u64;
                    off += 1;
                }
                v
            };
            let kind = if w[0] == 0 { 1 } else { read_field(w[0]) };
            let f2 = read_field(w[1]);
            let f3 = if w[2] == 0 { 0 } else { read_field(w[2]) };
            let object_number = start + i;
            let xref_entry = match kind {
                0 => XrefEntry::Free { next_generation: f3 as u16 },
                1 => XrefEntry::Normal { offset: f2 as u32, generation: f3 as u16 },
                2 => XrefEntry::Compressed { container: f2 as u32, index: f3 as u16 },
                _ => continue,
            };
            xref.insert(object_number, xref_entry);
        }
    }
    Ok((xref, dict))
}

fn parse_classic_table(
    buffer: &[u8], offset: usize, resolver: Option<&dyn OffsetResolver>,
) -> Result<(Xref, Dictionary)> {
    let input = ParserInput::new_extra(&buffer[offset..], "xref");
    let (mut rest, tok) = next_token(input).map_err(|_| to_parse_error(true))?;
    let Token::Keyword(kw) = tok else { return Err(XrefError::Trailer.into()) };
    if kw != b"xref" {
        return Err(XrefError::Trailer.into());
    }

    let mut xref = Xref::new(0);
    loop {
        let probe = next_token(rest).map_err(|_| to_parse_error(true))?;
        if let (_, Token::Keyword(k)) = &probe {
            if k == b"trailer" {
                rest = probe.0;
                break;
            }
        }
        let (r, first_tok) = probe;
        let Token::Integer(first) = first_tok else { return Err(ParseError::InvalidXref.into()) };
        let (r, count_tok) = next_token(r).map_err(|_| to_parse_error(true))?;
        let Token::Integer(count) = count_tok else { return Err(ParseError::InvalidXref.into()) };
        rest = r;
        for i in 0..count.max(0) as u32 {
            let (r, off_tok) = next_token(rest).map_err(|_| to_parse_error(true))?;
            let (r, gen_tok) = next_token(r).map_err(|_| to_parse_error(true))?;
            let (r, kind_tok) = next_token(r).map_err(|_| to_parse_error(true))?;
            rest = r;
            let (Token::Integer(off), Token::Integer(gen)) = (off_tok, gen_tok) else {
                return Err(ParseError::InvalidXref.into());
            };
            let Token::Keyword(kind) = kind_tok else { return Err(ParseError::InvalidXref.into()) };
            let number = first as u32 + i;
            let entry = match kind.as_slice() {
                b"n" => XrefEntry::Normal { offset: off as u32, generation: gen as u16 },
                b"f" => XrefEntry::Free { next_generation: gen as u16 },
                _ => return Err(ParseError::InvalidXref.into()),
            };
            xref.insert(number, entry);
        }
        xref.size = xref.size.max(first as u32 + count.max(0) as u32);
    }

    let (_, trailer_obj) = value(rest).map_err(|_| to_parse_error(true))?;
    let Object::Dictionary(mut trailer) = trailer_obj else { return Err(XrefError::Trailer.into()) };

    if let Ok(stm_off) = trailer.get(b"XRefStm").and_then(Object::as_i64) {
        if let Ok((stm_xref, _)) = parse_xref_and_trailer(buffer, stm_off as usize, resolver, &Limits::default()) {
            let mut merged = stm_xref;
            merged.merge(xref);
            xref = merged;
        }
    }
    trailer.remove(b"XRefStm");

    Ok((xref, trailer))
}

/// Parses one xref section (classic table or xref stream) plus its trailer
/// dictionary, dispatching on whether `offset` begins with the `xref` keyword
/// (spec.md §4.C).
pub fn parse_xref_and_trailer(
    buffer: &[u8], offset: usize, resolver: Option<&dyn OffsetResolver>, limits: &Limits,
) -> Result<(Xref, Dictionary)> {
    if offset >= buffer.len() {
        return Err(Error::InvalidOffset(offset));
    }
    let input = ParserInput::new_extra(&buffer[offset..], "xref");
    let is_classic = matches!(next_token(input), Ok((_, Token::Keyword(kw))) if kw == b"xref");
    if is_classic {
        parse_classic_table(buffer, offset, resolver)
    } else {
        let (_, obj) = indirect_object(buffer, offset, resolver, Some(limits))?;
        let stream = obj.as_stream().map_err(|_| XrefError::StreamDict)?;
        decode_xref_stream(stream, limits)
    }
}

/// Walks the full xref chain starting at `start_offset`, merging `/Prev`
/// sections first-walked-wins (spec.md §9) and filling in trailer keys an
/// older section's trailer carries but a newer one omits.
pub fn walk_xref_chain(buffer: &[u8], start_offset: usize, limits: &Limits) -> Result<(Xref, Dictionary)> {
    let mut seen = HashMap::new();
    let mut xref = Xref::new(0);
    let mut trailer = Dictionary::new();
    let mut offset = start_offset;
    loop {
        if seen.insert(offset, ()).is_some() {
            break;
        }
        let (section_xref, section_trailer) = parse_xref_and_trailer(buffer, offset, Some(&xref), limits)?;
        xref.merge(section_xref);

        for (k, v) in section_trailer.iter() {
            if !trailer.has(k) {
                trailer.set(k.clone(), v.clone());
            }
        }

        match section_trailer.get(b"Prev").and_then(Object::as_i64) {
            Ok(prev) if prev >= 0 => offset = prev as usize,
            _ => break,
        }
    }
    Ok((xref, trailer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_value(src: &[u8]) -> Object {
        let input = ParserInput::new_extra(src, "test");
        value(input).unwrap().1
    }

    #[test]
    fn parses_plain_integer() {
        assert_eq!(parse_value(b"42"), Object::Integer(42));
    }

    #[test]
    fn int_int_r_lookahead_is_a_reference() {
        assert_eq!(parse_value(b"12 0 R"), Object::Reference((12, 0)));
    }

    #[test]
    fn two_integers_without_r_are_not_collapsed() {
        // Lookahead only fires on a trailing `R` keyword; array context re-parses
        // the second integer as its own element.
        let input = ParserInput::new_extra(b"[1 2]".as_slice(), "test");
        let (_, obj) = value(input).unwrap();
        assert_eq!(obj, Object::Array(vec![Object::Integer(1), Object::Integer(2)]));
    }

    #[test]
    fn parses_nested_array_and_dictionary() {
        let obj = parse_value(b"<</A[1 2 3]/B<</C true>>>>");
        let Object::Dictionary(dict) = obj else { panic!("expected dictionary") };
        assert_eq!(dict.get(b"A").unwrap().as_array().unwrap().len(), 3);
        let inner = dict.get(b"B").unwrap().as_dict().unwrap();
        assert_eq!(inner.get(b"C").unwrap().as_bool().unwrap(), true);
    }

    #[test]
    fn header_version_tolerates_leading_junk() {
        let buf = b"garbage\x00%PDF-1.7\n%junk binary\n1 0 obj<<>>endobj";
        assert_eq!(header_version(buf).unwrap(), "1.7");
    }

    #[test]
    fn header_version_missing_is_an_error() {
        assert!(header_version(b"not a pdf at all").is_err());
    }

    #[test]
    fn locate_startxref_scans_from_the_tail() {
        let buf = b"%PDF-1.7\n...\nstartxref\n1234\n%%EOF";
        assert_eq!(locate_startxref(buf).unwrap(), 1234);
    }

    #[test]
    fn indirect_object_with_stream_resolves_direct_length() {
        let buf = b"1 0 obj<</Length 5>>stream\nHello\nendstream\nendobj\n";
        let (id, obj) = indirect_object(buf, 0, None, None).unwrap();
        assert_eq!(id, (1, 0));
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.content, b"Hello");
    }

    #[test]
    fn indirect_object_falls_back_to_endstream_scan_on_bad_length() {
        // /Length lies; the scanner falls back to finding the literal `endstream`.
        let buf = b"1 0 obj<</Length 999>>stream\nHello\nendstream\nendobj\n";
        let (_, obj) = indirect_object(buf, 0, None, None).unwrap();
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.content, b"Hello");
    }

    #[test]
    fn indirect_object_plain_dictionary_has_no_stream() {
        let buf = b"7 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n";
        let (id, obj) = indirect_object(buf, 0, None, None).unwrap();
        assert_eq!(id, (7, 0));
        assert!(obj.as_dict().is_ok());
    }

    #[test]
    fn parses_classic_xref_table_and_trailer() {
        let buf = b"xref\n0 3\n0000000000 65535 f \n0000000010 00000 n \n0000000020 00000 n \ntrailer\n<</Root 1 0 R/Size 3>>\n";
        let (xref, trailer) = parse_classic_table(buf, 0, None).unwrap();
        assert!(matches!(xref.get(0), Some(XrefEntry::Free { .. })));
        assert!(matches!(xref.get(1), Some(XrefEntry::Normal { offset: 10, generation: 0 })));
        assert!(matches!(xref.get(2), Some(XrefEntry::Normal { offset: 20, generation: 0 })));
        assert_eq!(trailer.get(b"Size").unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn walk_xref_chain_follows_prev_and_fills_gaps() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.7\n");
        let original_xref_offset = buf.len();
        buf.extend_from_slice(
            b"xref\n0 2\n0000000000 65535 f \n0000000009 00000 n \ntrailer\n<</Root 1 0 R/Size 2>>\n",
        );
        let update_offset = buf.len();
        buf.extend_from_slice(
            format!("xref\n1 1\n0000000500 00000 n \ntrailer\n<</Root 1 0 R/Size 2/Prev {original_xref_offset}>>\n")
                .as_bytes(),
        );

        let limits = Limits::default();
        let (xref, trailer) = walk_xref_chain(&buf, update_offset, &limits).unwrap();
        // Newest section wins for object 1 (offset 500); the older section's
        // object 0 entry fills the gap the newest section doesn't mention.
        assert!(matches!(xref.get(1), Some(XrefEntry::Normal { offset: 500, generation: 0 })));
        assert!(matches!(xref.get(0), Some(XrefEntry::Free { .. })));
        assert_eq!(trailer.get(b"Size").unwrap().as_i64().unwrap(), 2);
    }
}
