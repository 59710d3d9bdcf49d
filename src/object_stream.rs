//! Object streams (spec.md §4.G): a `/Type /ObjStm` stream packs several
//! non-stream objects into one compressed container, addressed by compressed
//! xref entries (`XrefEntry::Compressed`).

use crate::error::{Error, ParseError, Result};
use crate::lexer::ParserInput;
use crate::object::{Object, ObjectId, Stream};
use crate::parser;

/// A decoded object stream: `/N` (object_number, byte_offset) pairs plus the
/// decompressed payload they index into.
pub struct ObjectStream {
    offsets: Vec<(u32, usize)>,
    first: usize,
    data: Vec<u8>,
}

/// Producers rarely pack more than a few hundred objects per stream; this
/// bounds the header parse against a hostile `/N`.
const MAX_OBJECTS: i64 = 1_000_000;
const MAX_FIRST: i64 = 100_000_000;

impl ObjectStream {
    /// Decodes `stream`'s filter chain and parses its `/N`/`/First` header.
    /// Nested object streams (an object inside an `ObjStm` that is itself a
    /// stream) are never legal PDF and are rejected as malformed.
    pub fn parse(stream: &Stream, max_decompressed_size: usize) -> Result<ObjectStream> {
        let dict = &stream.dict;
        let n = dict.get(b"N").and_then(Object::as_i64).map_err(|_| ParseError::InvalidObjectStream)?;
        let first = dict.get(b"First").and_then(Object::as_i64).map_err(|_| ParseError::InvalidObjectStream)?;
        if !(0..=MAX_OBJECTS).contains(&n) || !(0..=MAX_FIRST).contains(&first) {
            return Err(ParseError::InvalidObjectStream.into());
        }
        let data = crate::filters::decode_stream(stream, max_decompressed_size)?;
        let header = data.get(..first as usize).ok_or(ParseError::InvalidObjectStream)?;

        let mut offsets = Vec::with_capacity(n as usize);
        let input = ParserInput::new_extra(header, "objstm-header");
        let mut rest = input;
        for _ in 0..n {
            let (r, num) = read_uint(rest)?;
            let (r, off) = read_uint(r)?;
            offsets.push((num as u32, off as usize));
            rest = r;
        }

        Ok(ObjectStream { offsets, first: first as usize, data })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Object numbers this stream holds, in header order (their index doubles
    /// as the `index` field of a `Compressed` xref entry).
    pub fn object_number_at(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).map(|&(num, _)| num)
    }

    /// Parses the object at `index` (compressed objects are always generation
    /// 0, per spec.md §4.G).
    pub fn object_at(&self, index: usize) -> Result<(ObjectId, Object)> {
        let &(number, rel_offset) = self.offsets.get(index).ok_or(Error::MissingXrefEntry)?;
        let absolute = self.first.checked_add(rel_offset).ok_or(Error::InvalidStream("objstm offset overflow".into()))?;
        let slice = self.data.get(absolute..).ok_or(Error::InvalidOffset(absolute))?;
        let input = ParserInput::new_extra(slice, "objstm-object");
        let (_, obj) =
            parser::value(input).map_err(|_| Error::Parse(ParseError::UnexpectedToken))?;
        Ok(((number, 0), obj))
    }
}

fn read_uint(input: ParserInput) -> Result<(ParserInput, i64)> {
    let (rest, tok) = crate::lexer::next_token(input).map_err(|_| Error::Parse(ParseError::InvalidObjectStream))?;
    match tok {
        crate::lexer::Token::Integer(n) if n >= 0 => Ok((rest, n)),
        _ => Err(ParseError::InvalidObjectStream.into()),
    }
}
