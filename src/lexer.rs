//! Lexer (spec.md §4.A): byte-oriented tokenizer for PDF 1.7 §7.2 syntax.
//!
//! Tokens are produced by `nom` combinators over a [`ParserInput`], a
//! [`nom_locate::LocatedSpan`] that carries a `&'static str` context tag plus
//! line/column for diagnostics — this gives the lossless one-token lookahead the
//! spec calls for without hand-rolled buffering: `nom`'s combinators only ever
//! consume input on a successful parse, so failed alternatives never advance the
//! span. The object parser (`parser::object`) and the content-stream tokenizer both
//! build on these same primitives, so there is exactly one lexer in this crate.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_while, take_while1};
use nom::character::complete::{char, digit1};
use nom::combinator::{map, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{pair, preceded};
use nom::IResult;
use nom_locate::LocatedSpan;

/// Input type threaded through every parser combinator in this crate. The `&'static
/// str` extra field is a free-form context tag (`"header"`, `"xref"`, ...) surfaced
/// in diagnostics; it carries no parsing semantics.
pub type ParserInput<'a> = LocatedSpan<&'a [u8], &'static str>;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(Vec<u8>),
    Boolean(bool),
    Null,
    Keyword(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    Eof,
}

/// Maximum nesting depth for unescaped parentheses inside a literal string
/// (mirrors the teacher's `MAX_BRACKET` guard against pathological input).
pub const MAX_STRING_NESTING: usize = 100;

pub(crate) fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(b: u8) -> bool {
    !is_pdf_whitespace(b) && !is_delimiter(b)
}

/// Comments run from `%` to end-of-line; they are whitespace for lexing purposes.
fn comment(input: ParserInput) -> IResult<ParserInput, ()> {
    value((), pair(char('%'), take_till(|b| b == b'\n' || b == b'\r')))(input)
}

/// Consumes any run of whitespace and/or comments. Never fails (matches zero bytes).
pub fn ws0(input: ParserInput) -> IResult<ParserInput, ()> {
    value(
        (),
        many0(alt((value((), take_while1(is_pdf_whitespace)), comment))),
    )(input)
}

fn sign(input: ParserInput) -> IResult<ParserInput, Option<char>> {
    opt(alt((char('+'), char('-'))))(input)
}

/// Integer or real literal. No exponent form; `.`, `+.`, `-.` are valid reals (0.0).
pub fn number(input: ParserInput) -> IResult<ParserInput, Token> {
    let (rest, (s, int_part, frac_part)) = pair3(sign, opt(digit1), opt(preceded(char('.'), opt(digit1))))(input)?;
    if int_part.is_none() && frac_part.is_none() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    let mut text = String::new();
    if let Some(s) = s {
        text.push(s);
    }
    if let Some(i) = int_part {
        text.push_str(&String::from_utf8_lossy(i.fragment()));
    }
    let is_real = frac_part.is_some();
    if let Some(Some(f)) = frac_part {
        text.push('.');
        text.push_str(&String::from_utf8_lossy(f.fragment()));
    } else if frac_part.is_some() {
        text.push_str(".0");
    }
    if is_real {
        let value: f64 = text.parse().unwrap_or(0.0);
        Ok((rest, Token::Real(value)))
    } else {
        let value: i64 = text.parse().unwrap_or(0);
        Ok((rest, Token::Integer(value)))
    }
}

fn pair3<I: Clone, O1, O2, O3, E, F, G, H>(
    mut f: F, mut g: G, mut h: H,
) -> impl FnMut(I) -> IResult<I, (O1, O2, O3), E>
where
    F: FnMut(I) -> IResult<I, O1, E>,
    G: FnMut(I) -> IResult<I, O2, E>,
    H: FnMut(I) -> IResult<I, O3, E>,
{
    move |input: I| {
        let (input, a) = f(input)?;
        let (input, b) = g(input)?;
        let (input, c) = h(input)?;
        Ok((input, (a, b, c)))
    }
}

/// `( ... )` literal string with nested-parenthesis balancing and backslash escapes.
pub fn literal_string(input: ParserInput) -> IResult<ParserInput, Token> {
    let (mut rest, _) = char('(')(input)?;
    let mut out = Vec::new();
    let mut depth: usize = 0;

    loop {
        let bytes = rest.fragment();
        let Some(&b) = bytes.first() else {
            return Err(nom::Err::Error(nom::error::Error::new(
                rest,
                nom::error::ErrorKind::Eof,
            )));
        };
        match b {
            b'(' => {
                depth += 1;
                if depth > MAX_STRING_NESTING {
                    return Err(nom::Err::Error(nom::error::Error::new(
                        rest,
                        nom::error::ErrorKind::TooLarge,
                    )));
                }
                out.push(b'(');
                rest = advance(rest, 1);
            }
            b')' => {
                if depth == 0 {
                    rest = advance(rest, 1);
                    break;
                }
                depth -= 1;
                out.push(b')');
                rest = advance(rest, 1);
            }
            b'\\' => {
                rest = advance(rest, 1);
                let next = rest.fragment().first().copied();
                match next {
                    Some(b'n') => {
                        out.push(b'\n');
                        rest = advance(rest, 1);
                    }
                    Some(b'r') => {
                        out.push(b'\r');
                        rest = advance(rest, 1);
                    }
                    Some(b't') => {
                        out.push(b'\t');
                        rest = advance(rest, 1);
                    }
                    Some(b'b') => {
                        out.push(0x08);
                        rest = advance(rest, 1);
                    }
                    Some(b'f') => {
                        out.push(0x0C);
                        rest = advance(rest, 1);
                    }
                    Some(b'(') => {
                        out.push(b'(');
                        rest = advance(rest, 1);
                    }
                    Some(b')') => {
                        out.push(b')');
                        rest = advance(rest, 1);
                    }
                    Some(b'\\') => {
                        out.push(b'\\');
                        rest = advance(rest, 1);
                    }
                    Some(b'\r') => {
                        rest = advance(rest, 1);
                        if rest.fragment().first() == Some(&b'\n') {
                            rest = advance(rest, 1);
                        }
                    }
                    Some(b'\n') => {
                        rest = advance(rest, 1);
                    }
                    Some(d) if (b'0'..=b'7').contains(&d) => {
                        let mut val: u32 = 0;
                        let mut n = 0;
                        while n < 3 {
                            match rest.fragment().first() {
                                Some(&dd) if (b'0'..=b'7').contains(&dd) => {
                                    val = val * 8 + (dd - b'0') as u32;
                                    rest = advance(rest, 1);
                                    n += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((val & 0xFF) as u8);
                    }
                    Some(other) => {
                        out.push(other);
                        rest = advance(rest, 1);
                    }
                    None => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            rest,
                            nom::error::ErrorKind::Eof,
                        )));
                    }
                }
            }
            other => {
                out.push(other);
                rest = advance(rest, 1);
            }
        }
    }

    Ok((rest, Token::String(out)))
}

fn advance<'a>(input: ParserInput<'a>, n: usize) -> ParserInput<'a> {
    let extra = *input.extra();
    let bytes = &input.fragment()[n..];
    // Re-deriving a LocatedSpan mid-stream would reset line/column tracking; instead
    // we reuse `nom`'s own slicing, which keeps the position bookkeeping intact.
    input.slice(n.., extra, bytes)
}

/// Tiny helper trait used only by [`advance`] to slice a `LocatedSpan` while keeping
/// its line/column bookkeeping intact (nom_locate has no public "advance by n" API).
trait SliceExt<'a> {
    fn slice(&self, range: std::ops::RangeFrom<usize>, extra: &'static str, _bytes: &'a [u8]) -> ParserInput<'a>;
    fn extra(&self) -> &&'static str;
}

impl<'a> SliceExt<'a> for ParserInput<'a> {
    fn slice(&self, range: std::ops::RangeFrom<usize>, _extra: &'static str, _bytes: &'a [u8]) -> ParserInput<'a> {
        use nom::Slice;
        nom::Slice::slice(self, range)
    }
    fn extra(&self) -> &&'static str {
        LocatedSpan::extra(self)
    }
}

/// `< ... >` hex string. Whitespace is skipped; odd length is padded with a trailing
/// `0` nibble.
pub fn hex_string(input: ParserInput) -> IResult<ParserInput, Token> {
    let (rest, _) = char('<')(input)?;
    let (rest, digits) = take_while(|b: u8| b.is_ascii_hexdigit() || is_pdf_whitespace(b))(rest)?;
    let (rest, _) = char('>')(rest)?;
    let hex: Vec<u8> = digits.fragment().iter().copied().filter(u8::is_ascii_hexdigit).collect();
    let mut bytes = Vec::with_capacity(hex.len().div_ceil(2));
    let mut iter = hex.chunks(2);
    for chunk in &mut iter {
        let hi = hex_val(chunk[0]);
        let lo = if chunk.len() == 2 { hex_val(chunk[1]) } else { 0 };
        bytes.push((hi << 4) | lo);
    }
    Ok((rest, Token::HexString(bytes)))
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

/// `/Name` with `#HH` escapes. A bare `/` is the empty name.
pub fn name(input: ParserInput) -> IResult<ParserInput, Token> {
    let (rest, _) = char('/')(input)?;
    let (rest, raw) = take_while(is_regular)(rest)?;
    let mut out = Vec::with_capacity(raw.fragment().len());
    let bytes = raw.fragment();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' && i + 2 < bytes.len() && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit()
        {
            out.push((hex_val(bytes[i + 1]) << 4) | hex_val(bytes[i + 2]));
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok((rest, Token::Name(out)))
}

/// A bare run of regular characters: `true`, `false`, `null`, or a structural /
/// content-stream keyword.
pub fn keyword_or_literal(input: ParserInput) -> IResult<ParserInput, Token> {
    let (rest, word) = recognize(take_while1(is_regular))(input)?;
    let tok = match *word.fragment() {
        b"true" => Token::Boolean(true),
        b"false" => Token::Boolean(false),
        b"null" => Token::Null,
        w => Token::Keyword(w.to_vec()),
    };
    Ok((rest, tok))
}

pub fn array_start(input: ParserInput) -> IResult<ParserInput, Token> {
    value(Token::ArrayStart, char('['))(input)
}
pub fn array_end(input: ParserInput) -> IResult<ParserInput, Token> {
    value(Token::ArrayEnd, char(']'))(input)
}
pub fn dict_start(input: ParserInput) -> IResult<ParserInput, Token> {
    value(Token::DictStart, tag("<<"))(input)
}
pub fn dict_end(input: ParserInput) -> IResult<ParserInput, Token> {
    value(Token::DictEnd, tag(">>"))(input)
}

/// Reads the next token, skipping leading whitespace/comments. `Token::Eof` is
/// returned (never an error) once the input is exhausted, so callers can `loop`.
pub fn next_token(input: ParserInput) -> IResult<ParserInput, Token> {
    let (input, _) = ws0(input)?;
    if input.fragment().is_empty() {
        return Ok((input, Token::Eof));
    }
    alt((
        dict_start,
        dict_end,
        hex_string,
        array_start,
        array_end,
        name,
        literal_string,
        number,
        keyword_or_literal,
    ))(input)
}
