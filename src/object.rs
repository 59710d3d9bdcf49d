//! The PDF object model (spec.md §3).

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// `(object number, generation)`, naming one indirect object.
pub type ObjectId = (u32, u16);

/// A single PDF object, tagged by kind.
///
/// `IndirectObject` is intentionally absent from this enum: the envelope pairing an
/// `ObjectId` with its contents is produced transiently by the parser
/// (`parser::indirect_object`) and is never stored inside a container, per spec.md §3.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Byte string plus a flag recording whether it was written in literal `( )` or
    /// hexadecimal `< >` form. The flag affects only serialization, never equality
    /// semantics for the purposes of this crate (spec.md §3).
    String(Vec<u8>, StringFormat),
    Name(Vec<u8>),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Object {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            Object::Real(f) => Ok(*f as i64),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(f) => Ok(*f),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_name_bytes(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_array(&self) -> Result<&[Object]> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Parses a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`, with everything after the
    /// year optional) into its numeric components. Returns `None` if the string is not
    /// a PDF date literal. Writing dates back out is a mutation concern and is not
    /// provided here.
    pub fn as_datetime(&self) -> Option<PdfDate> {
        let bytes = self.as_str().ok()?;
        PdfDate::parse(bytes)
    }
}

/// The numeric components of a PDF date string, decoded but not reified into any
/// particular calendar-crate type so this core carries no date-crate dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// UTC offset in minutes, positive east of UTC. `None` means "unspecified".
    pub utc_offset_minutes: Option<i32>,
}

impl PdfDate {
    fn parse(bytes: &[u8]) -> Option<PdfDate> {
        let s = std::str::from_utf8(bytes).ok()?;
        let s = s.strip_prefix("D:").unwrap_or(s);
        let digits_prefix_len = s.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits_prefix_len < 4 {
            return None;
        }
        let take = |s: &str, n: usize| -> Option<(u32, &str)> {
            if s.len() < n || !s.as_bytes()[..n].iter().all(u8::is_ascii_digit) {
                return None;
            }
            let (head, tail) = s.split_at(n);
            Some((head.parse().ok()?, tail))
        };
        let (year, rest) = take(s, 4)?;
        let (month, rest) = take(rest, 2).unwrap_or((1, rest));
        let (day, rest) = take(rest, 2).unwrap_or((1, rest));
        let (hour, rest) = take(rest, 2).unwrap_or((0, rest));
        let (minute, rest) = take(rest, 2).unwrap_or((0, rest));
        let (second, rest) = take(rest, 2).unwrap_or((0, rest));

        let utc_offset_minutes = match rest.as_bytes().first() {
            Some(b'Z') => Some(0),
            Some(sign @ (b'+' | b'-')) => {
                let rest = &rest[1..];
                let (oh, rest) = take(rest, 2)?;
                let rest = rest.strip_prefix('\'').unwrap_or(rest);
                let (om, _) = take(rest, 2).unwrap_or((0, rest));
                let mag = (oh * 60 + om) as i32;
                Some(if *sign == b'-' { -mag } else { mag })
            }
            _ => None,
        };

        Some(PdfDate {
            year: year as i32,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
            utc_offset_minutes,
        })
    }
}

/// An ordered Name→Object map. Insertion order is preserved for deterministic
/// traversal; lookup by key is O(1) via the underlying `IndexMap`. Duplicate keys
/// during parsing resolve last-wins (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary(IndexMap::new())
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0.get(key).ok_or(Error::DictKeyNotFound)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<&mut Object> {
        self.0.get_mut(key).ok_or(Error::DictKeyNotFound)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Object)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Vec<u8>, &mut Object)> {
        self.0.iter_mut()
    }

    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name_bytes)
    }

    pub fn has_type(&self, name: &[u8]) -> bool {
        self.get_type().map(|t| t == name).unwrap_or(false)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<")?;
        for (k, v) in &self.0 {
            write!(f, " /{} {:?}", String::from_utf8_lossy(k), v)?;
        }
        write!(f, " >>")
    }
}

/// A Dictionary plus a raw byte payload. The payload is stored exactly as found in the
/// file; `Document::decode_stream` produces the filter-decoded bytes on demand so
/// intermediate buffers are never retained on the object itself (spec.md §4.F).
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    /// Raw, possibly encrypted, possibly filter-encoded bytes.
    pub content: Vec<u8>,
    /// Byte offset in the source buffer where `content` begins, if parsed from a file
    /// (used by the stream-length fallback scan; absent for synthetic streams).
    pub start_position: Option<usize>,
}

impl Stream {
    pub fn new(dict: Dictionary, content: Vec<u8>) -> Stream {
        let mut dict = dict;
        dict.set("Length", Object::Integer(content.len() as i64));
        Stream {
            dict,
            content,
            start_position: None,
        }
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    /// Names of the filters applied, in pipeline order. Empty means "identity".
    pub fn filter_names(&self) -> Result<Vec<Vec<u8>>> {
        match self.dict.get(b"Filter") {
            Ok(Object::Name(n)) => Ok(vec![n.clone()]),
            Ok(Object::Array(arr)) => arr.iter().map(|o| o.as_name_bytes().map(<[u8]>::to_vec)).collect(),
            Ok(_) => Err(Error::TypeMismatch),
            Err(_) => Ok(Vec::new()),
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Object {
        Object::Boolean(v)
    }
}
impl From<i64> for Object {
    fn from(v: i64) -> Object {
        Object::Integer(v)
    }
}
impl From<f64> for Object {
    fn from(v: f64) -> Object {
        Object::Real(v)
    }
}
impl From<Dictionary> for Object {
    fn from(v: Dictionary) -> Object {
        Object::Dictionary(v)
    }
}
impl From<Stream> for Object {
    fn from(v: Stream) -> Object {
        Object::Stream(v)
    }
}
impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Object {
        Object::Array(v)
    }
}
impl From<ObjectId> for Object {
    fn from(v: ObjectId) -> Object {
        Object::Reference(v)
    }
}
impl From<&str> for Object {
    fn from(v: &str) -> Object {
        Object::Name(v.as_bytes().to_vec())
    }
}

/// Builds a `Dictionary` from `"key" => value` pairs, mirroring the teacher's
/// `dictionary!` macro.
#[macro_export]
macro_rules! dictionary {
    () => { $crate::Dictionary::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::Dictionary::new();
        $(dict.set($key, $value);)+
        dict
    }};
}
