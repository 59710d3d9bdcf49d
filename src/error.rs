//! Error taxonomy for the reader core (spec.md §7).

use std::fmt;

use crate::ObjectId;

/// Top-level error returned by every fallible public operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("cross-reference error: {0}")]
    Xref(#[from] XrefError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("reference cycle detected at object {0:?}")]
    ReferenceCycle(ObjectId),

    #[error("no xref entry for requested object")]
    MissingXrefEntry,

    #[error("offset {0} is outside the document buffer")]
    InvalidOffset(usize),

    #[error("invalid stream: {0}")]
    InvalidStream(String),

    #[error("numeric conversion failed: {0}")]
    NumericCast(String),

    #[error("object is not of the requested type")]
    TypeMismatch,

    #[error("dictionary key not found")]
    DictKeyNotFound,

    #[error("page index {index} out of range ({count} pages)")]
    OutOfRange { index: usize, count: usize },

    #[error("decryption failed: {0}")]
    Decryption(#[from] CryptoError),

    #[error("password did not authenticate this document")]
    InvalidPassword,

    #[error("operation cancelled")]
    Cancelled,

    #[error("limit exceeded: {0}")]
    Limit(#[from] LimitError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("file does not start with a %PDF- header")]
    InvalidFileHeader,
    #[error("unexpected token while parsing object")]
    UnexpectedToken,
    #[error("dictionary key is not a Name")]
    DictKeyNotName,
    #[error("dictionary key has no matching value")]
    DictMissingValue,
    #[error("stream keyword following a non-Dictionary object")]
    StreamOnNonDictionary,
    #[error("composite object was never closed")]
    UnterminatedComposite,
    #[error("string literal was never closed")]
    UnterminatedString,
    #[error("xref table or stream is malformed")]
    InvalidXref,
    #[error("object stream header is malformed")]
    InvalidObjectStream,
}

/// Unrecoverable document-structure malformation (spec.md §7 `FormatError`):
/// distinct from [`ParseError`], which covers token/object-level syntax that
/// can sometimes be tolerated mid-parse.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("trailer dictionary is malformed")]
    MalformedTrailer,
    #[error("trailer has no usable /Root entry")]
    MissingCatalog,
    #[error("catalog has no usable /Pages entry")]
    MissingPageTree,
    #[error("page tree node is malformed")]
    MalformedPageTree,
    #[error("object stream header or index is malformed")]
    InvalidObjectStream,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum XrefError {
    #[error("could not locate startxref")]
    Start,
    #[error("startxref offset of a /Prev section is invalid")]
    PrevStart,
    #[error("hybrid-reference /XRefStm offset is invalid")]
    StreamStart,
    #[error("xref stream is missing required /W, /Size or /Index entries")]
    StreamDict,
    #[error("trailer dictionary is missing or malformed")]
    Trailer,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter name {0:?}")]
    UnknownFilter(String),
    #[error("encoded data is malformed")]
    InvalidData,
    #[error("predictor parameters do not match the payload")]
    PredictorMismatch,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("ciphertext is shorter than one cipher block")]
    ShortInput,
    #[error("PKCS#7 padding is malformed")]
    BadPadding,
    #[error("unsupported encryption revision/version combination")]
    UnsupportedScheme,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitError {
    #[error("decompressed stream exceeds the configured maximum size")]
    DecompressedSize,
    #[error("reference resolution exceeded the configured maximum recursion depth")]
    RecursionDepth,
    #[error("page tree exceeded the configured maximum depth")]
    PageTreeDepth,
}

impl fmt::Display for ObjectIdDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.0 .0, self.0 .1)
    }
}

/// Thin wrapper so `ObjectId` gets a PDF-native `"n g R"` rendering in diagnostics.
pub struct ObjectIdDisplay(pub ObjectId);
