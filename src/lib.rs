//! A read-only PDF document reader: lexing, object parsing, cross-reference
//! resolution, stream filters, standard security handler decryption, and page-tree
//! navigation. Writing/mutating PDFs is out of scope (see `SPEC_FULL.md`'s
//! Non-goals) — this crate only ever opens and reads.
//!
//! The typical entry point is [`Document::open`] or [`Document::open_mem`], followed
//! by [`Document::page`] to walk the page tree and [`Page::contents_bytes`] to pull
//! decoded content-stream bytes.

pub mod cancel;
pub mod document;
pub mod encryption;
pub mod error;
pub mod filters;
pub mod fonts;
pub mod lexer;
pub mod limits;
pub mod object;
pub mod object_stream;
pub mod parser;
pub mod xref;

pub use cancel::{Cancel, Flag, Never};
pub use document::{Document, Page};
pub use error::{Error, Result};
pub use limits::Limits;
pub use object::{Dictionary, Object, ObjectId, PdfDate, Stream, StringFormat};
