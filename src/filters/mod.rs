//! Stream filter pipeline (spec.md §4.D).
//!
//! Each filter is a byte-to-byte transformer, parameterized by an optional
//! `/DecodeParms` dictionary; `decode_chain` folds a stream's `/Filter` array over
//! them left to right, matching the "naturally composable chain" design note
//! (spec.md §9). A missing `/Filter` is the identity transform.

mod ascii85;
mod asciihex;
mod flate;
mod lzw;
mod predictor;
mod runlength;

use crate::error::FilterError;
use crate::object::{Dictionary, Object, Stream};
use crate::Result;

/// Image codecs the core does not decode to pixels; filter input is returned
/// unchanged so callers can dispatch to an external codec (spec.md §4.D, §9).
const PASSTHROUGH_FILTERS: &[&[u8]] = &[b"DCTDecode", b"CCITTFaxDecode", b"JBIG2Decode", b"JPXDecode"];

/// Decodes `data` through the named filter, honoring `params` (the filter's
/// `/DecodeParms` entry, already resolved to a concrete dictionary by the caller).
/// `max_output` bounds decompressed size (spec.md §5 resource limits).
pub fn decode(name: &[u8], data: &[u8], params: Option<&Dictionary>, max_output: usize) -> Result<Vec<u8>> {
    if PASSTHROUGH_FILTERS.contains(&name) {
        return Ok(data.to_vec());
    }
    match name {
        b"FlateDecode" | b"Fl" => {
            let raw = flate::decode(data, max_output)?;
            predictor::apply(raw, params, max_output)
        }
        b"LZWDecode" | b"LZW" => {
            let raw = lzw::decode(data, params, max_output)?;
            predictor::apply(raw, params, max_output)
        }
        b"ASCIIHexDecode" | b"AHx" => asciihex::decode(data),
        b"ASCII85Decode" | b"A85" => ascii85::decode(data),
        b"RunLengthDecode" | b"RL" => runlength::decode(data),
        b"Crypt" => Ok(data.to_vec()),
        other => Err(FilterError::UnknownFilter(String::from_utf8_lossy(other).into_owned()).into()),
    }
}

/// Applies every filter named by `stream_dict`'s `/Filter` entry (Name or Array) in
/// order, pairing each with its corresponding `/DecodeParms` entry (spec.md §4.D).
pub fn decode_chain(
    filter_names: &[Vec<u8>], decode_parms: &[Option<Dictionary>], data: &[u8], max_output: usize,
) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for (i, name) in filter_names.iter().enumerate() {
        let params = decode_parms.get(i).and_then(|p| p.as_ref());
        current = decode(name, &current, params, max_output)?;
        if current.len() > max_output {
            return Err(crate::error::LimitError::DecompressedSize.into());
        }
    }
    Ok(current)
}

/// Runs a stream's own `/Filter` chain over its raw `content`, independent of
/// decryption (xref streams and object streams are never encrypted, and a
/// caller decrypting a regular stream does so before calling this).
pub fn decode_stream(stream: &Stream, max_output: usize) -> Result<Vec<u8>> {
    let names = stream.filter_names()?;
    let parms = decode_parms_for(stream.dict.get(b"DecodeParms").ok(), names.len());
    decode_chain(&names, &parms, &stream.content, max_output)
}

/// Splits a `/DecodeParms` object (absent, a single Dictionary, or an Array mirroring
/// `/Filter`) into one slot per filter.
pub fn decode_parms_for(obj: Option<&Object>, filter_count: usize) -> Vec<Option<Dictionary>> {
    match obj {
        None => vec![None; filter_count],
        Some(Object::Dictionary(d)) => {
            let mut v = vec![None; filter_count];
            if let Some(slot) = v.first_mut() {
                *slot = Some(d.clone());
            }
            v
        }
        Some(Object::Array(arr)) => (0..filter_count)
            .map(|i| arr.get(i).and_then(|o| o.as_dict().ok()).cloned())
            .collect(),
        Some(_) => vec![None; filter_count],
    }
}
