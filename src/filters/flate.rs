use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{FilterError, LimitError};
use crate::Result;

/// Size of each read chunk while draining the decoder; bounds how far a
/// decompression bomb can inflate past `max_output` before the running-total
/// check aborts it (spec.md §5).
const CHUNK: usize = 64 * 1024;

pub fn decode(data: &[u8], max_output: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len().min(max_output) * 2);
    let mut buf = [0u8; CHUNK];
    loop {
        let n = decoder.read(&mut buf).map_err(|_| FilterError::InvalidData)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        if out.len() > max_output {
            return Err(LimitError::DecompressedSize.into());
        }
    }
    Ok(out)
}
