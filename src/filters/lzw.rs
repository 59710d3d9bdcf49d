use weezl::{decode::Decoder, LzwStatus, BitOrder};

use crate::error::{FilterError, LimitError};
use crate::object::Dictionary;
use crate::Result;

/// Output buffer drained each iteration of the decode loop; bounds how far a
/// decompression bomb can inflate past `max_output` before the running-total
/// check aborts it (spec.md §5), mirroring `flate::decode`'s chunked drain.
const CHUNK: usize = 64 * 1024;

/// PDF's `LZWDecode` defaults to `EarlyChange=1` (the code-width bumps one code
/// early, matching ordinary GIF/LZW streams). `EarlyChange=0` is the TIFF
/// convention, where `weezl`'s TIFF-size-switch mode is the equivalent.
pub fn decode(data: &[u8], params: Option<&Dictionary>, max_output: usize) -> Result<Vec<u8>> {
    let early_change = params
        .and_then(|p| p.get(b"EarlyChange").ok())
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(1);

    let mut decoder = if early_change == 0 {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };

    let mut output = Vec::with_capacity(data.len().min(max_output) * 3);
    let mut input = data;
    let mut buf = [0u8; CHUNK];
    loop {
        let result = decoder.decode(input, &mut buf);
        output.extend_from_slice(&buf[..result.consumed_out]);
        if output.len() > max_output {
            return Err(LimitError::DecompressedSize.into());
        }
        input = &input[result.consumed_in..];
        match result.status.map_err(|_| FilterError::InvalidData)? {
            LzwStatus::Done => break,
            LzwStatus::NoProgress => return Err(FilterError::InvalidData.into()),
            LzwStatus::Ok => continue,
        }
    }
    Ok(output)
}
