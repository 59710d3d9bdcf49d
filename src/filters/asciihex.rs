use crate::error::FilterError;
use crate::Result;

/// `ASCIIHexDecode`: whitespace-tolerant, terminates at `>`; odd trailing nibble is
/// padded with a trailing `0` (spec.md §4.D).
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let end = data.iter().position(|&b| b == b'>').unwrap_or(data.len());
    let hex: Vec<u8> = data[..end]
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if !hex.iter().all(u8::is_ascii_hexdigit) {
        return Err(FilterError::InvalidData.into());
    }
    let mut out = Vec::with_capacity(hex.len().div_ceil(2));
    for chunk in hex.chunks(2) {
        let hi = hex_val(chunk[0]);
        let lo = if chunk.len() == 2 { hex_val(chunk[1]) } else { 0 };
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}
