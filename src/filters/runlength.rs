use crate::error::FilterError;
use crate::Result;

/// `RunLengthDecode`: a length byte `l` is followed by `l + 1` literal bytes when
/// `l < 128`, or a single byte repeated `257 - l` times when `l > 128`; `l == 128`
/// (EOD) terminates the stream (spec.md §4.D).
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0;
    while i < data.len() {
        let length = data[i];
        i += 1;
        if length == 128 {
            break;
        } else if length < 128 {
            let count = length as usize + 1;
            let end = i + count;
            if end > data.len() {
                return Err(FilterError::InvalidData.into());
            }
            out.extend_from_slice(&data[i..end]);
            i = end;
        } else {
            let Some(&byte) = data.get(i) else {
                return Err(FilterError::InvalidData.into());
            };
            let count = 257 - length as usize;
            out.extend(std::iter::repeat_n(byte, count));
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_run_copies_bytes_verbatim() {
        // length 4 -> 5 literal bytes follow.
        let mut data = vec![4];
        data.extend_from_slice(b"Hello");
        data.push(128);
        assert_eq!(decode(&data).unwrap(), b"Hello");
    }

    #[test]
    fn repeat_run_expands_single_byte() {
        // length 255 -> repeat next byte 257-255=2 times.
        let data = vec![255, b'x', 128];
        assert_eq!(decode(&data).unwrap(), b"xx");
    }

    #[test]
    fn eod_byte_stops_decoding_early() {
        let mut data = vec![2];
        data.extend_from_slice(b"abc");
        data.push(128);
        data.extend_from_slice(b"ignored");
        assert_eq!(decode(&data).unwrap(), b"abc");
    }

    #[test]
    fn truncated_literal_run_is_invalid_data() {
        assert!(decode(&[4, b'a', b'b']).is_err());
    }
}
