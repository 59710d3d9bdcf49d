//! Predictor post-processing for `FlateDecode`/`LZWDecode` (spec.md §4.C, §4.D).
//!
//! `/DecodeParms << /Predictor N /Columns C /Colors Co /BitsPerComponent B >>`.
//! Predictor 1 is "no predictor". 2 is TIFF prediction (horizontal differencing).
//! 10-15 are PNG predictors: each decoded row is prefixed with a filter-type byte
//! (None/Sub/Up/Average/Paeth) that is consumed and stripped as rows are produced.

use crate::error::FilterError;
use crate::object::Dictionary;
use crate::Result;

pub fn apply(data: Vec<u8>, params: Option<&Dictionary>, max_output: usize) -> Result<Vec<u8>> {
    let Some(params) = params else { return Ok(data) };
    let predictor = params.get(b"Predictor").and_then(|o| o.as_i64()).unwrap_or(1);
    if predictor <= 1 {
        return Ok(data);
    }
    let columns = params.get(b"Columns").and_then(|o| o.as_i64()).unwrap_or(1).max(1) as usize;
    let colors = params.get(b"Colors").and_then(|o| o.as_i64()).unwrap_or(1).max(1) as usize;
    let bpc = params
        .get(b"BitsPerComponent")
        .and_then(|o| o.as_i64())
        .unwrap_or(8)
        .max(1) as usize;

    let bytes_per_pixel = (colors * bpc).div_ceil(8).max(1);
    let row_bytes = (colors * bpc * columns).div_ceil(8);
    if row_bytes == 0 || row_bytes > max_output {
        return Err(FilterError::PredictorMismatch.into());
    }

    if predictor == 2 {
        return tiff_predictor(data, row_bytes, bytes_per_pixel, bpc, columns, colors);
    }

    png_predictor(data, row_bytes, bytes_per_pixel)
}

fn tiff_predictor(
    mut data: Vec<u8>, row_bytes: usize, bytes_per_pixel: usize, bpc: usize, columns: usize, colors: usize,
) -> Result<Vec<u8>> {
    if bpc != 8 {
        // Sub-byte TIFF prediction is rare in practice; the core only implements the
        // common 8-bit-per-component case and otherwise leaves data untouched rather
        // than guessing.
        let _ = (columns, colors);
        return Ok(data);
    }
    for row in data.chunks_mut(row_bytes) {
        for i in bytes_per_pixel..row.len() {
            row[i] = row[i].wrapping_add(row[i - bytes_per_pixel]);
        }
    }
    Ok(data)
}

fn png_predictor(data: Vec<u8>, row_bytes: usize, bytes_per_pixel: usize) -> Result<Vec<u8>> {
    let stride = row_bytes + 1;
    if stride == 0 || data.len() % stride != 0 {
        // Tolerate a short final row (malformed producer) by processing whole rows only.
        if data.len() < stride {
            return Err(FilterError::PredictorMismatch.into());
        }
    }
    let row_count = data.len() / stride;
    let mut out = Vec::with_capacity(row_count * row_bytes);
    let mut prev_row = vec![0u8; row_bytes];

    for r in 0..row_count {
        let chunk = &data[r * stride..(r + 1) * stride];
        let filter_type = chunk[0];
        let mut row = chunk[1..].to_vec();

        for i in 0..row.len() {
            let a = if i >= bytes_per_pixel { row[i - bytes_per_pixel] } else { 0 };
            let b = prev_row[i];
            let c = if i >= bytes_per_pixel {
                prev_row[i - bytes_per_pixel]
            } else {
                0
            };
            row[i] = match filter_type {
                0 => row[i],
                1 => row[i].wrapping_add(a),
                2 => row[i].wrapping_add(b),
                3 => row[i].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(a, b, c)),
                _ => return Err(FilterError::PredictorMismatch.into()),
            };
        }

        out.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i32 + b as i32 - c as i32;
    let pa = (p - a as i32).abs();
    let pb = (p - b as i32).abs();
    let pc = (p - c as i32).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;

    fn params(predictor: i64, columns: i64, colors: i64, bpc: i64) -> Dictionary {
        let mut d = Dictionary::new();
        d.set("Predictor", Object::Integer(predictor));
        d.set("Columns", Object::Integer(columns));
        d.set("Colors", Object::Integer(colors));
        d.set("BitsPerComponent", Object::Integer(bpc));
        d
    }

    #[test]
    fn predictor_one_is_passthrough() {
        let data = vec![1, 2, 3, 4];
        let p = params(1, 4, 1, 8);
        assert_eq!(apply(data.clone(), Some(&p), 1 << 20).unwrap(), data);
    }

    #[test]
    fn no_params_is_passthrough() {
        let data = vec![9, 9, 9];
        assert_eq!(apply(data.clone(), None, 1 << 20).unwrap(), data);
    }

    #[test]
    fn png_none_filter_type_passes_row_through() {
        // One row of 3 columns, 1 color, 8 bpc: filter byte 0 (None) + 3 data bytes.
        let data = vec![0, 10, 20, 30];
        let p = params(15, 3, 1, 8);
        assert_eq!(apply(data, Some(&p), 1 << 20).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn png_sub_filter_accumulates_left_to_right() {
        // Filter type 1 (Sub), bytes_per_pixel = 1: out[i] = in[i] + out[i-1].
        let data = vec![1, 10, 5, 5];
        let p = params(15, 3, 1, 8);
        assert_eq!(apply(data, Some(&p), 1 << 20).unwrap(), vec![10, 15, 20]);
    }

    #[test]
    fn png_up_filter_uses_previous_row() {
        // Row 0: None [10,20,30]. Row 1: Up [1,1,1] -> [11,21,31].
        let mut data = vec![0, 10, 20, 30];
        data.extend_from_slice(&[2, 1, 1, 1]);
        let p = params(15, 3, 1, 8);
        assert_eq!(apply(data, Some(&p), 1 << 20).unwrap(), vec![10, 20, 30, 11, 21, 31]);
    }

    #[test]
    fn tiff_predictor_accumulates_per_pixel() {
        // 3 columns, 1 color, 8 bpc: bytes_per_pixel = 1.
        let data = vec![10, 5, 5];
        let p = params(2, 3, 1, 8);
        assert_eq!(apply(data, Some(&p), 1 << 20).unwrap(), vec![10, 15, 20]);
    }

    #[test]
    fn unknown_png_filter_type_is_predictor_mismatch() {
        let p = params(15, 3, 1, 8);
        assert!(apply(vec![5, 1, 2, 3], Some(&p), 1 << 20).is_err());
    }

    #[test]
    fn short_final_row_is_predictor_mismatch() {
        let p = params(15, 3, 1, 8);
        assert!(apply(vec![0, 1, 2], Some(&p), 1 << 20).is_err());
    }
}
