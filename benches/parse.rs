//! Benchmarks for the object-level parser (spec.md §4.B) and the object-stream
//! decoder (spec.md §4.G), independent of xref/document bookkeeping. Fixtures are
//! built in memory; see `benches/load.rs` for why no `assets/*.pdf` files are used.

use std::io::Write;

use criterion::{criterion_group, criterion_main, Criterion};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdfria_core::object_stream::ObjectStream;
use pdfria_core::parser;
use pdfria_core::{dictionary, Object, Stream};

const OBJECT_COUNT: usize = 500;

/// `OBJECT_COUNT` concatenated array literals, each holding a mix of primitive
/// kinds, exercising the lexer's number/string/name paths and the parser's
/// array-accumulation loop.
fn primitive_array_source() -> Vec<u8> {
    let mut out = String::new();
    for i in 0..OBJECT_COUNT {
        out.push_str(&format!(
            "[{i} {i}.5 (literal string {i}) <4865> /Name#20{i} true false null {i} 0 R] "
        ));
    }
    out.into_bytes()
}

/// `OBJECT_COUNT` concatenated `"N 0 obj <<...>> endobj"` bodies.
fn indirect_object_source() -> Vec<u8> {
    let mut out = String::new();
    for i in 0..OBJECT_COUNT {
        out.push_str(&format!("{i} 0 obj<</Type/TestObj/Value {i}>>endobj\n"));
    }
    out.into_bytes()
}

/// A Flate-compressed `/Type /ObjStm` stream packing `OBJECT_COUNT` dictionaries,
/// mirroring the teacher's `bench_object_stream_parse` fixture shape.
fn object_stream_fixture() -> Stream {
    let mut header = String::new();
    let mut body = String::new();
    for i in 0..OBJECT_COUNT {
        header.push_str(&format!("{i} {} ", body.len()));
        body.push_str(&format!("<</Type/TestObj/Value {i}>>"));
    }
    let first = header.len();
    let raw = format!("{header}{body}").into_bytes();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    let compressed = encoder.finish().unwrap();

    let dict = dictionary! {
        "Type" => Object::from("ObjStm"),
        "N" => Object::Integer(OBJECT_COUNT as i64),
        "First" => Object::Integer(first as i64),
        "Filter" => Object::from("FlateDecode"),
    };
    Stream::new(dict, compressed)
}

fn bench_parse_primitive_arrays(c: &mut Criterion) {
    let source = primitive_array_source();
    c.bench_function("parse_primitive_arrays", |b| {
        b.iter(|| {
            let mut input = pdfria_core::lexer::ParserInput::new_extra(source.as_slice(), "bench");
            let mut count = 0;
            while !input.fragment().is_empty() {
                let Ok((rest, _)) = parser::value(input) else { break };
                input = rest;
                count += 1;
            }
            assert_eq!(count, OBJECT_COUNT);
        })
    });
}

fn bench_parse_indirect_objects(c: &mut Criterion) {
    let source = indirect_object_source();
    c.bench_function("parse_indirect_objects", |b| {
        b.iter(|| {
            let mut offset = 0;
            let mut count = 0;
            while offset < source.len() {
                let Ok(((num, _gen), obj)) = parser::indirect_object(&source, offset, None, None) else { break };
                let Object::Dictionary(_) = obj else { break };
                offset = source[offset..].iter().position(|&b| b == b'\n').map(|p| offset + p + 1).unwrap_or(source.len());
                let _ = num;
                count += 1;
            }
            assert_eq!(count, OBJECT_COUNT);
        })
    });
}

fn bench_object_stream_decode(c: &mut Criterion) {
    let stream = object_stream_fixture();
    c.bench_function("object_stream_decode", |b| {
        b.iter(|| {
            let decoded = ObjectStream::parse(&stream, 64 * 1024 * 1024).unwrap();
            assert_eq!(decoded.len(), OBJECT_COUNT);
            for i in 0..decoded.len() {
                decoded.object_at(i).unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_parse_primitive_arrays, bench_parse_indirect_objects, bench_object_stream_decode);
criterion_main!(benches);
