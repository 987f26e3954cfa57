//! Edge cases of the token stream that must hold for the parser to be safe
//! on untrusted input:
//!
//! - **Block encodings**: zero-count arrays, negative counts with byte-size
//!   prefixes, and malformed headers.
//! - **Truncation**: input ending anywhere inside a value is a
//!   `TruncatedInput` error, never a short value.
//! - **Limits**: depth and payload limits from `ParserConfig`.
//! - **Sources**: a streaming reader and a windowed slice produce exactly
//!   the tokens a plain slice does; reader failures surface as errors
//!   with the active context.

use std::io::{BufReader, Cursor, ErrorKind};

use avp_parser::{
    ContextKind, DecodeError, OwnedToken, ParserConfig, RootMode, Token, TokenParser,
};
use avp_schema::{Field, Schema};
use avp_tests::{BlockLayout, Datum, FlakyReader, encode, write_datum};
use avp_wire::{SliceSource, WireError};

fn pull_all(schema: &Schema, bytes: &[u8]) -> Result<Vec<OwnedToken>, DecodeError> {
    TokenParser::from_slice(schema, bytes)
        .into_owned_tokens()
        .collect()
}

fn person() -> Schema {
    Schema::record(
        "Person",
        [
            Field::new("name", Schema::String),
            Field::new("scores", Schema::array(Schema::Int)),
        ],
    )
}

// ── Block encodings ──────────────────────────────────────────────────────────

#[test]
fn zero_count_is_empty_array() {
    let tokens = pull_all(&Schema::array(Schema::Int), &[0x00]).unwrap();
    assert_eq!(tokens, [OwnedToken::StartArray, OwnedToken::EndArray]);
}

#[test]
fn element_count_is_sum_of_blocks() {
    // blocks of 2, 1 (sized: -1 then byte size 1), 3, then 0
    let bytes = hex::decode("04020401020206080a0c00").unwrap();
    let tokens = pull_all(&Schema::array(Schema::Int), &bytes).unwrap();
    let ints: Vec<_> = tokens
        .iter()
        .filter_map(|t| match t {
            OwnedToken::Int(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(ints, [1, 2, 1, 4, 5, 6]);
}

#[test]
fn block_count_min_is_malformed() {
    let mut bytes = vec![0xff; 9];
    bytes.push(0x01); // zig-zag of i64::MIN
    let err = pull_all(&Schema::array(Schema::Int), &bytes).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MalformedBlockLength {
            count: i64::MIN,
            offset: 0,
            context: ContextKind::Array
        }
    ));
}

#[test]
fn negative_block_size_is_malformed() {
    // count -1, byte size -1
    let err = pull_all(&Schema::map(Schema::Int), &[0x01, 0x01]).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MalformedBlockLength {
            count: -1,
            context: ContextKind::Map,
            ..
        }
    ));
}

// ── Truncation ───────────────────────────────────────────────────────────────

#[test]
fn every_truncation_is_an_error() {
    let datum = Datum::Record(vec![
        Datum::string("Al"),
        Datum::Array(vec![Datum::Int(1), Datum::Int(300)]),
    ]);
    let schema = person();
    let bytes = encode(&schema, &datum).unwrap();

    for cut in 1..bytes.len() {
        let mut parser = TokenParser::from_slice(&schema, &bytes[..cut]);
        let err = loop {
            match parser.next_token() {
                Ok(Some(Token::String(s))) => assert_eq!(s, "Al", "partial string at cut {cut}"),
                Ok(Some(_)) => {}
                Ok(None) => panic!("cut at {cut} decoded cleanly"),
                Err(e) => break e,
            }
        };
        assert!(
            matches!(err, DecodeError::TruncatedInput { offset, .. } if offset == cut),
            "cut {cut}: {err}"
        );
    }
}

#[test]
fn truncated_varint_in_block_header() {
    let err = pull_all(&Schema::array(Schema::Int), &[0x80]).unwrap_err();
    assert_eq!(err.context(), Some(ContextKind::Array));
    assert_eq!(err.offset(), Some(1));
}

// ── Value validation ─────────────────────────────────────────────────────────

#[test]
fn int_overflow_is_reported_with_context() {
    // 2^31 as a zig-zag long
    let err = pull_all(&Schema::Int, &[0x80, 0x80, 0x80, 0x80, 0x10]).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Wire {
            source: WireError::IntOverflow { value: 2_147_483_648, offset: 0 },
            context: ContextKind::Scalar
        }
    ));
}

#[test]
fn invalid_utf8_in_map_key() {
    let err = pull_all(&Schema::map(Schema::Null), &[0x02, 0x02, 0xc3, 0x00]).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Wire {
            source: WireError::InvalidUtf8 { offset: 1 },
            context: ContextKind::Map
        }
    ));
}

#[test]
fn negative_enum_index() {
    let schema = Schema::enumeration("E", ["A"]);
    let err = pull_all(&schema, &[0x01]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidEnumIndex { index: -1, .. }));
}

#[test]
fn null_root_over_input_is_trailing_data() {
    let err = pull_all(&Schema::Null, &[0x00]).unwrap_err();
    assert!(matches!(err, DecodeError::TrailingData { offset: 0 }));
}

// ── Limits ───────────────────────────────────────────────────────────────────

#[test]
fn payload_limit() {
    let bytes = encode(&Schema::Bytes, &Datum::Bytes(vec![7; 64])).unwrap();
    let config = ParserConfig {
        max_bytes_len: 16,
        ..ParserConfig::default()
    };
    let mut parser = TokenParser::with_config(&Schema::Bytes, SliceSource::new(&bytes), config);
    assert!(matches!(
        parser.next_token(),
        Err(DecodeError::Wire {
            source: WireError::LengthLimitExceeded { length: 64, limit: 16, .. },
            ..
        })
    ));
}

#[test]
fn deep_nesting_hits_depth_limit() {
    let mut schema = Schema::Int;
    for _ in 0..40 {
        schema = Schema::array(schema);
    }
    // Every level opens one single-item block.
    let bytes = vec![0x02; 40];
    let config = ParserConfig {
        max_depth: 32,
        ..ParserConfig::default()
    };
    let mut parser = TokenParser::with_config(&schema, SliceSource::new(&bytes), config);
    let err = loop {
        match parser.next_token() {
            Ok(Some(_)) => {}
            Ok(None) => panic!("depth limit not enforced"),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, DecodeError::DepthLimitExceeded { limit: 32, .. }));
    assert_eq!(err.context(), Some(ContextKind::Array));
    assert_eq!(parser.depth(), 32);
}

#[test]
fn huge_block_of_nulls_is_rejected() {
    // One header byte run announcing i64::MAX zero-byte items.
    let bytes = hex::decode("feffffffffffffffff01").unwrap();
    let err = pull_all(&Schema::array(Schema::Null), &bytes).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::BlockLimitExceeded {
            count,
            limit: avp_parser::DEFAULT_MAX_BLOCK_ITEMS,
            offset: 0,
            context: ContextKind::Array
        } if count == i64::MAX as u64
    ));
}

#[test]
fn lowered_block_limit_still_accepts_small_blocks() {
    let datum = Datum::Array((0..10).map(|_| Datum::Null).collect());
    let schema = Schema::array(Schema::Null);
    let layout = BlockLayout {
        max_items: 4,
        sized: true,
    };
    let mut bytes = Vec::new();
    write_datum(&schema, &datum, layout, &mut bytes).unwrap();
    let config = ParserConfig {
        max_block_items: 4,
        ..ParserConfig::default()
    };
    let tokens: Vec<_> = TokenParser::with_config(&schema, SliceSource::new(&bytes), config)
        .into_owned_tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tokens.len(), 12);
}

#[test]
fn single_root_mode() {
    let config = ParserConfig {
        root_mode: RootMode::Single,
        ..ParserConfig::default()
    };
    let bytes = encode(&Schema::String, &Datum::string("ok")).unwrap();
    let tokens: Vec<_> = TokenParser::with_config(&Schema::String, SliceSource::new(&bytes), config)
        .into_owned_tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tokens, [OwnedToken::String("ok".into())]);
}

// ── Sources ──────────────────────────────────────────────────────────────────

#[test]
fn streaming_matches_slice() {
    let datum = Datum::Record(vec![
        Datum::string("a fairly long name that spans reader buffers"),
        Datum::Array((0..50).map(Datum::Int).collect()),
    ]);
    let mut bytes = Vec::new();
    for _ in 0..3 {
        bytes.extend_from_slice(&encode(&person(), &datum).unwrap());
    }

    let from_slice = pull_all(&person(), &bytes).unwrap();
    // A tiny buffer forces values to straddle refills.
    let reader = BufReader::with_capacity(3, Cursor::new(bytes.clone()));
    let from_reader: Vec<_> = TokenParser::from_reader(&person(), reader)
        .into_owned_tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(from_reader, from_slice);
}

#[test]
fn streaming_truncation_matches_slice() {
    let bytes = encode(&Schema::String, &Datum::string("hello")).unwrap();
    let cut = &bytes[..4];
    let slice_err = pull_all(&Schema::String, cut).unwrap_err();
    let reader_err = TokenParser::from_reader(&Schema::String, Cursor::new(cut.to_vec()))
        .into_owned_tokens()
        .find_map(Result::err)
        .unwrap();
    assert_eq!(slice_err.offset(), reader_err.offset());
    assert_eq!(slice_err.context(), reader_err.context());
}

#[test]
fn window_decodes_only_its_bytes() {
    let mut data = vec![0xff, 0xff];
    data.extend_from_slice(&encode(&Schema::Long, &Datum::Long(-3)).unwrap());
    data.extend_from_slice(&[0xff, 0xff]);

    let parser = TokenParser::from_slice_range(&Schema::Long, &data, 2, 1).unwrap();
    let tokens: Vec<_> = parser.into_owned_tokens().collect::<Result<_, _>>().unwrap();
    assert_eq!(tokens, [OwnedToken::Long(-3)]);
}

#[test]
fn window_offsets_are_relative() {
    let data = [0xff, 0x04, b'a'];
    let err = TokenParser::from_slice_range(&Schema::String, &data, 1, 2)
        .unwrap()
        .into_owned_tokens()
        .find_map(Result::err)
        .unwrap();
    assert!(matches!(err, DecodeError::TruncatedInput { offset: 2, .. }));
}

fn person_bytes() -> Vec<u8> {
    let datum = Datum::Record(vec![
        Datum::string("Al"),
        Datum::Array(vec![Datum::Int(1), Datum::Int(2)]),
    ]);
    encode(&person(), &datum).unwrap()
}

#[test]
fn interrupted_reads_are_retried() {
    let bytes = person_bytes();
    let expected = pull_all(&person(), &bytes).unwrap();
    // Interrupted three times in the middle of the name.
    let reader = FlakyReader::new(bytes, 2, ErrorKind::Interrupted, 3);
    let tokens: Vec<_> = TokenParser::from_reader(&person(), reader)
        .into_owned_tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tokens, expected);
}

#[test]
fn reader_failure_carries_context() {
    let schema = person();
    // Fails right before the first score.
    let reader = FlakyReader::broken(person_bytes(), 4, ErrorKind::BrokenPipe);
    let mut parser = TokenParser::from_reader(&schema, reader);

    let mut tokens = Vec::new();
    let err = loop {
        match parser.next_token() {
            Ok(Some(token)) => tokens.push(OwnedToken::from(token)),
            Ok(None) => panic!("reader failure not reported"),
            Err(e) => break e,
        }
    };
    assert_eq!(
        tokens,
        [
            OwnedToken::StartObject,
            OwnedToken::FieldName("name".into()),
            OwnedToken::String("Al".into()),
            OwnedToken::FieldName("scores".into()),
            OwnedToken::StartArray,
        ]
    );
    match &err {
        DecodeError::Wire {
            source: WireError::Io(io),
            context: ContextKind::Scalar,
        } => assert_eq!(io.kind(), ErrorKind::BrokenPipe),
        other => panic!("expected an I/O error in scalar context, got {other:?}"),
    }
    assert_eq!(err.context(), Some(ContextKind::Scalar));
    assert!(matches!(parser.next_token(), Err(DecodeError::Aborted)));
}
