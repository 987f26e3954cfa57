#![no_main]

use std::io::{BufReader, Cursor};

use avp_parser::{OwnedToken, ParserConfig, TokenParser};
use avp_schema::{Field, Schema};
use avp_wire::SliceSource;
use libfuzzer_sys::fuzz_target;

// Fuzz target: full token pull over arbitrary bytes.
//
// The first byte selects one of a few schemas covering every shape, the
// rest is the encoded input. Each input is pulled twice, from a slice and
// from a 1-byte-buffered reader, and both runs must agree token for token
// and fail at the same offset. Catches bugs in:
// - Frame push/pop and depth accounting
// - Block headers, union branch and enum index checks
// - Scratch buffer reuse between strings and bytes
// - Root sequence and trailing data detection
fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let schema = schema_for(selector);
    let config = ParserConfig {
        max_bytes_len: 1 << 16,
        ..ParserConfig::default()
    };

    let from_slice = pull(TokenParser::with_config(
        &schema,
        SliceSource::new(input),
        config.clone(),
    ));
    let reader = avp_wire::ReaderSource::new(BufReader::with_capacity(1, Cursor::new(input)));
    let from_reader = pull(TokenParser::with_config(&schema, reader, config));

    // Debug output so that NaN payloads compare equal to themselves.
    assert_eq!(format!("{from_slice:?}"), format!("{from_reader:?}"));
});

type Outcome = (Vec<OwnedToken>, Option<Option<usize>>);

fn pull<S: avp_wire::ByteSource>(parser: TokenParser<'_, S>) -> Outcome {
    let mut tokens = Vec::new();
    for item in parser.into_owned_tokens() {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => return (tokens, Some(e.offset())),
        }
    }
    (tokens, None)
}

fn schema_for(selector: u8) -> Schema {
    match selector % 4 {
        0 => Schema::record(
            "Person",
            [
                Field::new("name", Schema::String),
                Field::new("scores", Schema::array(Schema::Int)),
            ],
        ),
        1 => Schema::map(Schema::optional(Schema::array(Schema::Bytes))),
        2 => Schema::record(
            "Mixed",
            [
                Field::new("kind", Schema::enumeration("Kind", ["A", "B", "C"])),
                Field::new("id", Schema::fixed("Id", 4)),
                Field::new("flag", Schema::Boolean),
                Field::new("ratio", Schema::Float),
                Field::new("total", Schema::Double),
                Field::new("seq", Schema::Long),
                Field::new("tag", Schema::optional(Schema::String)),
            ],
        ),
        _ => Schema::array(Schema::map(Schema::array(Schema::Boolean))),
    }
}
