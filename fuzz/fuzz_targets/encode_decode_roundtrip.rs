#![no_main]

use arbitrary::Arbitrary;
use avp_parser::TokenParser;
use avp_schema::{Field, Schema};
use avp_tests::{datum_to_json, tokens_to_json, write_datum, BlockLayout, Datum};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzEntry {
    key: String,
    value: Option<Vec<u8>>,
}

#[derive(Debug, Arbitrary)]
struct FuzzRecord {
    name: String,
    count: i32,
    total: i64,
    ratio: f64,
    flag: bool,
    kind_id: u8,
    tags: Vec<String>,
    entries: Vec<FuzzEntry>,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    records: Vec<FuzzRecord>,
    max_items: u8,
    sized: bool,
}

fn schema() -> Schema {
    Schema::record(
        "Record",
        [
            Field::new("name", Schema::String),
            Field::new("count", Schema::Int),
            Field::new("total", Schema::Long),
            Field::new("ratio", Schema::Double),
            Field::new("flag", Schema::Boolean),
            Field::new("kind", Schema::enumeration("Kind", ["A", "B", "C"])),
            Field::new("tags", Schema::array(Schema::String)),
            Field::new("entries", Schema::map(Schema::optional(Schema::Bytes))),
        ],
    )
}

fn to_datum(record: FuzzRecord) -> Datum {
    Datum::Record(vec![
        Datum::String(record.name),
        Datum::Int(record.count),
        Datum::Long(record.total),
        Datum::Double(record.ratio),
        Datum::Boolean(record.flag),
        Datum::Enum(usize::from(record.kind_id % 3)),
        Datum::Array(record.tags.into_iter().map(Datum::String).collect()),
        Datum::Map(
            record
                .entries
                .into_iter()
                .map(|e| {
                    let value = match e.value {
                        Some(bytes) => Datum::union(1, Datum::Bytes(bytes)),
                        None => Datum::union(0, Datum::Null),
                    };
                    (e.key, value)
                })
                .collect(),
        ),
    ])
}

// Fuzz target: encode->decode roundtrip through the token stream.
//
// Builds a sequence of arbitrary records, writes them with an arbitrary
// block layout, pulls every token back, and asserts the rebuilt values
// match what was written. Map keys may repeat, so only the last value
// per key survives on both sides.
fuzz_target!(|input: FuzzInput| {
    let schema = schema();
    let layout = BlockLayout {
        max_items: usize::from(input.max_items),
        sized: input.sized,
    };

    let mut bytes = Vec::new();
    let mut expected = Vec::new();
    for record in input.records {
        let datum = to_datum(record);
        write_datum(&schema, &datum, layout, &mut bytes).unwrap();
        expected.push(datum_to_json(&schema, &datum).unwrap());
    }

    let tokens = TokenParser::from_slice(&schema, &bytes)
        .into_owned_tokens()
        .collect::<Result<Vec<_>, _>>()
        .expect("encoder output must decode");
    let rebuilt = tokens_to_json(&tokens).expect("token stream must be balanced");
    assert_eq!(rebuilt, expected);
});
