//! JSON views of written data and of token streams.
//!
//! Both sides render the same way, so a round trip is a plain equality:
//! unions disappear into their branch, enums become their symbol, and
//! bytes and fixed values become lower-case hex strings.

use avp_parser::OwnedToken;
use avp_schema::Schema;
use serde_json::{Map, Value};

use crate::encode::Datum;

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("token {index} ({token}) is not valid here")]
    Unexpected { index: usize, token: String },

    #[error("token stream ended inside a value")]
    Unterminated,

    #[error("datum does not match {expected} schema")]
    Mismatch { expected: &'static str },
}

/// The JSON view of `datum` under `schema`.
///
/// # Errors
///
/// [`JsonError::Mismatch`] when the datum does not fit the schema.
pub fn datum_to_json(schema: &Schema, datum: &Datum) -> Result<Value, JsonError> {
    let value = match (schema, datum) {
        (Schema::Null, Datum::Null) => Value::Null,
        (Schema::Boolean, Datum::Boolean(v)) => Value::Bool(*v),
        (Schema::Int, Datum::Int(v)) => Value::from(*v),
        (Schema::Long, Datum::Long(v)) => Value::from(*v),
        (Schema::Float, Datum::Float(v)) => Value::from(f64::from(*v)),
        (Schema::Double, Datum::Double(v)) => Value::from(*v),
        (Schema::String, Datum::String(s)) => Value::from(s.as_str()),
        (Schema::Bytes, Datum::Bytes(b)) | (Schema::Fixed { .. }, Datum::Fixed(b)) => {
            Value::from(hex::encode(b))
        }
        (Schema::Enum { symbols, .. }, Datum::Enum(i)) => symbols
            .get(*i)
            .map(|s| Value::from(s.as_str()))
            .ok_or(JsonError::Mismatch { expected: "enum" })?,
        (Schema::Record { fields, .. }, Datum::Record(values)) => {
            let mut object = Map::new();
            for (field, value) in fields.iter().zip(values) {
                object.insert(field.name.clone(), datum_to_json(&field.schema, value)?);
            }
            Value::Object(object)
        }
        (Schema::Array { items }, Datum::Array(values)) => Value::Array(
            values
                .iter()
                .map(|v| datum_to_json(items, v))
                .collect::<Result<_, _>>()?,
        ),
        (Schema::Map { values }, Datum::Map(entries)) => {
            let mut object = Map::new();
            for (key, value) in entries {
                object.insert(key.clone(), datum_to_json(values, value)?);
            }
            Value::Object(object)
        }
        (Schema::Union { branches }, Datum::Union(i, value)) => {
            let branch = branches
                .get(*i)
                .ok_or(JsonError::Mismatch { expected: "union" })?;
            datum_to_json(branch, value)?
        }
        (schema, _) => {
            return Err(JsonError::Mismatch {
                expected: schema.kind_name(),
            });
        }
    };
    Ok(value)
}

enum Open {
    Object(Map<String, Value>, Option<String>),
    Array(Vec<Value>),
}

/// Rebuild the root values a token stream describes.
///
/// # Errors
///
/// [`JsonError`] when the tokens are not balanced or a field name is
/// missing where an object expects one.
pub fn tokens_to_json<'t>(
    tokens: impl IntoIterator<Item = &'t OwnedToken>,
) -> Result<Vec<Value>, JsonError> {
    let mut roots = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    for (index, token) in tokens.into_iter().enumerate() {
        let unexpected = || JsonError::Unexpected {
            index,
            token: format!("{token:?}"),
        };
        let value = match token {
            OwnedToken::StartObject => {
                stack.push(Open::Object(Map::new(), None));
                continue;
            }
            OwnedToken::StartArray => {
                stack.push(Open::Array(Vec::new()));
                continue;
            }
            OwnedToken::FieldName(name) => match stack.last_mut() {
                Some(Open::Object(_, key @ None)) => {
                    *key = Some(name.clone());
                    continue;
                }
                _ => return Err(unexpected()),
            },
            OwnedToken::EndObject => match stack.pop() {
                Some(Open::Object(object, None)) => Value::Object(object),
                _ => return Err(unexpected()),
            },
            OwnedToken::EndArray => match stack.pop() {
                Some(Open::Array(items)) => Value::Array(items),
                _ => return Err(unexpected()),
            },
            OwnedToken::Null => Value::Null,
            OwnedToken::Bool(v) => Value::Bool(*v),
            OwnedToken::Int(v) => Value::from(*v),
            OwnedToken::Long(v) => Value::from(*v),
            OwnedToken::Float(v) => Value::from(f64::from(*v)),
            OwnedToken::Double(v) => Value::from(*v),
            OwnedToken::String(s) => Value::from(s.as_str()),
            OwnedToken::Bytes(b) => Value::from(hex::encode(b)),
        };

        match stack.last_mut() {
            None => roots.push(value),
            Some(Open::Array(items)) => items.push(value),
            Some(Open::Object(object, key)) => {
                let name = key.take().ok_or_else(unexpected)?;
                object.insert(name, value);
            }
        }
    }

    if stack.is_empty() {
        Ok(roots)
    } else {
        Err(JsonError::Unterminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rebuilds_nested_values() {
        let tokens = [
            OwnedToken::StartObject,
            OwnedToken::FieldName("a".into()),
            OwnedToken::StartArray,
            OwnedToken::Int(1),
            OwnedToken::Bytes(vec![0xff]),
            OwnedToken::EndArray,
            OwnedToken::FieldName("b".into()),
            OwnedToken::Null,
            OwnedToken::EndObject,
            OwnedToken::Long(7),
        ];
        assert_eq!(
            tokens_to_json(&tokens).unwrap(),
            [json!({"a": [1, "ff"], "b": null}), json!(7)]
        );
    }

    #[test]
    fn value_without_field_name_is_rejected() {
        let tokens = [OwnedToken::StartObject, OwnedToken::Int(1)];
        assert!(matches!(
            tokens_to_json(&tokens),
            Err(JsonError::Unexpected { index: 1, .. })
        ));
    }

    #[test]
    fn unterminated_stream() {
        assert!(matches!(
            tokens_to_json(&[OwnedToken::StartArray]),
            Err(JsonError::Unterminated)
        ));
    }
}
