/// One unit of the token stream.
///
/// String and byte payloads borrow from the parser's reusable decode
/// buffer (or from the schema, for field names and enum symbols), so a
/// token cannot outlive the next pull. Convert to [`OwnedToken`] to keep
/// one around.
///
/// ```text
///   record Person { string name; array<int> scores }
///
///   StartObject
///   FieldName("name")    String("Al")
///   FieldName("scores")  StartArray Int(1) Int(2) EndArray
///   EndObject
/// ```
///
/// Maps surface as objects: every key arrives as a `FieldName`. Enum values
/// arrive as `String` holding the symbol; fixed values as `Bytes`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token<'a> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(&'a str),
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(&'a str),
    Bytes(&'a [u8]),
}

/// Payload-free discriminant of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    Null,
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
}

impl Token<'_> {
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::StartObject => TokenKind::StartObject,
            Self::EndObject => TokenKind::EndObject,
            Self::StartArray => TokenKind::StartArray,
            Self::EndArray => TokenKind::EndArray,
            Self::FieldName(_) => TokenKind::FieldName,
            Self::Null => TokenKind::Null,
            Self::Bool(_) => TokenKind::Bool,
            Self::Int(_) => TokenKind::Int,
            Self::Long(_) => TokenKind::Long,
            Self::Float(_) => TokenKind::Float,
            Self::Double(_) => TokenKind::Double,
            Self::String(_) => TokenKind::String,
            Self::Bytes(_) => TokenKind::Bytes,
        }
    }
}

impl TokenKind {
    /// Whether the token opens a nested sequence.
    #[must_use]
    pub fn is_start(self) -> bool {
        matches!(self, Self::StartObject | Self::StartArray)
    }

    /// Whether the token closes a nested sequence.
    #[must_use]
    pub fn is_end(self) -> bool {
        matches!(self, Self::EndObject | Self::EndArray)
    }

    /// Whether the token carries a value rather than structure.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !self.is_start() && !self.is_end() && self != Self::FieldName
    }
}

/// A [`Token`] with owned payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum OwnedToken {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl From<Token<'_>> for OwnedToken {
    fn from(token: Token<'_>) -> Self {
        match token {
            Token::StartObject => Self::StartObject,
            Token::EndObject => Self::EndObject,
            Token::StartArray => Self::StartArray,
            Token::EndArray => Self::EndArray,
            Token::FieldName(name) => Self::FieldName(name.to_string()),
            Token::Null => Self::Null,
            Token::Bool(v) => Self::Bool(v),
            Token::Int(v) => Self::Int(v),
            Token::Long(v) => Self::Long(v),
            Token::Float(v) => Self::Float(v),
            Token::Double(v) => Self::Double(v),
            Token::String(s) => Self::String(s.to_string()),
            Token::Bytes(b) => Self::Bytes(b.to_vec()),
        }
    }
}

/// The most recently decoded scalar, tagged with its representation.
///
/// Obtained from [`TokenParser::current_value`](crate::TokenParser::current_value).
/// Booleans and nulls carry no cached value; structural tokens clear it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarValue<'a> {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
}

impl ScalarValue<'_> {
    /// Integer value, widening `Int` to 64 bits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(i64::from(v)),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Floating-point value, widening `Float` to 64 bits.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(f64::from(v)),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classification() {
        assert!(TokenKind::StartArray.is_start());
        assert!(TokenKind::EndObject.is_end());
        assert!(!TokenKind::FieldName.is_scalar());
        assert!(TokenKind::Null.is_scalar());
        assert!(TokenKind::Bytes.is_scalar());
    }

    #[test]
    fn owned_copies_payloads() {
        let text = String::from("Al");
        let owned = OwnedToken::from(Token::String(&text));
        drop(text);
        assert_eq!(owned, OwnedToken::String("Al".to_string()));
        assert_eq!(
            OwnedToken::from(Token::Bytes(&[1, 2])),
            OwnedToken::Bytes(vec![1, 2])
        );
    }

    #[test]
    fn scalar_widening() {
        assert_eq!(ScalarValue::Int(-3).as_i64(), Some(-3));
        assert_eq!(ScalarValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(ScalarValue::Str("x").as_i64(), None);
        assert_eq!(ScalarValue::Bytes(b"ab").as_bytes(), Some(&b"ab"[..]));
    }
}
