use std::io::BufRead;

use avp_schema::Schema;
use avp_wire::{BinaryCursor, ByteSource, ReaderSource, SliceSource};
use log::{debug, trace};

use crate::config::ParserConfig;
use crate::context::{ContextKind, Emitted, Frame, Step};
use crate::error::DecodeError;
use crate::scratch::Scratchpad;
use crate::token::{OwnedToken, ScalarValue, Token, TokenKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Session {
    Open,
    Closed,
    Failed,
}

/// Pull parser that turns schema-described binary data into tokens.
///
/// The parser walks the schema tree and the byte source in lock-step. It
/// keeps an explicit stack of read contexts (frames); each pull asks the
/// top frame for its next step until one of them produces a token:
///
/// ```text
///           next_token()
///                │
///                ▼
///   ┌──────── top frame ◀──────────────┐
///   │            │                     │
///   │   Emit     │ Descend(schema)     │ Exhausted
///   ▼            ▼                     │
/// token     push frame ─────────▶ pop frame, ask parent
///                                  (empty stack → end of stream)
/// ```
///
/// Only one value's worth of state is ever held: the frame stack, plus one
/// reusable buffer for string and bytes payloads. Payloads handed out in
/// [`Token`] and [`ScalarValue`] borrow that buffer, so the borrow checker
/// guarantees they are gone before the next pull overwrites it.
///
/// # Example
///
/// ```rust
/// use avp_parser::{Token, TokenParser};
/// use avp_schema::{Field, Schema};
///
/// let schema = Schema::record(
///     "Person",
///     [
///         Field::new("name", Schema::String),
///         Field::new("scores", Schema::array(Schema::Int)),
///     ],
/// );
/// // name = "Al", scores = [1, 2]
/// let bytes = [0x04, b'A', b'l', 0x04, 0x02, 0x04, 0x00];
///
/// let mut parser = TokenParser::from_slice(&schema, &bytes);
/// assert_eq!(parser.next_token().unwrap(), Some(Token::StartObject));
/// assert_eq!(parser.next_token().unwrap(), Some(Token::FieldName("name")));
/// assert_eq!(parser.next_token().unwrap(), Some(Token::String("Al")));
/// ```
pub struct TokenParser<'s, S> {
    cursor: BinaryCursor<S>,
    stack: Vec<Frame<'s>>,
    scratch: Scratchpad,
    /// Most recent token; also the validity tag for the scratch value.
    current: Option<Emitted<'s>>,
    config: ParserConfig,
    session: Session,
}

impl<'s, 'a> TokenParser<'s, SliceSource<'a>> {
    /// Parse an in-memory buffer.
    #[must_use]
    pub fn from_slice(schema: &'s Schema, data: &'a [u8]) -> Self {
        Self::new(schema, SliceSource::new(data))
    }

    /// Parse `data[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::InvalidWindow`] when the window does not fit in `data`.
    pub fn from_slice_range(
        schema: &'s Schema,
        data: &'a [u8],
        offset: usize,
        len: usize,
    ) -> Result<Self, DecodeError> {
        let source = SliceSource::window(data, offset, len).ok_or(DecodeError::InvalidWindow {
            offset,
            len,
            available: data.len(),
        })?;
        Ok(Self::new(schema, source))
    }
}

impl<'s, R: BufRead> TokenParser<'s, ReaderSource<R>> {
    /// Parse from a buffered reader, pulling bytes only as tokens are
    /// requested.
    pub fn from_reader(schema: &'s Schema, reader: R) -> Self {
        Self::new(schema, ReaderSource::new(reader))
    }
}

impl<'s, S: ByteSource> TokenParser<'s, S> {
    pub fn new(schema: &'s Schema, source: S) -> Self {
        Self::with_config(schema, source, ParserConfig::default())
    }

    pub fn with_config(schema: &'s Schema, source: S, config: ParserConfig) -> Self {
        debug!(
            "opening token session for {} schema ({:?} root)",
            schema.kind_name(),
            config.root_mode
        );
        let mut stack = Vec::with_capacity(16);
        stack.push(Frame::root(schema, config.root_mode));
        Self {
            cursor: BinaryCursor::with_limit(source, config.max_bytes_len),
            stack,
            scratch: Scratchpad::default(),
            current: None,
            config,
            session: Session::Open,
        }
    }

    /// Pull the next token, or `None` once the input is exhausted.
    ///
    /// Pulling after the end keeps returning `None` without touching the
    /// byte source.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]. Errors are terminal: later pulls return
    /// [`DecodeError::Aborted`].
    pub fn next_token(&mut self) -> Result<Option<Token<'_>>, DecodeError> {
        self.current = None;
        match self.session {
            Session::Closed => return Ok(None),
            Session::Failed => return Err(DecodeError::Aborted),
            Session::Open => {}
        }

        match self.advance() {
            Ok(Some(emitted)) => {
                self.current = Some(emitted);
                Ok(Some(self.token(emitted)))
            }
            Ok(None) => {
                debug!("token stream closed at offset {}", self.cursor.position());
                self.session = Session::Closed;
                Ok(None)
            }
            Err(e) => {
                debug!("token stream failed: {e}");
                self.session = Session::Failed;
                Err(e)
            }
        }
    }

    /// Ask frames for steps until one produces a token or the stack empties.
    fn advance(&mut self) -> Result<Option<Emitted<'s>>, DecodeError> {
        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(None);
            };
            match top.next(&mut self.cursor, &mut self.scratch, self.config.max_block_items)? {
                Step::Emit(emitted) => return Ok(Some(emitted)),
                Step::Descend(schema) => self.push(schema)?,
                Step::Exhausted => {
                    if let Some(frame) = self.stack.pop() {
                        trace!("pop {} frame", frame.kind());
                    }
                }
            }
        }
    }

    fn push(&mut self, schema: &'s Schema) -> Result<(), DecodeError> {
        if self.depth() >= self.config.max_depth {
            return Err(DecodeError::DepthLimitExceeded {
                limit: self.config.max_depth,
                offset: self.cursor.position(),
                context: self.stack.last().map_or(ContextKind::Root, Frame::kind),
            });
        }
        let frame = Frame::for_schema(schema);
        trace!("push {} frame for {}", frame.kind(), schema.kind_name());
        self.stack.push(frame);
        Ok(())
    }

    fn token(&self, emitted: Emitted<'s>) -> Token<'_> {
        match emitted {
            Emitted::StartObject => Token::StartObject,
            Emitted::EndObject => Token::EndObject,
            Emitted::StartArray => Token::StartArray,
            Emitted::EndArray => Token::EndArray,
            Emitted::Field(name) => Token::FieldName(name),
            Emitted::Key => Token::FieldName(self.scratch.text()),
            Emitted::Null => Token::Null,
            Emitted::Bool(v) => Token::Bool(v),
            Emitted::Int(v) => Token::Int(v),
            Emitted::Long(v) => Token::Long(v),
            Emitted::Float(v) => Token::Float(v),
            Emitted::Double(v) => Token::Double(v),
            Emitted::Text => Token::String(self.scratch.text()),
            Emitted::Symbol(symbol) => Token::String(symbol),
            Emitted::Bytes => Token::Bytes(self.scratch.bytes()),
        }
    }

    /// Kind of the token returned by the last pull.
    ///
    /// `None` before the first pull, after the end of the stream, and after
    /// an error.
    #[must_use]
    pub fn current_token(&self) -> Option<TokenKind> {
        self.current.map(|emitted| self.token(emitted).kind())
    }

    /// The scalar decoded by the last pull, tagged with its representation.
    ///
    /// A map key counts as a string value. Structural tokens, field names
    /// of records, booleans, and nulls leave no cached value.
    #[must_use]
    pub fn current_value(&self) -> Option<ScalarValue<'_>> {
        match self.current? {
            Emitted::Int(v) => Some(ScalarValue::Int(v)),
            Emitted::Long(v) => Some(ScalarValue::Long(v)),
            Emitted::Float(v) => Some(ScalarValue::Float(v)),
            Emitted::Double(v) => Some(ScalarValue::Double(v)),
            Emitted::Key | Emitted::Text => Some(ScalarValue::Str(self.scratch.text())),
            Emitted::Symbol(symbol) => Some(ScalarValue::Str(symbol)),
            Emitted::Bytes => Some(ScalarValue::Bytes(self.scratch.bytes())),
            Emitted::StartObject
            | Emitted::EndObject
            | Emitted::StartArray
            | Emitted::EndArray
            | Emitted::Field(_)
            | Emitted::Null
            | Emitted::Bool(_) => None,
        }
    }

    /// Skip the rest of the object or array just opened.
    ///
    /// When the last token was `StartObject` or `StartArray`, pulls tokens
    /// until the matching end token, which becomes the current token. Any
    /// other position is left untouched. The skipped bytes still have to be
    /// decoded, since the encoding records no sizes the reader can trust.
    ///
    /// # Errors
    ///
    /// Any error raised while pulling the skipped tokens.
    pub fn skip_children(&mut self) -> Result<(), DecodeError> {
        if !self.current_token().is_some_and(TokenKind::is_start) {
            return Ok(());
        }
        let mut open = 1usize;
        while open > 0 {
            let Some(token) = self.next_token()? else {
                return Ok(());
            };
            let kind = token.kind();
            if kind.is_start() {
                open += 1;
            } else if kind.is_end() {
                open -= 1;
            }
        }
        Ok(())
    }

    /// Frames open below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Bytes consumed from the source so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Whether the end of the stream has been reached.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session == Session::Closed
    }

    /// Consume the parser into an iterator of owned tokens.
    ///
    /// The iterator yields at most one error and then stops.
    #[must_use]
    pub fn into_owned_tokens(self) -> OwnedTokens<'s, S> {
        OwnedTokens {
            parser: self,
            done: false,
        }
    }
}

/// Iterator over [`OwnedToken`]s, see [`TokenParser::into_owned_tokens`].
pub struct OwnedTokens<'s, S> {
    parser: TokenParser<'s, S>,
    done: bool,
}

impl<S: ByteSource> Iterator for OwnedTokens<'_, S> {
    type Item = Result<OwnedToken, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .parser
            .next_token()
            .map(|token| token.map(OwnedToken::from))
            .transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}
