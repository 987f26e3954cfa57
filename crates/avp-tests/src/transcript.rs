use std::fmt::Write;

use avp_parser::{Token, TokenParser};
use avp_schema::Schema;

/// Render the full token stream for `bytes`, one token per line.
///
/// Nested tokens are indented two spaces per level. A decode error ends
/// the transcript with an `error:` line.
pub fn transcript(schema: &Schema, bytes: &[u8]) -> String {
    let mut parser = TokenParser::from_slice(schema, bytes);
    let mut out = String::new();
    let mut depth = 0usize;

    loop {
        match parser.next_token() {
            Ok(Some(token)) => {
                let kind = token.kind();
                if kind.is_end() {
                    depth = depth.saturating_sub(1);
                }
                let _ = writeln!(out, "{:indent$}{}", "", render(token), indent = depth * 2);
                if kind.is_start() {
                    depth += 1;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = writeln!(out, "error: {e}");
                break;
            }
        }
    }
    out
}

fn render(token: Token<'_>) -> String {
    match token {
        Token::Bytes(b) => format!("Bytes({})", hex::encode(b)),
        other => format!("{other:?}"),
    }
}
