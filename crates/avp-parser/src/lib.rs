#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod error;
pub mod parser;
pub mod token;

mod scratch;

pub use config::{DEFAULT_MAX_BLOCK_ITEMS, ParserConfig, RootMode};
pub use context::ContextKind;
pub use error::DecodeError;
pub use parser::{OwnedTokens, TokenParser};
pub use token::{OwnedToken, ScalarValue, Token, TokenKind};
