#![warn(clippy::pedantic)]

pub mod error;
pub mod schema;

pub use error::SchemaError;
pub use schema::{Field, Schema};
