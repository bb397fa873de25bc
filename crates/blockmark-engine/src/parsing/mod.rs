//! # Parsing
//!
//! Turns one markdown line into annotated tokens and correlates rendered and
//! raw offsets.
//!
//! - **`tokenizer`**: `pulldown-cmark` events -> [`TokenRecord`]s
//! - **`cursor`**: char-aware `Cursor` with absolute positions
//! - **`offsets`**: `begin` annotation and rendered/raw offset mapping

pub mod cursor;
pub mod offsets;
pub mod tokenizer;

pub use offsets::{MappingError, annotate, map_offset, unmap_offset};
pub use tokenizer::{TokenKind, TokenRecord, tokenize};
