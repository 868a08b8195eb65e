//! Rison is a compact, URL-safe notation for JSON-like data:
//! `(name:rison,tags:!(url,'data format'),ok:!t)`.
//!
//! This crate parses rison into a [`Value`], renders values back to text and
//! bridges both directions to any type implementing serde's `Serialize` or
//! `Deserialize`.
//!
//! ```
//! #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
//! struct Query {
//!     page: u32,
//!     tags: Vec<String>,
//! }
//!
//! let query: Query = rison::from_str("(page:2,tags:!(a,b))").unwrap();
//! assert_eq!(query, Query { page: 2, tags: vec!["a".into(), "b".into()] });
//!
//! let text = rison::to_string_with_mode(&query, rison::Mode::Object).unwrap();
//! assert_eq!(text, "page:2,tags:!(a,b)");
//! ```

pub mod de;
pub mod error;
pub mod parse;
pub mod path;
pub mod render;
pub mod ser;
pub mod value;

mod read;

pub use de::{from_slice, from_str, from_str_with_mode, from_value, Decoder};
pub use error::{Category, Error, Result};
pub use parse::{parse, parse_with_mode};
pub use path::Path;
pub use render::render;
pub use ser::{to_string, to_string_with_mode, to_value, Encoder};
pub use value::{Map, Number, Value};

/// Key under which a supertype's fields are nested by default.
pub const SUPER_KEY: &str = "super";

/// How the outermost container is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Every container keeps its punctuation.
    #[default]
    Standard,
    /// O-rison: a root object is written without its parentheses, for use
    /// where the context already implies an object, such as after `?` in a
    /// URL.
    Object,
    /// A-rison: a root array is written as a bare comma separated list.
    Array,
}
