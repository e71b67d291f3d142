//! # qs_codec
//!
//! A query string codec with nesting, lists and charset handling, compatible with the
//! widely used `qs` wire format.
//!
//! ## What does it do?
//!
//! Plain `application/x-www-form-urlencoded` data is flat. `qs_codec` reads structure
//! out of the keys, so `a[b][0]=c` decodes to `{"a": {"b": ["c"]}}`, and writes any
//! nested [`Value`] back out the same way.
//!
//! ## Key Features
//!
//! - **Nested keys**: brackets and, optionally, dots describe paths into maps and lists
//! - **Four list formats**: indices, brackets, repeat and comma
//! - **Charsets**: UTF-8 and Latin-1, with the `utf8=✓` sentinel
//! - **Hard limits**: parameter count, list size and key depth are all bounded
//! - **Cycle detection**: shared values that contain themselves are reported, not looped on
//! - **Serde bridge**: typed structs in and out through [`to_string`] and [`from_str`]
//!
//! ## Quick Start
//!
//! ### Decoding
//!
//! ```rust
//! use qs_codec::{decode, DecodeOptions, Value};
//!
//! let map = decode("user[name]=Alice&user[tags][]=admin&user[tags][]=dev", &DecodeOptions::default()).unwrap();
//! assert_eq!(map["user"]["name"], Value::from("Alice"));
//! assert_eq!(map["user"]["tags"][1], Value::from("dev"));
//!
//! // Missing paths read as null; `get` tells absent from present.
//! assert!(map["user"]["email"].is_null());
//! assert_eq!(map.get("account"), None);
//! ```
//!
//! ### Encoding
//!
//! ```rust
//! use qs_codec::{encode, qs, EncodeOptions, ListFormat};
//!
//! let value = qs!({ "a": { "b": ["c", "d"] } });
//!
//! let options = EncodeOptions::new().with_encode(false);
//! assert_eq!(encode(&value, &options).unwrap(), "a[b][0]=c&a[b][1]=d");
//!
//! let options = options.with_list_format(ListFormat::Comma);
//! assert_eq!(encode(&value, &options).unwrap(), "a[b]=c,d");
//! ```
//!
//! ### Typed Data
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use qs_codec::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Filter {
//!     status: String,
//!     page: u32,
//!     ids: Vec<u32>,
//! }
//!
//! let filter = Filter { status: "open".to_string(), page: 2, ids: vec![4, 9] };
//! let query = to_string(&filter).unwrap();
//! assert_eq!(query, "status=open&page=2&ids%5B0%5D=4&ids%5B1%5D=9");
//!
//! let back: Filter = from_str(&query).unwrap();
//! assert_eq!(back, filter);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Untrusted input cannot exhaust the stack: key depth is capped, and the decode
//!   merge and compaction passes run on explicit work stacks
//! - Indexing a [`Value`] or [`QsMap`] never panics; missing entries read as null
//! - Options are never mutated by a call, so one value can be shared across threads
//!
//! ## Format Specification
//!
//! See the [`syntax`] module for the wire format.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Decoding and encoding with default options
//! - **`dynamic_values.rs`** - Working with [`Value`] trees and shared values
//! - **`custom_options.rs`** - List formats, dots, charsets, filters and limits
//!
//! Run any example with: `cargo run --example <name>`

pub mod de;
pub mod decode;
pub mod encode;
pub mod error;
pub mod keys;
pub mod macros;
pub mod map;
mod node;
pub mod options;
pub mod ser;
pub mod syntax;
pub mod utils;
pub mod value;

pub use de::{from_value, ValueDeserializer};
pub use decode::DecodeInput;
pub use error::{Error, LimitKind, Result};
pub use map::QsMap;
pub use options::{
    Charset, DateSerializer, DecodeOptions, Decoder, Delimiter, Duplicates, EncodeOptions,
    Encoder, Filter, Format, ListFormat, Sorter, TokenKind,
};
pub use ser::{to_value, ValueSerializer};
pub use value::{Number, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decodes a query string (or an already tokenized map) into a nested map.
///
/// # Examples
///
/// ```rust
/// use qs_codec::{decode, DecodeInput, DecodeOptions, Value};
///
/// let options = DecodeOptions::new().with_allow_dots(true);
/// let map = decode("a.b=c&d=1,2", &options).unwrap();
/// assert_eq!(map["a"]["b"], Value::from("c"));
/// assert_eq!(map["d"], Value::from("1,2"));
///
/// assert!(decode(DecodeInput::None, &options).unwrap().is_empty());
/// ```
///
/// # Errors
///
/// Returns an error for invalid options, for input that is neither a string nor a map,
/// and for limit or depth overflow when the strict options are set.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode<'a>(input: impl Into<DecodeInput<'a>>, options: &DecodeOptions) -> Result<QsMap> {
    decode::decode_input(input.into(), options)
}

/// Alias of [`decode`].
///
/// # Errors
///
/// Same as [`decode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn load<'a>(input: impl Into<DecodeInput<'a>>, options: &DecodeOptions) -> Result<QsMap> {
    decode(input, options)
}

/// Alias of [`decode`].
///
/// # Errors
///
/// Same as [`decode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn loads<'a>(input: impl Into<DecodeInput<'a>>, options: &DecodeOptions) -> Result<QsMap> {
    decode(input, options)
}

/// Encodes a value as a query string.
///
/// Maps and lists produce one token per leaf; a bare scalar or null produces `""`.
///
/// # Examples
///
/// ```rust
/// use qs_codec::{encode, qs, EncodeOptions};
///
/// let value = qs!({ "a": "b c", "d": null });
/// assert_eq!(encode(&value, &EncodeOptions::default()).unwrap(), "a=b%20c&d=");
/// ```
///
/// # Errors
///
/// Returns [`Error::CircularReference`] when a shared value contains itself.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<String> {
    encode::encode_value(value, options)
}

/// Alias of [`encode`].
///
/// # Errors
///
/// Same as [`encode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn dumps(value: &Value, options: &EncodeOptions) -> Result<String> {
    encode(value, options)
}

/// Serialize any `T: Serialize` to a query string with default options.
///
/// # Examples
///
/// ```rust
/// use qs_codec::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), "x=1&y=2");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized (e.g., unsupported types).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a query string with custom options.
///
/// # Examples
///
/// ```rust
/// use qs_codec::{to_string_with_options, EncodeOptions, ListFormat};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Tags { tags: Vec<&'static str> }
///
/// let options = EncodeOptions::new().with_list_format(ListFormat::Repeat);
/// let query = to_string_with_options(&Tags { tags: vec!["a", "b"] }, &options).unwrap();
/// assert_eq!(query, "tags=a&tags=b");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: &EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    encode(&to_value(value)?, options)
}

/// Deserialize a `T` from a query string with default options.
///
/// # Examples
///
/// ```rust
/// use qs_codec::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x=1&y=-2").unwrap();
/// assert_eq!(point, Point { x: 1, y: -2 });
/// ```
///
/// # Errors
///
/// Returns an error if decoding fails or the decoded map does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str_with_options(s, &DecodeOptions::default())
}

/// Deserialize a `T` from a query string with custom options.
///
/// # Errors
///
/// Returns an error if decoding fails or the decoded map does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<T>(s: &str, options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(Value::Map(decode(s, options)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
    }

    fn user() -> User {
        User {
            id: 123,
            name: "Alice Smith".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
        }
    }

    #[test]
    fn test_serialize_deserialize_point() {
        let point = Point { x: 1, y: 2 };
        let query = to_string(&point).unwrap();
        let point_back: Point = from_str(&query).unwrap();
        assert_eq!(point, point_back);
    }

    #[test]
    fn test_serialize_deserialize_user() {
        let query = to_string(&user()).unwrap();
        assert_eq!(
            query,
            "id=123&name=Alice%20Smith&active=true&tags%5B0%5D=admin&tags%5B1%5D=user"
        );
        let user_back: User = from_str(&query).unwrap();
        assert_eq!(user(), user_back);
    }

    #[test]
    fn test_custom_options_round_trip() {
        let encode_options = EncodeOptions::new()
            .with_list_format(ListFormat::Comma)
            .with_encode_values_only(true)
            .with_format(Format::Rfc1738)
            .with_delimiter(";");
        let query = to_string_with_options(&user(), &encode_options).unwrap();
        assert_eq!(query, "id=123;name=Alice+Smith;active=true;tags=admin,user");

        let decode_options = DecodeOptions::new().with_delimiter(";").with_comma(true);
        let user_back: User = from_str_with_options(&query, &decode_options).unwrap();
        assert_eq!(user(), user_back);
    }

    #[test]
    fn test_to_value() {
        let value = to_value(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(value["x"], Value::Number(Number::Integer(1)));
        assert_eq!(value["y"], Value::Number(Number::Integer(2)));
    }

    #[test]
    fn test_aliases_agree() {
        let options = DecodeOptions::default();
        assert_eq!(load("a=b", &options).unwrap(), decode("a=b", &options).unwrap());
        assert_eq!(loads("a=b", &options).unwrap(), decode("a=b", &options).unwrap());

        let value = crate::qs!({ "a": "b" });
        let options = EncodeOptions::default();
        assert_eq!(dumps(&value, &options).unwrap(), encode(&value, &options).unwrap());
    }
}
