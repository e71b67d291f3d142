//! Error types for query string encoding and decoding.
//!
//! Every failure aborts the whole call; there is no partially decoded map or
//! partially encoded string on error.
//!
//! ## Error Categories
//!
//! - **Invalid input**: `decode` was handed something that is neither a string nor a map
//! - **Limits**: parameter or list limits exceeded while `raise_on_limit_exceeded` is set
//! - **Depth**: key nesting deeper than `depth` while `strict_depth` is set
//! - **Configuration**: contradictory or out-of-range options
//! - **Cycles**: the encoder met a value that contains itself
//!
//! The non-strict defaults never produce limit or depth errors; they truncate or fold
//! the overflow into the result instead.
//!
//! ## Examples
//!
//! ```rust
//! use qs_codec::{decode, DecodeOptions, Error, LimitKind};
//!
//! let options = DecodeOptions::new()
//!     .with_parameter_limit(1)
//!     .with_raise_on_limit_exceeded(true);
//!
//! match decode("a=1&b=2", &options) {
//!     Err(Error::LimitExceeded { kind, limit }) => {
//!         assert_eq!(kind, LimitKind::Parameter);
//!         assert_eq!(limit, 1);
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Which configured limit was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Number of `key=value` pairs in the input.
    Parameter,
    /// Number of elements in a single list (index or comma-split length).
    List,
}

/// Represents all possible errors that can occur while encoding or decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// `decode` received a value that is neither a string nor a map.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A parameter or list limit was exceeded in strict mode.
    #[error("{}", limit_message(.kind, .limit))]
    LimitExceeded { kind: LimitKind, limit: usize },

    /// Key nesting exceeded the configured depth in strict mode.
    #[error("Input depth exceeded depth option of {depth} and strict_depth is true")]
    DepthExceeded { depth: usize },

    /// The options are contradictory or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The encoder found a value that (transitively) contains itself.
    #[error("Circular reference detected at key '{key}'")]
    CircularReference { key: String },

    /// A Rust type that has no query string representation.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error, mostly raised through the serde bridges.
    #[error("Error: {0}")]
    Custom(String),
}

fn limit_message(kind: &LimitKind, limit: &usize) -> String {
    let plural = if *limit == 1 { "" } else { "s" };
    match kind {
        LimitKind::Parameter => {
            format!("Parameter limit exceeded. Only {limit} parameter{plural} allowed.")
        }
        LimitKind::List => {
            format!("List limit exceeded. Only {limit} element{plural} allowed in a list.")
        }
    }
}

impl Error {
    /// Creates an invalid input error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qs_codec::Error;
    ///
    /// let err = Error::invalid_input("expected a string or a map");
    /// assert!(err.to_string().contains("expected a string"));
    /// ```
    pub fn invalid_input(msg: &str) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Creates a limit error for the given limit kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qs_codec::{Error, LimitKind};
    ///
    /// let err = Error::limit_exceeded(LimitKind::Parameter, 1);
    /// assert_eq!(err.to_string(), "Parameter limit exceeded. Only 1 parameter allowed.");
    /// ```
    pub fn limit_exceeded(kind: LimitKind, limit: usize) -> Self {
        Error::LimitExceeded { kind, limit }
    }

    /// Creates a depth error.
    pub fn depth_exceeded(depth: usize) -> Self {
        Error::DepthExceeded { depth }
    }

    /// Creates a configuration error.
    pub fn invalid_configuration(msg: &str) -> Self {
        Error::InvalidConfiguration(msg.to_string())
    }

    /// Creates a cycle error naming the key path where the cycle closed.
    pub fn circular_reference(key: &str) -> Self {
        Error::CircularReference {
            key: key.to_string(),
        }
    }

    /// Creates an unsupported type error for values the serde bridge cannot express.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qs_codec::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
