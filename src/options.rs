//! Configuration for decoding and encoding.
//!
//! - [`DecodeOptions`]: how a query string is split, limited and folded into a map
//! - [`EncodeOptions`]: how a value tree is flattened into `key=value` tokens
//!
//! Both are plain structs with public fields, a `Default` matching the reference
//! library, and consuming `with_*` builders. Neither is mutated by a call, so one
//! options value can be shared freely.
//!
//! ## Examples
//!
//! ```rust
//! use qs_codec::{decode, encode, DecodeOptions, EncodeOptions, ListFormat, Value};
//!
//! let options = DecodeOptions::new().with_allow_dots(true).with_depth(10);
//! let map = decode("a.b.c=d", &options).unwrap();
//! assert_eq!(map["a"]["b"]["c"], Value::from("d"));
//!
//! let options = EncodeOptions::new()
//!     .with_list_format(ListFormat::Brackets)
//!     .with_encode(false);
//! let out = encode(&Value::Map(map), &options).unwrap();
//! assert_eq!(out, "a[b][c]=d");
//! ```

use crate::{Error, Result, Value};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Character set used for percent-encoding and decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1; characters above U+00FF travel as numeric entities (`&#9786;`).
    Latin1,
}

/// Space-encoding profile applied after percent-encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Format {
    /// Spaces stay `%20`.
    #[default]
    Rfc3986,
    /// Spaces become `+`, and `(`/`)` are left unescaped.
    Rfc1738,
}

/// How lists are written by the encoder.
///
/// # Examples
///
/// ```rust
/// use qs_codec::ListFormat;
///
/// assert_eq!(ListFormat::Indices.generate("a", "0"), "a[0]");
/// assert_eq!(ListFormat::Brackets.generate("a", "0"), "a[]");
/// assert_eq!(ListFormat::Repeat.generate("a", "0"), "a");
/// assert_eq!(ListFormat::Comma.generate("a", "0"), "a");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListFormat {
    /// `a[0]=x&a[1]=y`
    #[default]
    Indices,
    /// `a[]=x&a[]=y`
    Brackets,
    /// `a=x&a=y`
    Repeat,
    /// `a=x,y`
    Comma,
}

impl ListFormat {
    /// Builds the key path for one list element.
    #[must_use]
    pub fn generate(&self, prefix: &str, index: &str) -> String {
        match self {
            ListFormat::Indices => format!("{}[{}]", prefix, index),
            ListFormat::Brackets => format!("{}[]", prefix),
            ListFormat::Repeat | ListFormat::Comma => prefix.to_string(),
        }
    }
}

/// What to do when the same flat key appears more than once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Duplicates {
    /// Collect every occurrence into a list.
    #[default]
    Combine,
    /// Keep the first occurrence.
    First,
    /// Keep the last occurrence.
    Last,
}

/// Whether a scalar being decoded is a key or a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Key,
    Value,
}

/// Separator between `key=value` pairs.
///
/// Decoding accepts a literal string or a regular expression; encoding always joins
/// with the literal form (a pattern joins with `&`).
#[derive(Clone, Debug)]
pub enum Delimiter {
    Str(String),
    Pattern(Regex),
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Str("&".to_string())
    }
}

impl Delimiter {
    /// Splits `input`, keeping at most `limit` parts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qs_codec::Delimiter;
    /// use regex::Regex;
    ///
    /// let semi = Delimiter::from(";");
    /// assert_eq!(semi.split("a=1;b=2;c=3", Some(2)), vec!["a=1", "b=2"]);
    ///
    /// let either = Delimiter::from(Regex::new("[;,]").unwrap());
    /// assert_eq!(either.split("a=1;b=2,c=3", None), vec!["a=1", "b=2", "c=3"]);
    /// ```
    #[must_use]
    pub fn split<'a>(&self, input: &'a str, limit: Option<usize>) -> Vec<&'a str> {
        let limit = limit.unwrap_or(usize::MAX);
        match self {
            // An empty separator would split between every char; treat it as "no split".
            Delimiter::Str(sep) if sep.is_empty() => vec![input].into_iter().take(limit).collect(),
            Delimiter::Str(sep) => input.split(sep.as_str()).take(limit).collect(),
            Delimiter::Pattern(re) => re.split(input).take(limit).collect(),
        }
    }

    /// The text used to join tokens when encoding.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Delimiter::Str(sep) => sep,
            Delimiter::Pattern(_) => "&",
        }
    }
}

impl From<&str> for Delimiter {
    fn from(value: &str) -> Self {
        Delimiter::Str(value.to_string())
    }
}

impl From<Regex> for Delimiter {
    fn from(value: Regex) -> Self {
        Delimiter::Pattern(value)
    }
}

type DecodeFn = dyn Fn(&str, Charset, TokenKind) -> Value + Send + Sync;

/// A pluggable scalar decoder.
///
/// Receives each raw (still percent-encoded) key or value. Older single- and
/// two-argument styles are adapted once, at construction.
///
/// # Examples
///
/// ```rust
/// use qs_codec::{decode, DecodeOptions, Decoder, TokenKind, Value};
///
/// let decoder = Decoder::new(|raw, charset, kind| match kind {
///     TokenKind::Value if raw == "true" => Value::Bool(true),
///     _ => Value::String(qs_codec::utils::decode(raw, charset)),
/// });
/// let options = DecodeOptions::new().with_decoder(decoder);
/// let map = decode("a=true&b=x", &options).unwrap();
/// assert_eq!(map["a"], Value::Bool(true));
/// assert_eq!(map["b"], Value::from("x"));
/// ```
#[derive(Clone)]
pub struct Decoder(Arc<DecodeFn>);

impl Decoder {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, Charset, TokenKind) -> Value + Send + Sync + 'static,
    {
        Decoder(Arc::new(f))
    }

    /// Adapts a decoder that only looks at the raw text.
    pub fn from_legacy<F>(f: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        Decoder(Arc::new(move |raw, _, _| f(raw)))
    }

    /// Adapts a decoder that takes the raw text and the charset.
    pub fn with_charset<F>(f: F) -> Self
    where
        F: Fn(&str, Charset) -> Value + Send + Sync + 'static,
    {
        Decoder(Arc::new(move |raw, charset, _| f(raw, charset)))
    }

    pub fn decode(&self, raw: &str, charset: Charset, kind: TokenKind) -> Value {
        (self.0)(raw, charset, kind)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder(..)")
    }
}

type EncodeFn = dyn Fn(&Value, Charset, Format) -> String + Send + Sync;

/// A pluggable scalar encoder. Keys arrive as [`Value::String`].
#[derive(Clone)]
pub struct Encoder(Arc<EncodeFn>);

impl Encoder {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, Charset, Format) -> String + Send + Sync + 'static,
    {
        Encoder(Arc::new(f))
    }

    pub fn encode(&self, value: &Value, charset: Charset, format: Format) -> String {
        (self.0)(value, charset, format)
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Encoder(..)")
    }
}

type FilterFn = dyn Fn(&str, &Value) -> Option<Value> + Send + Sync;

/// Restricts or rewrites what the encoder visits.
///
/// `Function` is called with every key path (the root gets `""`) and may replace the
/// value or drop it by returning `None`. `Keys` is an allow-list of map keys and list
/// indices applied at every level, in the order given.
#[derive(Clone)]
pub enum Filter {
    Function(Arc<FilterFn>),
    Keys(Vec<String>),
}

impl Filter {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        Filter::Function(Arc::new(f))
    }

    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Keys(keys.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Function(_) => f.write_str("Filter::Function(..)"),
            Filter::Keys(keys) => f.debug_tuple("Filter::Keys").field(keys).finish(),
        }
    }
}

/// Comparator used to order keys when encoding.
#[derive(Clone)]
pub struct Sorter(Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>);

impl Sorter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        Sorter(Arc::new(f))
    }

    /// Plain lexicographic order.
    #[must_use]
    pub fn alphabetical() -> Self {
        Sorter::new(|a, b| a.cmp(b))
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sorter(..)")
    }
}

/// Renders [`Value::Date`] leaves before encoding.
#[derive(Clone)]
pub struct DateSerializer(Arc<dyn Fn(&DateTime<Utc>) -> String + Send + Sync>);

impl DateSerializer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> String + Send + Sync + 'static,
    {
        DateSerializer(Arc::new(f))
    }

    pub fn serialize(&self, date: &DateTime<Utc>) -> String {
        (self.0)(date)
    }
}

impl fmt::Debug for DateSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DateSerializer(..)")
    }
}

/// Options for [`decode`](crate::decode).
///
/// # Examples
///
/// ```rust
/// use qs_codec::{DecodeOptions, Duplicates};
///
/// let options = DecodeOptions::new()
///     .with_duplicates(Duplicates::Last)
///     .with_list_limit(100)
///     .with_ignore_query_prefix(true);
/// assert_eq!(options.depth, 5);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    pub delimiter: Delimiter,
    pub duplicates: Duplicates,
    /// Maximum bracket groups split out of one key; `0` disables splitting.
    pub depth: usize,
    /// Highest list index accepted before a list becomes an index-keyed map.
    pub list_limit: usize,
    /// Maximum number of pairs read; `None` means unlimited.
    pub parameter_limit: Option<usize>,
    /// Split `a.b` like `a[b]`. Unset means "same as `decode_dot_in_keys`".
    pub allow_dots: Option<bool>,
    /// Turn `%2E` inside key segments into `.`.
    pub decode_dot_in_keys: bool,
    pub allow_empty_lists: bool,
    /// `a` (no `=`) decodes to null instead of `""`.
    pub strict_null_handling: bool,
    /// Fail instead of folding keys deeper than `depth`.
    pub strict_depth: bool,
    pub ignore_query_prefix: bool,
    /// Turn `&#NNN;` into characters; Latin-1 only.
    pub interpret_numeric_entities: bool,
    pub charset: Charset,
    /// Honour a `utf8=` token announcing the charset.
    pub charset_sentinel: bool,
    /// Split values on `,` into lists.
    pub comma: bool,
    pub raise_on_limit_exceeded: bool,
    pub parse_lists: bool,
    /// Custom scalar decoder; `None` uses [`utils::decode`](crate::utils::decode).
    pub decoder: Option<Decoder>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            delimiter: Delimiter::default(),
            duplicates: Duplicates::default(),
            depth: 5,
            list_limit: 20,
            parameter_limit: Some(1000),
            allow_dots: None,
            decode_dot_in_keys: false,
            allow_empty_lists: false,
            strict_null_handling: false,
            strict_depth: false,
            ignore_query_prefix: false,
            interpret_numeric_entities: false,
            charset: Charset::default(),
            charset_sentinel: false,
            comma: false,
            raise_on_limit_exceeded: false,
            parse_lists: true,
            decoder: None,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective dot handling after defaulting from `decode_dot_in_keys`.
    #[must_use]
    pub fn allows_dots(&self) -> bool {
        self.allow_dots.unwrap_or(self.decode_dot_in_keys)
    }

    /// Checks the options for contradictions.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] when `decode_dot_in_keys` is on but
    /// `allow_dots` is explicitly off, or when `parameter_limit` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.decode_dot_in_keys && self.allow_dots == Some(false) {
            return Err(Error::invalid_configuration(
                "decode_dot_in_keys requires allow_dots to be true",
            ));
        }
        if self.parameter_limit == Some(0) {
            return Err(Error::invalid_configuration(
                "parameter_limit must be a positive number",
            ));
        }
        Ok(())
    }

    /// Decodes one scalar with the configured or default decoder.
    pub(crate) fn decode_scalar(&self, raw: &str, charset: Charset, kind: TokenKind) -> Value {
        match &self.decoder {
            Some(decoder) => decoder.decode(raw, charset, kind),
            None => Value::String(crate::utils::decode(raw, charset)),
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<Delimiter>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_duplicates(mut self, duplicates: Duplicates) -> Self {
        self.duplicates = duplicates;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Sets the maximum number of pairs; `None` for unlimited.
    #[must_use]
    pub fn with_parameter_limit(mut self, limit: impl Into<Option<usize>>) -> Self {
        self.parameter_limit = limit.into();
        self
    }

    #[must_use]
    pub fn with_allow_dots(mut self, allow_dots: bool) -> Self {
        self.allow_dots = Some(allow_dots);
        self
    }

    #[must_use]
    pub fn with_decode_dot_in_keys(mut self, decode_dot_in_keys: bool) -> Self {
        self.decode_dot_in_keys = decode_dot_in_keys;
        self
    }

    #[must_use]
    pub fn with_allow_empty_lists(mut self, allow_empty_lists: bool) -> Self {
        self.allow_empty_lists = allow_empty_lists;
        self
    }

    #[must_use]
    pub fn with_strict_null_handling(mut self, strict_null_handling: bool) -> Self {
        self.strict_null_handling = strict_null_handling;
        self
    }

    #[must_use]
    pub fn with_strict_depth(mut self, strict_depth: bool) -> Self {
        self.strict_depth = strict_depth;
        self
    }

    #[must_use]
    pub fn with_ignore_query_prefix(mut self, ignore_query_prefix: bool) -> Self {
        self.ignore_query_prefix = ignore_query_prefix;
        self
    }

    #[must_use]
    pub fn with_interpret_numeric_entities(mut self, interpret: bool) -> Self {
        self.interpret_numeric_entities = interpret;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    #[must_use]
    pub fn with_charset_sentinel(mut self, charset_sentinel: bool) -> Self {
        self.charset_sentinel = charset_sentinel;
        self
    }

    #[must_use]
    pub fn with_comma(mut self, comma: bool) -> Self {
        self.comma = comma;
        self
    }

    #[must_use]
    pub fn with_raise_on_limit_exceeded(mut self, raise: bool) -> Self {
        self.raise_on_limit_exceeded = raise;
        self
    }

    #[must_use]
    pub fn with_parse_lists(mut self, parse_lists: bool) -> Self {
        self.parse_lists = parse_lists;
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Some(decoder);
        self
    }
}

/// Options for [`encode`](crate::encode).
///
/// # Examples
///
/// ```rust
/// use qs_codec::{EncodeOptions, Format, ListFormat};
///
/// let options = EncodeOptions::new()
///     .with_list_format(ListFormat::Comma)
///     .with_format(Format::Rfc1738)
///     .with_add_query_prefix(true);
/// assert!(options.encode);
/// ```
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    pub delimiter: Delimiter,
    pub list_format: ListFormat,
    pub charset: Charset,
    pub format: Format,
    /// Percent-encode keys and values; `false` writes them verbatim.
    pub encode: bool,
    /// Custom scalar encoder; `None` uses [`utils::encode`](crate::utils::encode).
    pub encoder: Option<Encoder>,
    pub encode_values_only: bool,
    /// Write nested maps as `a.b` instead of `a[b]`. Unset means "same as
    /// `encode_dot_in_keys`".
    pub allow_dots: Option<bool>,
    /// Write literal dots inside keys as `%2E`.
    pub encode_dot_in_keys: bool,
    /// Write an empty list as `key[]` instead of dropping it.
    pub allow_empty_lists: bool,
    /// Write null as a bare `key` instead of `key=`.
    pub strict_null_handling: bool,
    pub skip_nulls: bool,
    pub add_query_prefix: bool,
    /// Prepend a `utf8=` token announcing the charset.
    pub charset_sentinel: bool,
    /// With [`ListFormat::Comma`], mark single-element lists with `[]`.
    pub comma_round_trip: Option<bool>,
    /// With [`ListFormat::Comma`], drop nulls before joining.
    pub comma_compact_nulls: bool,
    pub filter: Option<Filter>,
    pub sort: Option<Sorter>,
    /// Renders dates; `None` gives ISO-8601 with milliseconds.
    pub serialize_date: Option<DateSerializer>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            delimiter: Delimiter::default(),
            list_format: ListFormat::default(),
            charset: Charset::default(),
            format: Format::default(),
            encode: true,
            encoder: None,
            encode_values_only: false,
            allow_dots: None,
            encode_dot_in_keys: false,
            allow_empty_lists: false,
            strict_null_handling: false,
            skip_nulls: false,
            add_query_prefix: false,
            charset_sentinel: false,
            comma_round_trip: None,
            comma_compact_nulls: false,
            filter: None,
            sort: None,
            serialize_date: None,
        }
    }
}

impl EncodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective dot notation after defaulting from `encode_dot_in_keys`.
    #[must_use]
    pub fn allows_dots(&self) -> bool {
        self.allow_dots.unwrap_or(self.encode_dot_in_keys)
    }

    pub(crate) fn encode_scalar(&self, value: &Value) -> String {
        match &self.encoder {
            Some(encoder) => encoder.encode(value, self.charset, self.format),
            None => crate::utils::encode(value, self.charset, self.format),
        }
    }

    pub(crate) fn serialize_date(&self, date: &DateTime<Utc>) -> String {
        match &self.serialize_date {
            Some(serializer) => serializer.serialize(date),
            None => crate::value::iso_date(date),
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<Delimiter>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_list_format(mut self, list_format: ListFormat) -> Self {
        self.list_format = list_format;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_encode(mut self, encode: bool) -> Self {
        self.encode = encode;
        self
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    #[must_use]
    pub fn with_encode_values_only(mut self, encode_values_only: bool) -> Self {
        self.encode_values_only = encode_values_only;
        self
    }

    #[must_use]
    pub fn with_allow_dots(mut self, allow_dots: bool) -> Self {
        self.allow_dots = Some(allow_dots);
        self
    }

    #[must_use]
    pub fn with_encode_dot_in_keys(mut self, encode_dot_in_keys: bool) -> Self {
        self.encode_dot_in_keys = encode_dot_in_keys;
        self
    }

    #[must_use]
    pub fn with_allow_empty_lists(mut self, allow_empty_lists: bool) -> Self {
        self.allow_empty_lists = allow_empty_lists;
        self
    }

    #[must_use]
    pub fn with_strict_null_handling(mut self, strict_null_handling: bool) -> Self {
        self.strict_null_handling = strict_null_handling;
        self
    }

    #[must_use]
    pub fn with_skip_nulls(mut self, skip_nulls: bool) -> Self {
        self.skip_nulls = skip_nulls;
        self
    }

    #[must_use]
    pub fn with_add_query_prefix(mut self, add_query_prefix: bool) -> Self {
        self.add_query_prefix = add_query_prefix;
        self
    }

    #[must_use]
    pub fn with_charset_sentinel(mut self, charset_sentinel: bool) -> Self {
        self.charset_sentinel = charset_sentinel;
        self
    }

    #[must_use]
    pub fn with_comma_round_trip(mut self, comma_round_trip: bool) -> Self {
        self.comma_round_trip = Some(comma_round_trip);
        self
    }

    #[must_use]
    pub fn with_comma_compact_nulls(mut self, comma_compact_nulls: bool) -> Self {
        self.comma_compact_nulls = comma_compact_nulls;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Sorter) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn with_serialize_date(mut self, serialize_date: DateSerializer) -> Self {
        self.serialize_date = Some(serialize_date);
        self
    }
}
