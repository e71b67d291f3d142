//! Query string → nested map.
//!
//! Decoding runs in three passes:
//!
//! 1. **Tokenize**: split the input on the delimiter, decode each `key=value` pair and
//!    fold repeated keys according to [`Duplicates`].
//! 2. **Build**: split every flat key into segments and fold its value into a small
//!    nested fragment (`a[b][0]=x` becomes `{"a": {"b": ["x"]}}`).
//! 3. **Merge and compact**: deep-merge the fragments in key order, then drop unwritten
//!    list slots.

use crate::keys::split_key;
use crate::node::{compact, merge_into_map, Node, NodeMap};
use crate::utils::{interpret_numeric_entities, LATIN1_SENTINEL, UTF8_SENTINEL};
use crate::{Charset, DecodeOptions, Duplicates, Error, LimitKind, QsMap, Result, TokenKind, Value};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Anything [`decode`](crate::decode) accepts.
///
/// A string is tokenized as a query string. A map is taken as already tokenized: its
/// keys are still split into paths, but its values are used as given.
#[derive(Debug, Clone, Copy)]
pub enum DecodeInput<'a> {
    /// No input; decodes to an empty map.
    None,
    Str(&'a str),
    Map(&'a QsMap),
    /// Any other value. Maps and strings are unwrapped; null is empty; the rest is
    /// rejected.
    Value(&'a Value),
}

impl<'a> From<&'a str> for DecodeInput<'a> {
    fn from(value: &'a str) -> Self {
        DecodeInput::Str(value)
    }
}

impl<'a> From<&'a String> for DecodeInput<'a> {
    fn from(value: &'a String) -> Self {
        DecodeInput::Str(value)
    }
}

impl<'a> From<Option<&'a str>> for DecodeInput<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(DecodeInput::None, DecodeInput::Str)
    }
}

impl<'a> From<&'a QsMap> for DecodeInput<'a> {
    fn from(value: &'a QsMap) -> Self {
        DecodeInput::Map(value)
    }
}

impl<'a> From<&'a Value> for DecodeInput<'a> {
    fn from(value: &'a Value) -> Self {
        DecodeInput::Value(value)
    }
}

/// Call-local view of the options.
///
/// `parse_lists` may be switched off for one call when the input has more flat keys
/// than `list_limit`; the caller's options are never touched.
struct Context<'a> {
    options: &'a DecodeOptions,
    parse_lists: bool,
}

pub(crate) fn decode_input(input: DecodeInput<'_>, options: &DecodeOptions) -> Result<QsMap> {
    options.validate()?;

    match input {
        DecodeInput::None => Ok(QsMap::new()),
        DecodeInput::Str("") => Ok(QsMap::new()),
        DecodeInput::Str(text) => {
            debug!(len = text.len(), "decoding query string");
            let pairs = parse_pairs(text, options)?;
            build(pairs, options, true)
        }
        DecodeInput::Map(map) => {
            if map.is_empty() {
                return Ok(QsMap::new());
            }
            debug!(keys = map.len(), "decoding pre-tokenized map");
            let pairs = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            build(pairs, options, false)
        }
        DecodeInput::Value(Value::Null) => Ok(QsMap::new()),
        DecodeInput::Value(Value::String(text)) => decode_input(DecodeInput::Str(text), options),
        DecodeInput::Value(Value::Map(map)) => decode_input(DecodeInput::Map(map), options),
        DecodeInput::Value(Value::Shared(cell)) => {
            let inner = cell.borrow();
            decode_input(DecodeInput::Value(&*inner), options)
        }
        DecodeInput::Value(other) => Err(Error::invalid_input(&format!(
            "expected a string or a map, found {}",
            kind_name(other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Bytes(_) => "bytes",
        Value::Date(_) => "a date",
        Value::List(_) => "a list",
        Value::Map(_) => "a map",
        Value::Shared(_) => "a shared value",
    }
}

/// Folds every flat pair into the accumulator and compacts the result.
fn build(
    pairs: IndexMap<String, Value>,
    options: &DecodeOptions,
    values_parsed: bool,
) -> Result<QsMap> {
    let mut ctx = Context {
        options,
        parse_lists: options.parse_lists,
    };
    if ctx.parse_lists && options.list_limit > 0 && pairs.len() > options.list_limit {
        trace!(
            keys = pairs.len(),
            list_limit = options.list_limit,
            "too many keys, list parsing disabled for this call"
        );
        ctx.parse_lists = false;
    }

    let mut acc = NodeMap::new();
    for (key, value) in pairs {
        if key.is_empty() {
            continue;
        }
        let segments = split_key(
            &key,
            options.allows_dots(),
            options.depth,
            options.strict_depth,
        )?;
        let fragment = parse_object(&segments, value, &ctx, values_parsed)?;
        acc = match fragment {
            Node::Map(map) if acc.is_empty() => map,
            fragment => merge_into_map(acc, fragment, ctx.parse_lists),
        };
    }

    Ok(compact(acc))
}

/// Splits the raw string into decoded `key → value` pairs.
fn parse_pairs(text: &str, options: &DecodeOptions) -> Result<IndexMap<String, Value>> {
    let text = match text.strip_prefix('?') {
        Some(rest) if options.ignore_query_prefix => rest,
        _ => text,
    };
    let text = normalize_brackets(text);

    let mut parts = options
        .delimiter
        .split(&text, options.parameter_limit.map(|n| n.saturating_add(1)));
    if let Some(limit) = options.parameter_limit {
        if parts.len() > limit {
            if options.raise_on_limit_exceeded {
                return Err(Error::limit_exceeded(LimitKind::Parameter, limit));
            }
            trace!(limit, "parameter limit reached, dropping the rest");
            parts.truncate(limit);
        }
    }

    let mut charset = options.charset;
    let mut skip = None;
    if options.charset_sentinel {
        if let Some(i) = parts.iter().position(|p| p.starts_with("utf8=")) {
            match parts[i] {
                UTF8_SENTINEL => charset = Charset::Utf8,
                LATIN1_SENTINEL => charset = Charset::Latin1,
                _ => {}
            }
            trace!(?charset, "charset sentinel found");
            skip = Some(i);
        }
    }

    let mut pairs: IndexMap<String, Value> = IndexMap::new();
    for (i, part) in parts.iter().enumerate() {
        if skip == Some(i) {
            continue;
        }

        let pos = match part.find("]=") {
            Some(p) => Some(p + 1),
            None => part.find('='),
        };

        let (key, mut value) = match pos {
            None => {
                let key = options.decode_scalar(part, charset, TokenKind::Key);
                let value = if options.strict_null_handling {
                    Value::Null
                } else {
                    Value::String(String::new())
                };
                (key.to_string(), value)
            }
            Some(pos) => {
                let key = options
                    .decode_scalar(&part[..pos], charset, TokenKind::Key)
                    .to_string();
                let current = match pairs.get(&key) {
                    Some(Value::List(items)) => items.len(),
                    _ => 0,
                };
                let raw = parse_list_value(Value::from(&part[pos + 1..]), options, current)?;
                let value = match raw {
                    Value::List(items) => Value::List(
                        items
                            .iter()
                            .map(|item| options.decode_scalar(&item.to_string(), charset, TokenKind::Value))
                            .collect(),
                    ),
                    other => options.decode_scalar(&other.to_string(), charset, TokenKind::Value),
                };
                (key, value)
            }
        };

        if options.interpret_numeric_entities && charset == Charset::Latin1 && is_truthy(&value) {
            value = Value::String(interpret_numeric_entities(&value.to_string()));
        }

        if part.contains("[]=") && value.is_list() {
            value = Value::List(vec![value]);
        }

        match pairs.get_mut(&key) {
            Some(existing) => match options.duplicates {
                Duplicates::Combine => {
                    let previous = std::mem::take(existing);
                    *existing = combine(previous, value);
                }
                Duplicates::First => {}
                Duplicates::Last => *existing = value,
            },
            None => {
                pairs.insert(key, value);
            }
        }
    }

    Ok(pairs)
}

/// Turns percent-encoded brackets into literal ones so keys can be segmented.
fn normalize_brackets(text: &str) -> std::borrow::Cow<'_, str> {
    if !text.contains('%') {
        return std::borrow::Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find('%') {
        out.push_str(&rest[..i]);
        let escape = rest.get(i..i + 3);
        match escape {
            Some(e) if e.eq_ignore_ascii_case("%5B") => out.push('['),
            Some(e) if e.eq_ignore_ascii_case("%5D") => out.push(']'),
            _ => {
                out.push('%');
                rest = &rest[i + 1..];
                continue;
            }
        }
        rest = &rest[i + 3..];
    }
    out.push_str(rest);
    std::borrow::Cow::Owned(out)
}

/// Values the reference runtime treats as true in a boolean context.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            let f = n.as_f64();
            f != 0.0 && !f.is_nan()
        }
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Concatenates two values, flattening one level of list on each side.
fn combine(a: Value, b: Value) -> Value {
    let mut items = match a {
        Value::List(items) => items,
        other => vec![other],
    };
    match b {
        Value::List(more) => items.extend(more),
        other => items.push(other),
    }
    Value::List(items)
}

/// Comma splitting and the strict list-length check for one raw value.
fn parse_list_value(value: Value, options: &DecodeOptions, current_len: usize) -> Result<Value> {
    if options.comma {
        if let Value::String(text) = &value {
            if text.contains(',') {
                let items: Vec<Value> = text.split(',').map(Value::from).collect();
                if options.raise_on_limit_exceeded && items.len() > options.list_limit {
                    return Err(Error::limit_exceeded(LimitKind::List, options.list_limit));
                }
                return Ok(Value::List(items));
            }
        }
    }
    if options.raise_on_limit_exceeded && current_len >= options.list_limit {
        return Err(Error::limit_exceeded(LimitKind::List, options.list_limit));
    }
    Ok(value)
}

/// Builds the nested fragment for one key, innermost segment first.
fn parse_object(
    segments: &[String],
    value: Value,
    ctx: &Context<'_>,
    values_parsed: bool,
) -> Result<Node> {
    let options = ctx.options;

    let leaf = if values_parsed {
        value
    } else {
        let current = match segments.split_last() {
            Some((last, parents)) if last == "[]" => parents
                .concat()
                .parse::<usize>()
                .ok()
                .and_then(|i| value.as_list().and_then(|items| items.get(i)))
                .and_then(Value::as_list)
                .map_or(0, Vec::len),
            _ => 0,
        };
        parse_list_value(value, options, current)?
    };

    let mut leaf = Node::from_leaf(leaf);

    for segment in segments.iter().rev() {
        leaf = if segment == "[]" && ctx.parse_lists {
            let empty = match &leaf {
                Node::Scalar(Value::String(s)) => s.is_empty(),
                Node::Scalar(Value::Null) => options.strict_null_handling,
                _ => false,
            };
            if options.allow_empty_lists && empty {
                Node::List(Vec::new())
            } else {
                match leaf {
                    list @ Node::List(_) => list,
                    other => Node::List(vec![other]),
                }
            }
        } else {
            let (clean, bracketed) = match segment
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
            {
                Some(inner) => (inner, true),
                None => (segment.as_str(), false),
            };
            let clean = if options.decode_dot_in_keys && clean.contains('%') {
                clean.replace("%2E", ".").replace("%2e", ".")
            } else {
                clean.to_string()
            };

            if !ctx.parse_lists && clean.is_empty() {
                let mut map = NodeMap::new();
                map.insert("0".to_string(), leaf);
                Node::Map(map)
            } else {
                match list_index(&clean) {
                    Some(index) if bracketed && ctx.parse_lists && index <= options.list_limit => {
                        let mut items = Vec::with_capacity(index + 1);
                        items.resize_with(index, || Node::Undefined);
                        items.push(leaf);
                        Node::List(items)
                    }
                    _ => {
                        let mut map = NodeMap::new();
                        map.insert(clean, leaf);
                        Node::Map(map)
                    }
                }
            }
        };
    }

    Ok(leaf)
}

/// A canonical non-negative integer: digits only, no sign, no leading zeros.
fn list_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}
