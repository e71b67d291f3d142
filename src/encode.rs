//! Nested value → query string.
//!
//! The encoder walks the tree depth first, carrying the key path built so far
//! (`a[b][0]`), and emits one `key=value` token per leaf. Lists are written with the
//! configured [`ListFormat`]; maps use brackets or, with `allow_dots`, dots.
//!
//! # Cycles
//!
//! An owned [`Value`] tree cannot contain itself. Only [`Value::Shared`] handles can
//! alias, so the walker keeps a chain of the shared allocations currently being
//! visited. Meeting one of those again on the way down is a cycle; meeting the same
//! handle in a sibling branch is ordinary sharing and is encoded twice.

use crate::utils::{apply_format, LATIN1_SENTINEL, UTF8_SENTINEL};
use crate::{Charset, EncodeOptions, Error, Filter, ListFormat, Result, Value};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// One shared allocation on the path from the root to the current value.
struct Frame<'a> {
    id: usize,
    parent: Option<&'a Frame<'a>>,
}

impl Frame<'_> {
    fn contains(mut chain: Option<&Frame<'_>>, id: usize) -> bool {
        while let Some(frame) = chain {
            if frame.id == id {
                return true;
            }
            chain = frame.parent;
        }
        false
    }
}

fn identity(cell: &Rc<RefCell<Value>>) -> usize {
    Rc::as_ptr(cell) as *const () as usize
}

pub(crate) fn encode_value(value: &Value, options: &EncodeOptions) -> Result<String> {
    let walker = Walker {
        options,
        comma_round_trip: options.list_format == ListFormat::Comma
            && options.comma_round_trip == Some(true),
    };

    let mut tokens = Vec::new();
    walker.root(value, &mut tokens)?;
    debug!(tokens = tokens.len(), "encoded query string");

    let joined = tokens.join(options.delimiter.as_str());
    if joined.is_empty() {
        return Ok(joined);
    }

    let mut out = String::with_capacity(joined.len() + 20);
    if options.add_query_prefix {
        out.push('?');
    }
    if options.charset_sentinel {
        out.push_str(match options.charset {
            Charset::Utf8 => UTF8_SENTINEL,
            Charset::Latin1 => LATIN1_SENTINEL,
        });
        out.push('&');
    }
    out.push_str(&joined);
    Ok(out)
}

struct Walker<'o> {
    options: &'o EncodeOptions,
    comma_round_trip: bool,
}

impl Walker<'_> {
    fn root(&self, value: &Value, out: &mut Vec<String>) -> Result<()> {
        let filtered;
        let value = match &self.options.filter {
            Some(Filter::Function(f)) => {
                filtered = match value {
                    Value::Shared(cell) => (**f)("", &*cell.borrow()),
                    other => (**f)("", other),
                };
                match &filtered {
                    Some(v) => v,
                    None => return Ok(()),
                }
            }
            _ => value,
        };
        self.root_entries(value, None, out)
    }

    /// Walks the top-level keys. Lists count as maps keyed `0`, `1`, …; anything else
    /// encodes to nothing.
    fn root_entries(
        &self,
        value: &Value,
        chain: Option<&Frame<'_>>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if let Value::Shared(cell) = value {
            let frame = Frame {
                id: identity(cell),
                parent: chain,
            };
            let inner = cell.borrow();
            return self.root_entries(&*inner, Some(&frame), out);
        }

        let mut keys: Vec<Cow<'_, str>> = match (&self.options.filter, value) {
            (Some(Filter::Keys(keys)), Value::Map(_) | Value::List(_)) => {
                keys.iter().map(|k| Cow::Borrowed(k.as_str())).collect()
            }
            (_, Value::Map(map)) => map.keys().map(|k| Cow::Borrowed(k.as_str())).collect(),
            (_, Value::List(items)) => (0..items.len()).map(|i| Cow::Owned(i.to_string())).collect(),
            _ => return Ok(()),
        };
        if let Some(sort) = &self.options.sort {
            keys.sort_by(|a, b| sort.compare(a, b));
        }

        for key in &keys {
            let child = lookup(value, key);
            if self.options.skip_nulls && matches!(child, Some(Value::Null)) {
                continue;
            }
            self.walk(child, key, self.options.encode, chain, out)?;
        }
        Ok(())
    }

    /// Emits the tokens for `value` under the key path `prefix`.
    ///
    /// `None` marks a key that does not exist, which differs from null: nothing is
    /// written for it.
    fn walk(
        &self,
        value: Option<&Value>,
        prefix: &str,
        encode: bool,
        chain: Option<&Frame<'_>>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(Value::Shared(cell)) = value {
            let id = identity(cell);
            if Frame::contains(chain, id) {
                return Err(Error::circular_reference(prefix));
            }
            let frame = Frame { id, parent: chain };
            let inner = cell.borrow();
            return self.walk(Some(&*inner), prefix, encode, Some(&frame), out);
        }

        match (&self.options.filter, value) {
            (Some(Filter::Function(f)), Some(v)) => {
                let replaced = (**f)(prefix, v);
                self.emit(replaced.as_ref(), prefix, encode, chain, out)
            }
            _ => self.emit(value, prefix, encode, chain, out),
        }
    }

    fn emit(
        &self,
        value: Option<&Value>,
        prefix: &str,
        encode: bool,
        chain: Option<&Frame<'_>>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let options = self.options;

        let Some(value) = value else {
            return Ok(());
        };

        if let Value::Shared(cell) = value {
            let id = identity(cell);
            if Frame::contains(chain, id) {
                return Err(Error::circular_reference(prefix));
            }
            let frame = Frame { id, parent: chain };
            let inner = cell.borrow();
            return self.emit(Some(&*inner), prefix, encode, Some(&frame), out);
        }

        let value: Cow<'_, Value> = match value {
            Value::Date(date) => Cow::Owned(Value::String(options.serialize_date(date))),
            Value::List(items)
                if options.list_format == ListFormat::Comma
                    && items.iter().any(|v| matches!(v, Value::Date(_))) =>
            {
                Cow::Owned(Value::List(
                    items
                        .iter()
                        .map(|v| match v {
                            Value::Date(date) => Value::String(options.serialize_date(date)),
                            other => other.clone(),
                        })
                        .collect(),
                ))
            }
            Value::Null if options.strict_null_handling => {
                let key = if encode && !options.encode_values_only {
                    options.encode_scalar(&Value::from(prefix))
                } else {
                    prefix.to_string()
                };
                out.push(key);
                return Ok(());
            }
            Value::Null => Cow::Owned(Value::String(String::new())),
            other => Cow::Borrowed(other),
        };

        if value.is_primitive() {
            if !(options.skip_nulls && value.as_str() == Some("")) {
                out.push(self.token(prefix, &value, encode));
            }
            return Ok(());
        }

        self.walk_children(&value, prefix, encode, chain, out)
    }

    fn token(&self, prefix: &str, value: &Value, encode: bool) -> String {
        let options = self.options;
        let (key, text) = if encode {
            let key = if options.encode_values_only {
                prefix.to_string()
            } else {
                options.encode_scalar(&Value::from(prefix))
            };
            (key, options.encode_scalar(value))
        } else {
            (prefix.to_string(), value.to_string())
        };
        format!(
            "{}={}",
            apply_format(&key, options.format),
            apply_format(&text, options.format)
        )
    }

    fn walk_children(
        &self,
        value: &Value,
        prefix: &str,
        encode: bool,
        chain: Option<&Frame<'_>>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let options = self.options;
        let list_len = value.as_list().map(Vec::len);

        let prefix: Cow<'_, str> = if options.encode_dot_in_keys && prefix.contains('.') {
            Cow::Owned(prefix.replace('.', "%2E"))
        } else {
            Cow::Borrowed(prefix)
        };
        let prefix = if self.comma_round_trip && list_len == Some(1) {
            Cow::Owned(format!("{}[]", prefix))
        } else {
            prefix
        };

        if options.allow_empty_lists && list_len == Some(0) {
            out.push(format!("{}[]", prefix));
            return Ok(());
        }

        if options.list_format == ListFormat::Comma && list_len.is_some() {
            let joined = self.join_comma(value, encode);
            let child_prefix = options.list_format.generate(&prefix, "0");
            let child_encode = encode && !options.encode_values_only;
            return self.walk(joined.as_ref(), &child_prefix, child_encode, chain, out);
        }

        let mut keys: Vec<Cow<'_, str>> = match (&options.filter, value) {
            (Some(Filter::Keys(keys)), _) => {
                keys.iter().map(|k| Cow::Borrowed(k.as_str())).collect()
            }
            (_, Value::Map(map)) => map.keys().map(|k| Cow::Borrowed(k.as_str())).collect(),
            (_, Value::List(items)) => (0..items.len()).map(|i| Cow::Owned(i.to_string())).collect(),
            _ => Vec::new(),
        };
        if let (Some(sort), None | Some(Filter::Function(_))) = (&options.sort, &options.filter) {
            keys.sort_by(|a, b| sort.compare(a, b));
        }

        let dots = options.allows_dots();
        for key in &keys {
            let child = lookup(value, key);
            if options.skip_nulls && matches!(child, Some(Value::Null)) {
                continue;
            }
            let key: Cow<'_, str> = if dots && options.encode_dot_in_keys {
                Cow::Owned(key.replace('.', "%2E"))
            } else {
                Cow::Borrowed(key.as_ref())
            };
            let child_prefix = if list_len.is_some() {
                options.list_format.generate(&prefix, &key)
            } else if dots {
                format!("{}.{}", prefix, key)
            } else {
                format!("{}[{}]", prefix, key)
            };
            self.walk(child, &child_prefix, encode, chain, out)?;
        }
        Ok(())
    }

    /// Joins a list for the comma format: `None` when nothing is left to join, null
    /// when every element renders empty.
    fn join_comma(&self, value: &Value, encode: bool) -> Option<Value> {
        let options = self.options;
        let items = value.as_list()?;
        let parts: Vec<String> = items
            .iter()
            .filter(|v| !(options.comma_compact_nulls && v.is_null()))
            .map(|item| {
                if encode && options.encode_values_only {
                    options.encode_scalar(item)
                } else {
                    item.to_string()
                }
            })
            .collect();
        if parts.is_empty() {
            return None;
        }

        let joined = parts.join(",");
        if joined.is_empty() {
            Some(Value::Null)
        } else {
            Some(Value::String(joined))
        }
    }
}

/// Child lookup by map key or list index. Missing entries are `None`.
fn lookup<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Map(map) => map.get(key),
        Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
