//! Splitting flat keys into path segments.
//!
//! A decoded key such as `a[b][0]` is split into a parent (`a`) followed by its bracket
//! groups kept verbatim (`[b]`, `[0]`). The container builder strips the brackets later;
//! keeping them here lets it tell `a[0]` (a list index) from a bare `0`.
//!
//! ```rust
//! use qs_codec::keys::split_key;
//!
//! let segments = split_key("a[b][c]", false, 5, false).unwrap();
//! assert_eq!(segments, vec!["a", "[b]", "[c]"]);
//!
//! let dotted = split_key("a.b[c]", true, 5, false).unwrap();
//! assert_eq!(dotted, vec!["a", "[b]", "[c]"]);
//! ```

use crate::{Error, Result};
use std::borrow::Cow;

/// Splits `key` into its parent and up to `max_depth` bracket groups.
///
/// Groups past `max_depth` are folded into one trailing segment, or rejected with
/// [`Error::DepthExceeded`] when `strict_depth` is set. An unclosed `[` is folded the
/// same way but never rejected. A `max_depth` of zero disables splitting.
///
/// # Errors
///
/// Returns [`Error::DepthExceeded`] when `strict_depth` is set and the key has more
/// than `max_depth` complete bracket groups.
///
/// # Examples
///
/// ```rust
/// use qs_codec::keys::split_key;
///
/// let folded = split_key("a[b][c][d]", false, 2, false).unwrap();
/// assert_eq!(folded, vec!["a", "[b]", "[c]", "[[d]]"]);
///
/// assert!(split_key("a[b][c][d]", false, 2, true).is_err());
/// ```
pub fn split_key(
    key: &str,
    allow_dots: bool,
    max_depth: usize,
    strict_depth: bool,
) -> Result<Vec<String>> {
    if max_depth == 0 {
        return Ok(vec![key.to_string()]);
    }

    let key: Cow<'_, str> = if allow_dots {
        dots_to_brackets(key)
    } else {
        Cow::Borrowed(key)
    };

    let mut segments = Vec::new();
    let first = key.find('[');
    let parent = first.map_or(key.as_ref(), |i| &key[..i]);
    if !parent.is_empty() {
        segments.push(parent.to_string());
    }

    let bytes = key.as_bytes();
    let mut open = first;
    let mut collected = 0;

    while let Some(start) = open {
        if collected == max_depth {
            break;
        }
        match closing_bracket(bytes, start) {
            Some(end) => {
                segments.push(key[start..=end].to_string());
                collected += 1;
                open = key[end + 1..].find('[').map(|i| end + 1 + i);
            }
            None => break,
        }
    }

    if let Some(start) = open {
        // Only a complete group past the limit counts as too deep.
        if strict_depth && closing_bracket(bytes, start).is_some() {
            return Err(Error::depth_exceeded(max_depth));
        }
        segments.push(format!("[{}]", &key[start..]));
    }

    Ok(segments)
}

/// Index of the `]` balancing the `[` at `open`, if any.
fn closing_bracket(bytes: &[u8], open: usize) -> Option<usize> {
    let mut level = 0usize;
    for (i, &byte) in bytes.iter().enumerate().skip(open) {
        match byte {
            b'[' => level += 1,
            b']' => {
                level -= 1;
                if level == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrites top-level `.name` runs into `[name]` groups.
///
/// `.[` drops the dot, `.]` and a trailing `.` stay literal, and in `..` the first dot
/// stays literal while the second opens a group. Dots inside brackets are untouched.
fn dots_to_brackets(key: &str) -> Cow<'_, str> {
    if !key.contains('.') {
        return Cow::Borrowed(key);
    }

    let bytes = key.as_bytes();
    let mut out = String::with_capacity(key.len() + 4);
    let mut level = 0usize;
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => level += 1,
            b']' => level = level.saturating_sub(1),
            b'.' if level == 0 => match bytes.get(i + 1) {
                Some(b'[') => {
                    out.push_str(&key[last..i]);
                    i += 1;
                    last = i;
                    continue;
                }
                None | Some(b'.') | Some(b']') => {}
                Some(_) => {
                    out.push_str(&key[last..i]);
                    let start = i + 1;
                    let end = bytes[start..]
                        .iter()
                        .position(|b| matches!(b, b'.' | b'[' | b']'))
                        .map_or(bytes.len(), |p| start + p);
                    out.push('[');
                    out.push_str(&key[start..end]);
                    out.push(']');
                    i = end;
                    last = end;
                    continue;
                }
            },
            _ => {}
        }
        i += 1;
    }
    out.push_str(&key[last..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(key: &str) -> Vec<String> {
        split_key(key, false, 5, false).unwrap()
    }

    fn split_dots(key: &str) -> Vec<String> {
        split_key(key, true, 5, false).unwrap()
    }

    #[test]
    fn test_plain_and_bracketed() {
        assert_eq!(split("a"), vec!["a"]);
        assert_eq!(split("a[b]"), vec!["a", "[b]"]);
        assert_eq!(split("a[]"), vec!["a", "[]"]);
        assert_eq!(split("[a]"), vec!["[a]"]);
    }

    #[test]
    fn test_nested_brackets_stay_in_one_group() {
        assert_eq!(split("a[with[inner]]"), vec!["a", "[with[inner]]"]);
    }

    #[test]
    fn test_depth_overflow_is_folded() {
        assert_eq!(
            split_key("a[b][c][d][e]", false, 1, false).unwrap(),
            vec!["a", "[b]", "[[c][d][e]]"]
        );
    }

    #[test]
    fn test_depth_overflow_strict() {
        let err = split_key("a[b][c]", false, 1, true).unwrap_err();
        assert_eq!(err, Error::DepthExceeded { depth: 1 });
        assert!(split_key("a[b]", false, 1, true).is_ok());
        assert_eq!(
            split_key("a[b][c", false, 1, true).unwrap(),
            vec!["a", "[b]", "[[c]"]
        );
        assert!(split_key("a[b][c][d", false, 1, true).is_err());
    }

    #[test]
    fn test_zero_depth_disables_splitting() {
        assert_eq!(split_key("a[b].c", true, 0, false).unwrap(), vec!["a[b].c"]);
    }

    #[test]
    fn test_unterminated_bracket_is_folded() {
        assert_eq!(split("a[b"), vec!["a", "[[b]"]);
        assert_eq!(split("a[b][c"), vec!["a", "[b]", "[[c]"]);
        assert!(split_key("a[b][c", false, 5, true).is_ok());
    }

    #[test]
    fn test_trailing_text_is_dropped() {
        assert_eq!(split("a[b]c"), vec!["a", "[b]"]);
    }

    #[test]
    fn test_dot_tie_breaks() {
        assert_eq!(split_dots("a.b"), vec!["a", "[b]"]);
        assert_eq!(split_dots("a.b.c"), vec!["a", "[b]", "[c]"]);
        assert_eq!(split_dots("a..b"), vec!["a.", "[b]"]);
        assert_eq!(split_dots(".a"), vec!["[a]"]);
        assert_eq!(split_dots("a."), vec!["a."]);
        assert_eq!(split_dots("a.[b]"), vec!["a", "[b]"]);
        assert_eq!(split_dots("a.]"), vec!["a.]"]);
    }

    #[test]
    fn test_dots_inside_brackets_untouched() {
        assert_eq!(split_dots("a[b.c].d"), vec!["a", "[b.c]", "[d]"]);
    }

    #[test]
    fn test_dots_ignored_without_allow_dots() {
        assert_eq!(split("a.b"), vec!["a.b"]);
    }
}
