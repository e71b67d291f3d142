//! Query String Syntax
//!
//! This module documents the wire format read by [`decode`](crate::decode) and written
//! by [`encode`](crate::encode).
//!
//! # Overview
//!
//! A query string is a flat list of `key=value` pairs joined by a delimiter (`&` by
//! default). Nesting is expressed entirely inside the keys: brackets (and optionally
//! dots) describe a path into a tree of maps and lists.
//!
//! ```text
//! user[name]=Alice&user[tags][0]=admin&user[tags][1]=dev
//! ```
//!
//! decodes to
//!
//! ```text
//! { "user": { "name": "Alice", "tags": ["admin", "dev"] } }
//! ```
//!
//! # Pairs
//!
//! - Each part splits at the first `=`, unless the part contains `]=`, in which case it
//!   splits just after that bracket (so `a[=]=b` keeps `=` inside the key)
//! - A part without `=` is a key with an empty value, or null under
//!   `strict_null_handling`
//! - Parts with an empty key are ignored
//! - A leading `?` is stripped when `ignore_query_prefix` is set
//! - `+` decodes to a space; `%XX` escapes decode per charset
//!
//! # Keys
//!
//! ## Brackets
//!
//! | Key | Segments | Meaning |
//! |-----|----------|---------|
//! | `a` | `a` | top-level key |
//! | `a[b]` | `a`, `[b]` | map entry `b` |
//! | `a[0]` | `a`, `[0]` | list index 0 |
//! | `a[]` | `a`, `[]` | append to a list |
//! | `a[b][c]` | `a`, `[b]`, `[c]` | nested map |
//! | `a[b[c]]` | `a`, `[b[c]]` | one segment; inner brackets are balanced |
//!
//! At most `depth` bracket groups are split off (5 by default). The remainder becomes a
//! single literal segment: `a[b][c][d]` at depth 1 is `a` then `[b]` then `[[c][d]]`,
//! giving the key `[c][d]`. With `strict_depth` the overflow is an error instead.
//!
//! An unclosed bracket folds the rest of the key the same way and is never an error:
//! `a[b=c` decodes to `{"a": {"[b": "c"}}`.
//!
//! ## Dots
//!
//! With `allow_dots`, top-level dots are read as brackets: `a.b.c` means `a[b][c]`.
//!
//! - `a.[b]` drops the dot: `a[b]`
//! - `a.` and `a.]` keep the dot literally
//! - `a..b` keeps the first dot: `a.` then `[b]`
//! - dots inside brackets are never rewritten
//!
//! With `decode_dot_in_keys`, `%2E` inside a segment becomes a literal `.` after
//! splitting, so `name%252Eobj.first=John` (double-encoded by the encoder) survives a
//! round trip as `{"name.obj": {"first": "John"}}`.
//!
//! # Lists
//!
//! A segment that is a non-negative integer with no leading zeros, at most `list_limit`,
//! builds a list when `parse_lists` is on. Indices are compacted: `a[1]=b&a[15]=c`
//! decodes to `["b", "c"]`. An index above the limit, or a non-canonical index such as
//! `01`, becomes a map key instead: `a[21]=x` decodes to `{"a": {"21": "x"}}`.
//!
//! With `comma`, `a=b,c` decodes to `["b", "c"]`. A key ending in `[]` wraps a comma
//! value in another list, so `a[]=b,c` decodes to `[["b", "c"]]`.
//!
//! # List Formats
//!
//! The encoder writes lists in one of four shapes:
//!
//! | Format | Output for `{"a": ["b", "c"]}` |
//! |--------|--------------------------------|
//! | `Indices` | `a[0]=b&a[1]=c` |
//! | `Brackets` | `a[]=b&a[]=c` |
//! | `Repeat` | `a=b&a=c` |
//! | `Comma` | `a=b,c` |
//!
//! # Charsets
//!
//! Percent escapes are UTF-8 by default. Under Latin-1 each `%XX` is one code point,
//! and characters outside Latin-1 are written as numeric entities (`%26%23NNN%3B`).
//!
//! The charset sentinel `utf8=✓` announces the charset the client used:
//!
//! | Sentinel | Charset |
//! |----------|---------|
//! | `utf8=%E2%9C%93` | UTF-8 |
//! | `utf8=%26%2310003%3B` | Latin-1 |
//!
//! With `charset_sentinel` the decoder honours and removes it, and the encoder writes it
//! first.
//!
//! # Formats
//!
//! `Rfc3986` (default) writes spaces as `%20`; `Rfc1738` writes them as `+` and leaves
//! `(` and `)` unescaped.
//!
//! # Limits
//!
//! | Option | Default | On overflow |
//! |--------|---------|-------------|
//! | `parameter_limit` | 1000 | extra pairs dropped, or an error |
//! | `list_limit` | 20 | index becomes a map key, or an error |
//! | `depth` | 5 | remainder folded into one key, or an error |
//!
//! The error variants apply only with `raise_on_limit_exceeded` or `strict_depth`.
