//! Ordered map type for decoded query strings.
//!
//! [`QsMap`] wraps an [`IndexMap`] so that keys keep the order in which they first
//! appeared in the query string. Encoding walks the same order back out, which is what
//! makes `decode(encode(x)) == x` hold for ordered inputs.
//!
//! ## Examples
//!
//! ```rust
//! use qs_codec::{QsMap, Value};
//!
//! let mut map = QsMap::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;
use std::ops::Index;

/// An insertion-ordered map of string keys to [`Value`](crate::Value)s.
///
/// # Examples
///
/// ```rust
/// use qs_codec::{QsMap, Value};
///
/// let mut map = QsMap::new();
/// map.insert("first".to_string(), Value::from(1));
/// map.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QsMap(IndexMap<String, crate::Value>);

impl QsMap {
    /// Creates an empty `QsMap`.
    #[must_use]
    pub fn new() -> Self {
        QsMap(IndexMap::new())
    }

    /// Creates an empty `QsMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        QsMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// An existing key keeps its position and gets the new value; the old value is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qs_codec::{QsMap, Value};
    ///
    /// let mut map = QsMap::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut crate::Value> {
        self.0.get_mut(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<crate::Value> {
        self.0.shift_remove(key)
    }

    /// Returns the number of elements in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }

    /// Returns a mutable iterator over the key-value pairs, in insertion order.
    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, crate::Value> {
        self.0.iter_mut()
    }
}

impl Index<&str> for QsMap {
    type Output = crate::Value;

    /// A missing key reads as [`Value::Null`](crate::Value::Null).
    fn index(&self, key: &str) -> &crate::Value {
        self.0.get(key).unwrap_or(&crate::Value::Null)
    }
}

impl From<HashMap<String, crate::Value>> for QsMap {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        QsMap(map.into_iter().collect())
    }
}

impl From<IndexMap<String, crate::Value>> for QsMap {
    fn from(map: IndexMap<String, crate::Value>) -> Self {
        QsMap(map)
    }
}

impl From<QsMap> for HashMap<String, crate::Value> {
    fn from(map: QsMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for QsMap {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a QsMap {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for QsMap {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        QsMap(IndexMap::from_iter(iter))
    }
}
