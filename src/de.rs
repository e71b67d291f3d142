//! Serde deserialization out of [`Value`].
//!
//! Decoded query strings are mostly text, so [`ValueDeserializer`] is lenient in the
//! directions a query string needs:
//!
//! - **Scalars from text**: `"42"` fills an integer field, `"true"`/`"1"` fill a bool
//! - **Absent optionals**: null and the empty string both deserialize to `None`
//! - **One-element sequences**: `tags=a` fills a `Vec<String>` with `["a"]`
//! - **Index-keyed maps**: `{"0": .., "1": ..}` (a list past the list limit) reads as a
//!   sequence in index order
//!
//! ## Usage
//!
//! ```rust
//! use qs_codec::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Page { number: u32, size: Option<u32>, tags: Vec<String> }
//!
//! let page: Page = from_str("number=3&size=&tags=new").unwrap();
//! assert_eq!(page, Page { number: 3, size: None, tags: vec!["new".to_string()] });
//! ```

use crate::value::iso_date;
use crate::{Error, Number, QsMap, Result, Value};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use std::str::FromStr;

/// Deserializer reading from an owned [`Value`].
///
/// [`Value::Shared`] handles are read through; a cyclic value never terminates.
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer {
            value: unshare(value),
        }
    }

    fn integer<T>(self) -> Result<T>
    where
        T: TryFrom<i64> + FromStr,
    {
        match self.value {
            Value::Number(Number::Integer(i)) => {
                T::try_from(i).map_err(|_| Error::custom(format!("integer {i} out of range")))
            }
            Value::Number(Number::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
                T::try_from(f as i64).map_err(|_| Error::custom(format!("integer {f} out of range")))
            }
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::custom(format!("invalid integer: {s:?}"))),
            other => Err(mismatch("an integer", &other)),
        }
    }

    fn float(self) -> Result<f64> {
        match self.value {
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::custom(format!("invalid number: {s:?}"))),
            other => Err(mismatch("a number", &other)),
        }
    }
}

/// Follows shared handles down to an owned value.
fn unshare(mut value: Value) -> Value {
    while let Value::Shared(cell) = value {
        value = cell.borrow().clone();
    }
    value
}

fn describe(value: &Value) -> &'static str {
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

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::custom(format!("expected {expected}, found {}", describe(found)))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Canonical list index: digits only, no leading zero unless the index is `0`.
fn index_of(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}

/// Reads a map keyed only by list indices as the list it overflowed from.
fn index_keyed(map: QsMap) -> std::result::Result<Vec<Value>, QsMap> {
    if !map.keys().all(|k| index_of(k).is_some()) {
        return Err(map);
    }
    let mut entries: Vec<(usize, Value)> = map
        .into_iter()
        .filter_map(|(k, v)| index_of(&k).map(|i| (i, v)))
        .collect();
    entries.sort_by_key(|(i, _)| *i);
    Ok(entries.into_iter().map(|(_, v)| v).collect())
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident : $t:ty),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                visitor.$visit(self.integer::<$t>()?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(Number::Float(f)) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Bytes(bytes) => visitor.visit_byte_buf(bytes),
            Value::Date(dt) => visitor.visit_string(iso_date(&dt)),
            Value::List(list) => visitor.visit_seq(SeqDeserializer::new(list)),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Shared(cell) => {
                let inner = cell.borrow().clone();
                ValueDeserializer::new(inner).deserialize_any(visitor)
            }
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Bool(b) => visitor.visit_bool(b),
            Value::String(s) => match s.as_str() {
                "true" | "1" | "on" => visitor.visit_bool(true),
                "false" | "0" | "off" => visitor.visit_bool(false),
                _ => Err(Error::custom(format!("invalid boolean: {s:?}"))),
            },
            Value::Number(Number::Integer(0)) => visitor.visit_bool(false),
            Value::Number(Number::Integer(1)) => visitor.visit_bool(true),
            other => Err(mismatch("a boolean", &other)),
        }
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f32(self.float()? as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f64(self.float()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(Error::custom(format!("expected a single character, found {s:?}"))),
                }
            }
            other => Err(mismatch("a character", &other)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(s) => visitor.visit_string(s),
                Err(_) => Err(Error::custom("bytes are not valid UTF-8")),
            },
            value @ (Value::Bool(_) | Value::Number(_) | Value::Date(_)) => {
                visitor.visit_string(value.to_string())
            }
            other => Err(mismatch("a string", &other)),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Bytes(bytes) => visitor.visit_byte_buf(bytes),
            Value::String(s) => visitor.visit_byte_buf(s.into_bytes()),
            other => ValueDeserializer::new(other).deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if is_blank(&self.value) {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if is_blank(&self.value) {
            visitor.visit_unit()
        } else {
            Err(mismatch("null", &self.value))
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::List(list) => visitor.visit_seq(SeqDeserializer::new(list)),
            Value::Map(map) => match index_keyed(map) {
                Ok(list) => visitor.visit_seq(SeqDeserializer::new(list)),
                Err(map) => Err(mismatch("a list", &Value::Map(map))),
            },
            Value::Null => visitor.visit_seq(SeqDeserializer::new(Vec::new())),
            scalar => visitor.visit_seq(SeqDeserializer::new(vec![scalar])),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::List(list) => {
                // A list is a map from its indices.
                let map = list
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect();
                visitor.visit_map(MapDeserializer::new(map))
            }
            Value::Null => visitor.visit_map(MapDeserializer::new(QsMap::new())),
            other => Err(mismatch("a map", &other)),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(variant.into_deserializer()),
            Value::Map(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer::new(variant, value)),
                    None => Err(Error::custom("expected an enum variant")),
                }
            }
            other => Err(mismatch("an enum variant", &other)),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: QsMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl EnumDeserializer {
    fn new(variant: String, value: Value) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        if is_blank(&self.value) {
            Ok(())
        } else {
            Err(Error::custom("expected unit variant"))
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(ValueDeserializer::new(self.value), visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_map(ValueDeserializer::new(self.value), visitor)
    }
}

/// Deserializes `T` out of an owned [`Value`].
///
/// # Errors
///
/// Fails when the value's shape cannot fill `T`, for example a map for an integer or
/// text that does not parse as the requested number.
///
/// # Examples
///
/// ```rust
/// use qs_codec::{from_value, qs};
///
/// let pair: (u8, bool) = from_value(qs!(["7", "true"])).unwrap();
/// assert_eq!(pair, (7, true));
/// ```
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qs;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Query {
        page: u32,
        active: bool,
        ratio: f64,
        name: Option<String>,
        tags: Vec<String>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Order {
        Asc,
        Desc,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Range {
        Between(u32, u32),
        Above(u32),
    }

    #[test]
    fn test_textual_scalars_are_coerced() {
        let query: Query = from_value(qs!({
            "page": "2",
            "active": "true",
            "ratio": "0.5",
            "name": "",
            "tags": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(
            query,
            Query {
                page: 2,
                active: true,
                ratio: 0.5,
                name: None,
                tags: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_single_scalar_fills_sequence() {
        let tags: Vec<u8> = from_value(Value::from("7")).unwrap();
        assert_eq!(tags, vec![7]);
        let empty: Vec<u8> = from_value(Value::Null).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_index_keyed_map_reads_as_sequence() {
        let list: Vec<String> = from_value(qs!({ "10": "b", "2": "a" })).unwrap();
        assert_eq!(list, vec!["a", "b"]);
        assert!(from_value::<Vec<String>>(qs!({ "x": "a" })).is_err());
    }

    #[test]
    fn test_missing_option_field() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Sparse {
            a: Option<i64>,
            b: Option<i64>,
        }
        let sparse: Sparse = from_value(qs!({ "a": "-4" })).unwrap();
        assert_eq!(sparse, Sparse { a: Some(-4), b: None });
    }

    #[test]
    fn test_enums() {
        assert_eq!(from_value::<Order>(Value::from("desc")).unwrap(), Order::Desc);
        assert_eq!(
            from_value::<Range>(qs!({ "Between": ["1", "5"] })).unwrap(),
            Range::Between(1, 5)
        );
        assert_eq!(
            from_value::<Range>(qs!({ "Above": "3" })).unwrap(),
            Range::Above(3)
        );
    }

    #[test]
    fn test_map_keys_and_shared_values() {
        let shared = Value::shared(Value::from("x"));
        let map: BTreeMap<String, String> = from_value(qs!({ "k": shared })).unwrap();
        assert_eq!(map["k"], "x");
    }

    #[test]
    fn test_errors_name_the_mismatch() {
        let err = from_value::<u8>(qs!({ "a": "b" })).unwrap_err();
        assert_eq!(err.to_string(), "Error: expected an integer, found a map");
        assert!(from_value::<u8>(Value::from("300")).is_err());
        assert!(from_value::<bool>(Value::from("maybe")).is_err());
    }
}
