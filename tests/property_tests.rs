//! Property-based tests for the round-trip guarantees and the no-panic contract.

use proptest::prelude::*;
use qs_codec::keys::split_key;
use qs_codec::{
    decode, encode, from_str, to_string, utils, Charset, DecodeOptions, EncodeOptions, Format,
    QsMap, Value,
};
use serde::{Deserialize, Serialize};

fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    match to_string(value) {
        Ok(serialized) => match from_str::<T>(&serialized) {
            Ok(deserialized) => *value == deserialized,
            Err(e) => {
                eprintln!("Deserialize failed: {}", e);
                eprintln!("Serialized was: {}", serialized);
                false
            }
        },
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            false
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Record {
    id: i64,
    name: String,
    score: Option<u32>,
    flags: (bool, bool),
}

fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn text() -> impl Strategy<Value = String> {
    "\\PC{0,12}"
}

/// A value with at most 16 leaves, so list parsing is never switched off.
fn nested_value() -> impl Strategy<Value = Value> {
    let leaf = text().prop_map(Value::from);
    let list = prop::collection::vec(text().prop_map(Value::from), 1..4).prop_map(Value::from);
    let map = prop::collection::vec((key(), text()), 1..4).prop_map(|entries| {
        Value::Map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect::<QsMap>())
    });
    prop_oneof![leaf, list, map]
}

fn nested_map() -> impl Strategy<Value = Value> {
    prop::collection::vec((key(), nested_value()), 1..5)
        .prop_map(|entries| Value::Map(entries.into_iter().collect::<QsMap>()))
}

proptest! {
    #[test]
    fn prop_record(id in any::<i64>(), name in text(), score in proptest::option::of(any::<u32>()), flags in any::<(bool, bool)>()) {
        let record = Record { id, name, score, flags };
        prop_assert!(roundtrip(&record));
    }

    #[test]
    fn prop_tuple_i32_bool(t in (any::<i32>(), any::<bool>())) {
        prop_assert!(roundtrip(&t));
    }

    #[test]
    fn prop_vec_u16(v in prop::collection::vec(any::<u16>(), 0..20)) {
        prop_assert!(roundtrip(&v));
    }

    #[test]
    fn prop_encode_then_decode(value in nested_map()) {
        let query = encode(&value, &EncodeOptions::default()).unwrap();
        let back = decode(query.as_str(), &DecodeOptions::default()).unwrap();
        prop_assert_eq!(Value::Map(back), value);
    }

    #[test]
    fn prop_decode_never_fails_with_defaults(input in "\\PC{0,64}") {
        prop_assert!(decode(input.as_str(), &DecodeOptions::default()).is_ok());
    }

    #[test]
    fn prop_decode_bracket_soup(input in "[a-c\\[\\]=&.%]{0,48}") {
        let options = DecodeOptions::new().with_allow_dots(true).with_comma(true);
        prop_assert!(decode(input.as_str(), &options).is_ok());
    }

    #[test]
    fn prop_segment_count_is_bounded(input in "[a-c\\[\\].]{0,32}", depth in 0usize..6) {
        let segments = split_key(&input, true, depth, false).unwrap();
        prop_assert!(segments.len() <= depth + 2);
    }

    #[test]
    fn prop_scalar_utf8_round_trip(s in "\\PC{0,32}") {
        let encoded = utils::encode(&Value::from(s.as_str()), Charset::Utf8, Format::Rfc3986);
        prop_assert!(encoded.bytes().all(|b| b.is_ascii_alphanumeric() || b"-._~%".contains(&b)));
        prop_assert_eq!(utils::decode(&encoded, Charset::Utf8), s);
    }

    #[test]
    fn prop_scalar_latin1_round_trip(s in "[\\x{20}-\\x{2a}\\x{2c}-\\x{7e}\\x{a0}-\\x{ff}]{0,32}") {
        let encoded = utils::encode(&Value::from(s.as_str()), Charset::Latin1, Format::Rfc3986);
        prop_assert_eq!(utils::decode(&encoded, Charset::Latin1), s);
    }
}
