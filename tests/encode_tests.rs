use chrono::{TimeZone, Utc};
use qs_codec::{
    decode, encode, qs, Charset, DateSerializer, DecodeOptions, EncodeOptions, Encoder, Error,
    Filter, Format, ListFormat, QsMap, Sorter, Value,
};

fn raw() -> EncodeOptions {
    EncodeOptions::new().with_encode(false)
}

fn stringify(value: &Value) -> String {
    encode(value, &EncodeOptions::default()).unwrap()
}

#[test]
fn test_flat_map() {
    assert_eq!(stringify(&qs!({ "a": "b", "c": "d" })), "a=b&c=d");
    assert_eq!(stringify(&qs!({ "a": "b c" })), "a=b%20c");
    assert_eq!(stringify(&qs!({ "a": "ä€" })), "a=%C3%A4%E2%82%AC");
}

#[test]
fn test_nested_keys_are_encoded() {
    assert_eq!(stringify(&qs!({ "a": { "b": "c" } })), "a%5Bb%5D=c");
    assert_eq!(
        encode(&qs!({ "a": { "b": { "c": "d" } } }), &raw()).unwrap(),
        "a[b][c]=d"
    );
}

#[test]
fn test_scalars() {
    let value = qs!({ "n": 1, "f": 1.5, "t": true, "s": "x" });
    assert_eq!(stringify(&value), "n=1&f=1.5&t=true&s=x");

    let mut map = QsMap::new();
    map.insert("b".to_string(), Value::Bytes(b"hi there".to_vec()));
    assert_eq!(stringify(&Value::Map(map)), "b=hi%20there");
}

#[test]
fn test_non_container_roots() {
    assert_eq!(stringify(&Value::Null), "");
    assert_eq!(stringify(&Value::from("a")), "");
    assert_eq!(stringify(&qs!({})), "");
    assert_eq!(stringify(&qs!(["a", "b"])), "0=a&1=b");
}

#[test]
fn test_list_formats() {
    let value = qs!({ "a": ["b", "c"] });
    let cases = [
        (ListFormat::Indices, "a[0]=b&a[1]=c"),
        (ListFormat::Brackets, "a[]=b&a[]=c"),
        (ListFormat::Repeat, "a=b&a=c"),
        (ListFormat::Comma, "a=b,c"),
    ];
    for (format, expected) in cases {
        let options = raw().with_list_format(format);
        assert_eq!(encode(&value, &options).unwrap(), expected, "{format:?}");
    }
}

#[test]
fn test_comma_join_is_encoded_as_one_value() {
    let options = EncodeOptions::new().with_list_format(ListFormat::Comma);
    assert_eq!(encode(&qs!({ "a": ["b", "c d"] }), &options).unwrap(), "a=b%2Cc%20d");

    let values_only = options.with_encode_values_only(true);
    assert_eq!(
        encode(&qs!({ "a": ["b", "c d"] }), &values_only).unwrap(),
        "a=b,c%20d"
    );
}

#[test]
fn test_comma_nulls() {
    let value = qs!({ "a": ["b", null, "c"] });
    let options = raw().with_list_format(ListFormat::Comma);
    assert_eq!(encode(&value, &options).unwrap(), "a=b,,c");

    let compact = options.with_comma_compact_nulls(true);
    assert_eq!(encode(&value, &compact).unwrap(), "a=b,c");
}

#[test]
fn test_comma_round_trip_marks_single_element_lists() {
    let value = qs!({ "a": ["c"], "b": ["d", "e"] });
    let options = raw()
        .with_list_format(ListFormat::Comma)
        .with_comma_round_trip(true);
    let query = encode(&value, &options).unwrap();
    assert_eq!(query, "a[]=c&b=d,e");

    let decoded = decode(query.as_str(), &DecodeOptions::new().with_comma(true)).unwrap();
    assert_eq!(Value::Map(decoded), value);
}

#[test]
fn test_nested_lists() {
    let value = qs!({ "a": [["b", "c"], { "d": "e" }] });
    assert_eq!(
        encode(&value, &raw()).unwrap(),
        "a[0][0]=b&a[0][1]=c&a[1][d]=e"
    );
    let brackets = raw().with_list_format(ListFormat::Brackets);
    assert_eq!(encode(&value, &brackets).unwrap(), "a[][]=b&a[][]=c&a[][d]=e");
}

#[test]
fn test_encode_values_only() {
    let value = qs!({ "a": { "b": "c d" }, "e": ["f g"] });
    let options = EncodeOptions::new().with_encode_values_only(true);
    assert_eq!(encode(&value, &options).unwrap(), "a[b]=c%20d&e[0]=f%20g");
}

#[test]
fn test_null_handling() {
    let value = qs!({ "a": null, "b": "" });
    assert_eq!(stringify(&value), "a=&b=");

    let strict = EncodeOptions::new().with_strict_null_handling(true);
    assert_eq!(encode(&value, &strict).unwrap(), "a&b=");

    let skip = EncodeOptions::new().with_skip_nulls(true);
    assert_eq!(encode(&qs!({ "a": null, "b": "c" }), &skip).unwrap(), "b=c");
    assert_eq!(encode(&qs!({ "a": { "b": null } }), &skip).unwrap(), "");
}

#[test]
fn test_strict_null_key_is_encoded() {
    let options = EncodeOptions::new().with_strict_null_handling(true);
    assert_eq!(encode(&qs!({ "a": { "b": null } }), &options).unwrap(), "a%5Bb%5D");
}

#[test]
fn test_empty_lists() {
    let value = qs!({ "a": [], "b": "c" });
    assert_eq!(encode(&value, &raw()).unwrap(), "b=c");

    let options = raw().with_allow_empty_lists(true);
    assert_eq!(encode(&value, &options).unwrap(), "a[]&b=c");
}

#[test]
fn test_dots() {
    let value = qs!({ "a": { "b": { "c": "d" } }, "e": ["f"] });
    let options = raw().with_allow_dots(true);
    assert_eq!(encode(&value, &options).unwrap(), "a.b.c=d&e[0]=f");
}

#[test]
fn test_encode_dot_in_keys() {
    let value = qs!({ "name.obj": { "first": "John", "last": "Doe" } });
    let options = EncodeOptions::new().with_encode_dot_in_keys(true);
    let query = encode(&value, &options).unwrap();
    assert_eq!(query, "name%252Eobj.first=John&name%252Eobj.last=Doe");

    let back = decode(query.as_str(), &DecodeOptions::new().with_decode_dot_in_keys(true)).unwrap();
    assert_eq!(Value::Map(back), value);
}

#[test]
fn test_prefix_and_sentinel() {
    let value = qs!({ "a": "b" });
    let prefixed = EncodeOptions::new().with_add_query_prefix(true);
    assert_eq!(encode(&value, &prefixed).unwrap(), "?a=b");
    assert_eq!(encode(&qs!({}), &prefixed).unwrap(), "");

    let sentinel = EncodeOptions::new().with_charset_sentinel(true);
    assert_eq!(encode(&value, &sentinel).unwrap(), "utf8=%E2%9C%93&a=b");

    let latin1 = sentinel.with_charset(Charset::Latin1);
    assert_eq!(encode(&value, &latin1).unwrap(), "utf8=%26%2310003%3B&a=b");
}

#[test]
fn test_latin1() {
    let options = EncodeOptions::new().with_charset(Charset::Latin1);
    assert_eq!(encode(&qs!({ "a": "ø" }), &options).unwrap(), "a=%F8");
    assert_eq!(encode(&qs!({ "a": "☺" }), &options).unwrap(), "a=%26%239786%3B");
}

#[test]
fn test_formats() {
    let value = qs!({ "a": "b c(d)" });
    assert_eq!(stringify(&value), "a=b%20c%28d%29");

    let options = EncodeOptions::new().with_format(Format::Rfc1738);
    assert_eq!(encode(&value, &options).unwrap(), "a=b+c(d)");
}

#[test]
fn test_delimiter() {
    let options = EncodeOptions::new().with_delimiter(";");
    assert_eq!(encode(&qs!({ "a": "b", "c": "d" }), &options).unwrap(), "a=b;c=d");
}

#[test]
fn test_sort() {
    let value = qs!({ "b": "1", "a": { "z": "2", "y": "3" } });
    let options = raw().with_sort(Sorter::alphabetical());
    assert_eq!(encode(&value, &options).unwrap(), "a[y]=3&a[z]=2&b=1");

    let reversed = raw().with_sort(Sorter::new(|a, b| b.cmp(a)));
    assert_eq!(encode(&value, &reversed).unwrap(), "b=1&a[z]=2&a[y]=3");
}

#[test]
fn test_filter_keys() {
    let value = qs!({ "a": ["b", "c", "d"], "e": "f" });
    let options = EncodeOptions::new().with_filter(Filter::keys(["a", "0", "2"]));
    assert_eq!(encode(&value, &options).unwrap(), "a%5B0%5D=b&a%5B2%5D=d");
}

#[test]
fn test_filter_function() {
    let value = qs!({ "a": "1", "b": "2", "c": { "d": "3" } });
    let options = raw().with_filter(Filter::function(|prefix, value| match prefix {
        "b" => None,
        "c[d]" => Some(Value::from("replaced")),
        _ => Some(value.clone()),
    }));
    assert_eq!(encode(&value, &options).unwrap(), "a=1&c[d]=replaced");
}

#[test]
fn test_dates() {
    let date = Utc.timestamp_millis_opt(7).unwrap();
    let mut map = QsMap::new();
    map.insert("a".to_string(), Value::Date(date));
    let value = Value::Map(map);

    assert_eq!(stringify(&value), "a=1970-01-01T00%3A00%3A00.007Z");

    let options = raw().with_serialize_date(DateSerializer::new(|d| d.timestamp_millis().to_string()));
    assert_eq!(encode(&value, &options).unwrap(), "a=7");

    let list = Value::Map(
        [("a".to_string(), Value::from(vec![Value::Date(date), Value::from("x")]))]
            .into_iter()
            .collect(),
    );
    let comma = options.with_list_format(ListFormat::Comma);
    assert_eq!(encode(&list, &comma).unwrap(), "a=7,x");
}

#[test]
fn test_custom_encoder() {
    let encoder = Encoder::new(|value, _, _| value.to_string().to_uppercase());
    let options = EncodeOptions::new().with_encoder(encoder);
    assert_eq!(encode(&qs!({ "a": { "b": "c" } }), &options).unwrap(), "A[B]=C");
}

#[test]
fn test_shared_values_are_not_cycles() {
    let shared = Value::shared(qs!(["x", "y"]));
    let alias = shared.clone();
    let value = qs!({ "a": shared, "b": { "c": alias } });
    assert_eq!(
        encode(&value, &raw()).unwrap(),
        "a[0]=x&a[1]=y&b[c][0]=x&b[c][1]=y"
    );
}

#[test]
fn test_cycle_is_reported() {
    let node = Value::shared(qs!({ "name": "n" }));
    if let Value::Shared(cell) = &node {
        if let Value::Map(map) = &mut *cell.borrow_mut() {
            map.insert("next".to_string(), node.clone());
        }
    }

    let handle = node.clone();
    let value = qs!({ "root": handle });
    let err = encode(&value, &raw()).unwrap_err();
    assert!(matches!(err, Error::CircularReference { ref key } if key == "root[next]"));

    // Break the cycle so the handles can be freed.
    if let Value::Shared(cell) = &node {
        if let Value::Map(map) = &mut *cell.borrow_mut() {
            map.remove("next");
        }
    }
}

#[test]
fn test_round_trip_through_decode() {
    let value = qs!({
        "user": { "name": "Alice Smith", "tags": ["a&b", "c=d"] },
        "page": "2",
        "q": "ü ☺"
    });
    let query = stringify(&value);
    let back = decode(query.as_str(), &DecodeOptions::default()).unwrap();
    assert_eq!(Value::Map(back), value);
}
