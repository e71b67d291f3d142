use qs_codec::{
    decode, from_str, from_str_with_options, from_value, qs, to_string, to_string_with_options,
    to_value, DecodeOptions, EncodeOptions, ListFormat, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Address {
    street: String,
    city: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Customer {
    id: u64,
    name: String,
    email: Option<String>,
    vip: bool,
    address: Address,
    orders: Vec<Order>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    sku: String,
    quantity: u32,
    price: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Status {
    Open,
    Closed,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Search {
    q: String,
    status: Status,
    #[serde(default)]
    tags: Vec<String>,
    page: Option<u32>,
}

fn customer() -> Customer {
    Customer {
        id: 42,
        name: "Jane Doe".to_string(),
        email: None,
        vip: false,
        address: Address {
            street: "1 Main St".to_string(),
            city: "Zürich".to_string(),
        },
        orders: vec![
            Order {
                sku: "A-1".to_string(),
                quantity: 2,
                price: 9.5,
            },
            Order {
                sku: "B&2".to_string(),
                quantity: 1,
                price: 100.0,
            },
        ],
    }
}

#[test]
fn test_nested_struct_round_trip() {
    let query = to_string(&customer()).unwrap();
    let back: Customer = from_str(&query).unwrap();
    assert_eq!(back, customer());
}

#[test]
fn test_nested_struct_wire_shape() {
    let options = EncodeOptions::new().with_encode(false);
    let query = to_string_with_options(&customer(), &options).unwrap();
    assert_eq!(
        query,
        "id=42&name=Jane Doe&email=&vip=false&address[street]=1 Main St&address[city]=Zürich\
         &orders[0][sku]=A-1&orders[0][quantity]=2&orders[0][price]=9.5\
         &orders[1][sku]=B&2&orders[1][quantity]=1&orders[1][price]=100"
    );
}

#[test]
fn test_skip_nulls_drops_none_fields() {
    let options = EncodeOptions::new().with_skip_nulls(true).with_encode(false);
    let search = Search {
        q: "rust".to_string(),
        status: Status::Open,
        tags: vec![],
        page: None,
    };
    assert_eq!(
        to_string_with_options(&search, &options).unwrap(),
        "q=rust&status=open"
    );
    let back: Search = from_str("q=rust&status=open").unwrap();
    assert_eq!(back, search);
}

#[test]
fn test_repeated_keys_fill_vectors() {
    let search: Search = from_str("q=a&status=closed&tags=x&tags=y&page=3").unwrap();
    assert_eq!(
        search,
        Search {
            q: "a".to_string(),
            status: Status::Closed,
            tags: vec!["x".to_string(), "y".to_string()],
            page: Some(3),
        }
    );

    let single: Search = from_str("q=a&status=open&tags=x").unwrap();
    assert_eq!(single.tags, vec!["x".to_string()]);
}

#[test]
fn test_comma_lists_round_trip() {
    let search = Search {
        q: "a".to_string(),
        status: Status::Open,
        tags: vec!["x".to_string(), "y".to_string()],
        page: Some(1),
    };
    let encode_options = EncodeOptions::new()
        .with_list_format(ListFormat::Comma)
        .with_encode_values_only(true);
    let query = to_string_with_options(&search, &encode_options).unwrap();
    assert_eq!(query, "q=a&status=open&tags=x,y&page=1");

    let decode_options = DecodeOptions::new().with_comma(true);
    let back: Search = from_str_with_options(&query, &decode_options).unwrap();
    assert_eq!(back, search);
}

#[test]
fn test_overflowed_list_reads_back_in_order() {
    let query: String = (0..30)
        .rev()
        .map(|i| format!("ids[{i}]={i}"))
        .collect::<Vec<_>>()
        .join("&");
    let decoded = decode(query.as_str(), &DecodeOptions::default()).unwrap();
    // Indices past the list limit make a map, which still reads as a sequence.
    assert!(decoded["ids"].is_map());

    #[derive(Deserialize)]
    struct Ids {
        ids: Vec<u32>,
    }
    let ids: Ids = from_value(Value::Map(decoded)).unwrap();
    assert_eq!(ids.ids, (0..30).collect::<Vec<_>>());
}

#[test]
fn test_maps_with_dynamic_keys() {
    let filters: BTreeMap<String, String> = from_str("color=red&size=m").unwrap();
    assert_eq!(filters["color"], "red");
    assert_eq!(filters["size"], "m");

    let nested: BTreeMap<String, BTreeMap<String, u8>> = from_str("a[x]=1&a[y]=2&b[z]=3").unwrap();
    assert_eq!(nested["a"]["y"], 2);
    assert_eq!(nested["b"]["z"], 3);
}

#[test]
fn test_type_errors() {
    #[derive(Deserialize, Debug)]
    #[allow(dead_code)]
    struct Strict {
        n: u8,
    }
    assert!(from_str::<Strict>("n=abc").is_err());
    assert!(from_str::<Strict>("n[a]=1").is_err());
    assert!(from_str::<Strict>("m=1").is_err());
}

#[test]
fn test_to_value_preserves_field_order() {
    let value = to_value(&customer()).unwrap();
    let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["id", "name", "email", "vip", "address", "orders"]);
    assert_eq!(value["orders"][1]["sku"], Value::from("B&2"));
}

#[test]
fn test_value_serializes_to_json() {
    let value = qs!({ "a": { "b": ["c", 1, true, null] } });
    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(json, serde_json::json!({ "a": { "b": ["c", 1, true, null] } }));

    let decoded = decode("a[b][0]=c&a[d]=e", &DecodeOptions::default()).unwrap();
    let json = serde_json::to_string(&Value::Map(decoded)).unwrap();
    assert_eq!(json, r#"{"a":{"b":["c"],"d":"e"}}"#);
}

#[test]
fn test_value_deserializes_from_json() {
    let value: Value = serde_json::from_str(r#"{"a":[1,"b",{"c":null}]}"#).unwrap();
    assert_eq!(value, qs!({ "a": [1, "b", { "c": null }] }));
    assert_eq!(to_string(&value).unwrap(), "a%5B0%5D=1&a%5B1%5D=b&a%5B2%5D%5Bc%5D=");
}
