//! Working with Value trees for runtime flexibility.
//!
//! Run with: cargo run --example dynamic_values

use qs_codec::{encode, from_value, qs, to_value, EncodeOptions, Error as QsError, Value};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
    roles: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let raw = EncodeOptions::new().with_encode(false);

    // Build a filter dynamically with the qs! macro
    let filter = qs!({
        "status": "open",
        "page": 3,
        "sort": { "field": "created", "desc": true },
        "ids": [4, 8, 15]
    });
    println!("Filter as query:\n{}\n", encode(&filter, &raw)?);

    // Access values dynamically
    if let Some(status) = filter.get("status").and_then(Value::as_str) {
        println!("Accessing field 'status': {}", status);
    }
    if let Some(page) = filter.get("page").and_then(Value::as_i64) {
        println!("Accessing field 'page': {}", page);
    }
    if let Some(ids) = filter.get("ids").and_then(Value::as_list) {
        println!("Accessing field 'ids': {} items\n", ids.len());
    }

    // Convert a struct to a Value and back
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        roles: vec!["admin".to_string(), "developer".to_string()],
    };
    let user_value = to_value(&user)?;
    println!("User as query:\n{}\n", encode(&user_value, &raw)?);

    let user_back: User = from_value(user_value.clone())?;
    println!("User back: {:?}\n", user_back);

    // Runtime type checking
    println!("Type checks:");
    println!("  is_map:    {}", user_value.is_map());
    println!("  is_list:   {}", user_value.is_list());
    println!("  is_string: {}\n", user_value.is_string());

    // The same shared list under two keys is fine
    let tags = Value::shared(qs!(["x", "y"]));
    let alias = tags.clone();
    let doc = qs!({ "a": tags, "b": alias });
    println!("Shared twice: {}", encode(&doc, &raw)?);

    // A value that contains itself is reported
    let node = Value::shared(qs!({ "name": "loop" }));
    if let Value::Shared(cell) = &node {
        if let Value::Map(map) = &mut *cell.borrow_mut() {
            map.insert("next".to_string(), node.clone());
        }
    }
    let handle = node.clone();
    match encode(&qs!({ "root": handle }), &raw) {
        Err(QsError::CircularReference { key }) => println!("Cycle detected at {}", key),
        other => println!("Unexpected: {:?}", other),
    }
    if let Value::Shared(cell) = &node {
        if let Value::Map(map) = &mut *cell.borrow_mut() {
            map.remove("next");
        }
    }

    Ok(())
}
