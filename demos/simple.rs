//! Basic query string decoding and encoding.
//!
//! Run with: cargo run --example simple

use qs_codec::{decode, encode, from_str, to_string, DecodeOptions, EncodeOptions, Value};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Search {
    q: String,
    page: u32,
    tags: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Decode nested keys into a map
    let map = decode(
        "user[name]=Alice%20Smith&user[roles][]=admin&user[roles][]=dev",
        &DecodeOptions::default(),
    )?;
    println!("Decoded: {:?}", map);
    println!("  user.name:     {}", map["user"]["name"]);
    println!("  user.roles[1]: {}\n", map["user"]["roles"][1]);

    // Encode it back out
    let raw = EncodeOptions::new().with_encode(false);
    println!("Encoded: {}", encode(&Value::Map(map.clone()), &raw)?);
    println!("Escaped: {}\n", encode(&Value::Map(map), &EncodeOptions::default())?);

    // Typed data through serde
    let search = Search {
        q: "rust codec".to_string(),
        page: 2,
        tags: vec!["web".to_string(), "query".to_string()],
    };
    let query = to_string(&search)?;
    println!("Struct as query: {}", query);

    let search_back: Search = from_str(&query)?;
    assert_eq!(search, search_back);
    println!("✓ Round-trip successful");

    Ok(())
}
