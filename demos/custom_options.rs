//! Customizing decode and encode behavior with options.
//!
//! Run with: cargo run --example custom_options

use qs_codec::{
    decode, encode, qs, Charset, DecodeOptions, Delimiter, EncodeOptions, Filter, Format,
    ListFormat, Sorter,
};
use regex::Regex;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let data = qs!({
        "a": { "b": ["c", "d"] },
        "name": "Jane Doe"
    });

    println!("List formats:");
    for format in [
        ListFormat::Indices,
        ListFormat::Brackets,
        ListFormat::Repeat,
        ListFormat::Comma,
    ] {
        let options = EncodeOptions::new()
            .with_encode(false)
            .with_list_format(format);
        println!("  {:<9} {}", format!("{:?}", format), encode(&data, &options)?);
    }

    println!("\nDot notation:");
    let dots = EncodeOptions::new().with_encode(false).with_allow_dots(true);
    println!("  encode: {}", encode(&data, &dots)?);
    let map = decode("a.b.c=d", &DecodeOptions::new().with_allow_dots(true))?;
    println!("  decode: {:?}", map);

    println!("\nFormats and charsets:");
    let rfc1738 = EncodeOptions::new().with_format(Format::Rfc1738);
    println!("  RFC 1738: {}", encode(&data, &rfc1738)?);
    let latin1 = EncodeOptions::new()
        .with_charset(Charset::Latin1)
        .with_charset_sentinel(true);
    println!("  Latin-1:  {}", encode(&qs!({ "city": "Zürich" }), &latin1)?);
    let sniffed = decode(
        "utf8=%26%2310003%3B&city=Z%FCrich",
        &DecodeOptions::new().with_charset_sentinel(true),
    )?;
    println!("  sniffed:  {}", sniffed["city"]);

    println!("\nDelimiters:");
    let semicolon = EncodeOptions::new().with_delimiter(";");
    println!("  encode ';': {}", encode(&qs!({ "a": "1", "b": "2" }), &semicolon)?);
    let either = DecodeOptions::new().with_delimiter(Delimiter::from(Regex::new("[;,]")?));
    println!("  decode /[;,]/: {:?}", decode("a=1;b=2,c=3", &either)?);

    println!("\nFilters and sorting:");
    let keys = EncodeOptions::new()
        .with_encode(false)
        .with_filter(Filter::keys(["a", "b", "0"]));
    println!("  key filter: {}", encode(&data, &keys)?);
    let sorted = EncodeOptions::new()
        .with_encode(false)
        .with_sort(Sorter::alphabetical());
    println!("  sorted:     {}", encode(&qs!({ "z": "1", "m": "2", "a": "3" }), &sorted)?);

    println!("\nLimits:");
    let lenient = decode("a[100]=x", &DecodeOptions::default())?;
    println!("  index past list_limit: {:?}", lenient);
    let strict = DecodeOptions::new()
        .with_parameter_limit(2)
        .with_raise_on_limit_exceeded(true);
    match decode("a=1&b=2&c=3", &strict) {
        Ok(map) => println!("  unexpected: {:?}", map),
        Err(e) => println!("  strict parameter limit: {}", e),
    }

    Ok(())
}
