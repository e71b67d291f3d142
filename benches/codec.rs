use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qs_codec::{decode, encode, from_str, to_string, DecodeOptions, EncodeOptions, ListFormat};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Clone)]
struct Catalog {
    products: Vec<Product>,
}

fn catalog(size: u32) -> Catalog {
    Catalog {
        products: (0..size)
            .map(|i| Product {
                sku: format!("SKU{}", i),
                name: format!("Product {}", i),
                price: 9.99 + f64::from(i),
                quantity: i,
            })
            .collect(),
    }
}

fn benchmark_simple_struct(c: &mut Criterion) {
    let user = User {
        id: 123,
        name: "Alice Smith".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    };
    let query = to_string(&user).unwrap();

    c.bench_function("serialize_simple_struct", |b| {
        b.iter(|| to_string(black_box(&user)))
    });
    c.bench_function("deserialize_simple_struct", |b| {
        b.iter(|| from_str::<User>(black_box(&query)))
    });
}

fn benchmark_nested_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_lists");

    // Sizes above the list limit exercise the index-keyed map path.
    for size in [5u32, 20, 100].iter() {
        let data = catalog(*size);
        let query = to_string(&data).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| to_string(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &query, |b, query| {
            b.iter(|| decode(black_box(query.as_str()), &DecodeOptions::default()))
        });
    }
    group.finish();
}

fn benchmark_list_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_formats");
    let value = qs_codec::to_value(&catalog(10)).unwrap();

    for format in [
        ListFormat::Indices,
        ListFormat::Brackets,
        ListFormat::Repeat,
        ListFormat::Comma,
    ] {
        let options = EncodeOptions::new().with_list_format(format);
        group.bench_function(format!("{:?}", format), |b| {
            b.iter(|| encode(black_box(&value), &options))
        });
    }
    group.finish();
}

fn benchmark_flat_parameters(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_parameters");

    for count in [10usize, 100, 1000].iter() {
        let query = (0..*count)
            .map(|i| format!("key{}=value%20{}", i, i))
            .collect::<Vec<_>>()
            .join("&");
        group.bench_with_input(BenchmarkId::from_parameter(count), &query, |b, query| {
            b.iter(|| decode(black_box(query.as_str()), &DecodeOptions::default()))
        });
    }
    group.finish();
}

fn benchmark_deep_keys(c: &mut Criterion) {
    let options = DecodeOptions::new().with_depth(20);
    let key: String = std::iter::once("a".to_string())
        .chain((0..20).map(|i| format!("[k{}]", i)))
        .collect();
    let query = format!("{}=x", key);

    c.bench_function("decode_deep_key", |b| {
        b.iter(|| decode(black_box(query.as_str()), &options))
    });
}

criterion_group!(
    benches,
    benchmark_simple_struct,
    benchmark_nested_lists,
    benchmark_list_formats,
    benchmark_flat_parameters,
    benchmark_deep_keys
);
criterion_main!(benches);
