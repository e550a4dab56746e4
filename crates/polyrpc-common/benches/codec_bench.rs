// Criterion benchmarks for polyrpc-common codec layer
//
// Run benchmarks with:
//   cargo bench -p polyrpc-common
//
// For detailed output with plots:
//   cargo bench -p polyrpc-common -- --save-baseline main

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use polyrpc_common::codec::{self, encode_params, JsonCodec, Params};
use polyrpc_common::{JsonRpcRequest, JsonRpcResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Person {
    id: i64,
    name: String,
    email: String,
    title: String,
    age: f64,
}

fn people(n: usize) -> Vec<Person> {
    (0..n)
        .map(|i| Person {
            id: i as i64,
            name: format!("person {}", i),
            email: format!("p{}@example.com", i),
            title: "engineer".into(),
            age: 30.5,
        })
        .collect()
}

fn bench_value_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_codec");

    let person = people(1).remove(0);
    group.bench_function("encode_record", |b| {
        b.iter(|| codec::encode(black_box(&person)))
    });

    let list = people(100);
    group.bench_function("encode_record_list_100", |b| {
        b.iter(|| codec::encode(black_box(&list)))
    });

    let wire = codec::encode(&list).unwrap();
    group.bench_function("decode_record_list_100", |b| {
        b.iter(|| codec::decode::<Vec<Person>>(black_box(wire.clone())))
    });

    group.finish();
}

fn bench_envelopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelopes");

    let request = JsonRpcRequest::new("SampleService_Add", encode_params(vec![json!(2), json!(3)]));
    group.bench_function("encode_request", |b| {
        b.iter(|| JsonCodec::encode_request(black_box(&request)))
    });

    let bytes = JsonCodec::encode_request(&request).unwrap();
    group.bench_function("decode_request", |b| {
        b.iter(|| JsonCodec::decode_request(black_box(&bytes)))
    });

    group.bench_function("decode_and_bind_params", |b| {
        b.iter(|| {
            let request = JsonCodec::decode_request(black_box(&bytes)).unwrap();
            let mut params = Params::parse(&["a", "b"], request.params).unwrap();
            (params.take::<i64>().unwrap(), params.take::<i64>().unwrap())
        })
    });

    let response = JsonRpcResponse::success(json!(1), codec::encode(&people(10)).unwrap());
    group.bench_function("encode_response", |b| {
        b.iter(|| JsonCodec::encode_response(black_box(&response)))
    });

    group.finish();
}

criterion_group!(benches, bench_value_codec, bench_envelopes);
criterion_main!(benches);
