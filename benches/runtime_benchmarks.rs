//! Performance benchmarks for jsrelay
//!
//! Run with: cargo bench
//!
//! Every iteration spawns the installed engine, so these mostly measure process
//! start-up plus wrapper and codec overhead. Nothing runs when no engine is found.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsrelay::codec::{self, ResultMarker};
use jsrelay::{Runtime, Value};

fn runtime() -> Option<Runtime> {
    match Runtime::new() {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            eprintln!("skipping benchmarks: {}", err);
            None
        }
    }
}

/// Benchmark: Round trip through the backend
fn bench_round_trip(c: &mut Criterion) {
    let Some(runtime) = runtime() else { return };
    let mut group = c.benchmark_group("round_trip");
    group.sample_size(20);

    group.bench_function("eval_literal", |b| {
        b.iter(|| runtime.eval(black_box("1 + 2 * 3")).unwrap())
    });

    group.bench_function("exec_object", |b| {
        b.iter(|| runtime.exec(black_box("return {a: [1, 2, 3], b: 'caf\u{e9}'}")).unwrap())
    });

    let ctx = runtime.compile("function add(a, b) { return a + b }").unwrap();
    group.bench_function("call", |b| {
        b.iter(|| ctx.call("add", black_box(&[Value::Integer(1), Value::Integer(2)])).unwrap())
    });

    group.finish();
}

/// Benchmark: Program size scaling (writer thread plus pipe draining)
fn bench_large_programs(c: &mut Criterion) {
    let Some(runtime) = runtime() else { return };
    let mut group = c.benchmark_group("large_programs");
    group.sample_size(10);

    for lines in [1_000usize, 10_000, 100_000].iter() {
        let body = "var foo = 'bar';\n".repeat(*lines);
        let source = format!("function foo() {{\n{}\n}};\nreturn true", body);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("exec", lines), &source, |b, source| {
            b.iter(|| runtime.exec(black_box(source.as_str())).unwrap())
        });
    }

    group.finish();
}

/// Benchmark: Codec without a backend
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let value = Value::object([
        ("name", Value::from("snow \u{2603} and \u{1f600}")),
        ("items", Value::from((0..100i64).collect::<Vec<_>>())),
    ]);
    group.bench_function("encode", |b| b.iter(|| codec::encode(black_box(&value))));

    let marker = ResultMarker::new();
    let stdout = format!("log\n{}", marker.line(&format!("[\"ok\",{}]", codec::encode(&value))));
    group.bench_function("decode", |b| b.iter(|| codec::decode(black_box(&stdout), &marker)));
    group.finish();
}

criterion_group!(benches, bench_round_trip, bench_large_programs, bench_codec);

criterion_main!(benches);
