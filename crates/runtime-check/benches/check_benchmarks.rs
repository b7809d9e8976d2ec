//! Benchmarks for the checking hot paths.
//!
//! - Shallow vs deep list checks at several sizes
//! - Disjoint bound unions
//! - A wrapped call against the bare body
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use runtime_check::{
    check_bound_at_run, Annotations, BoundSpec, CallArgs, Depth, Interval, Signature, TypeSpec,
    Value,
};

const LIST_SIZES: &[usize] = &[10, 100, 1_000, 10_000];

fn int_list(len: usize) -> Value {
    Value::list((0..len as i64).map(Value::Int))
}

fn bench_list_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_of_int");
    let spec = TypeSpec::list_of(TypeSpec::int());

    for &len in LIST_SIZES {
        let value = int_list(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("shallow", len), &value, |b, v| {
            b.iter(|| spec.matches_with(black_box(v), Depth::Shallow))
        });
        group.bench_with_input(BenchmarkId::new("deep", len), &value, |b, v| {
            b.iter(|| spec.matches_with(black_box(v), Depth::Deep))
        });
    }

    group.finish();
}

fn bench_bound_unions(c: &mut Criterion) {
    let mut group = c.benchmark_group("bound_union");

    for count in [1usize, 4, 16] {
        let spec = BoundSpec::union((0..count).map(|i| {
            let low = (i * 10) as f64;
            Interval::closed(low, low + 5.0)
        }));
        let outside = Value::from(-1.0);
        group.bench_with_input(BenchmarkId::new("miss", count), &outside, |b, v| {
            b.iter(|| spec.in_bounds(black_box(v)))
        });
    }

    group.finish();
}

fn bench_wrapped_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrapped_call");

    let body = |a: f64, b: f64| if a < b * 100.0 { b * 100.0 } else { a.min(100.0) };
    let wrapped = match check_bound_at_run(
        Signature::new("scale").param("a").param("b"),
        Annotations::new()
            .arg("a", BoundSpec::interval(0.0, f64::INFINITY, (false, true)))
            .arg("b", BoundSpec::closed(0.0, 1.0))
            .returns(BoundSpec::closed(0.0, 100.0)),
        move |args| {
            let a = args["a"].as_f64().unwrap_or_default();
            let b = args["b"].as_f64().unwrap_or_default();
            Value::from(body(a, b))
        },
    ) {
        Ok(wrapped) => wrapped,
        Err(e) => panic!("benchmark setup failed: {}", e),
    };

    group.bench_function("bare", |b| b.iter(|| body(black_box(100.0), black_box(0.5))));
    group.bench_function("checked", |b| {
        b.iter(|| wrapped.call(CallArgs::new().arg(black_box(100)).arg(black_box(0.5))))
    });

    group.finish();
}

criterion_group!(benches, bench_list_checks, bench_bound_unions, bench_wrapped_call);
criterion_main!(benches);
