//! Message formatting benchmarks: dry-run measure vs. full render.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use fmi2cb_core::{FormatArg, FormatTemplate, log_line};

fn bench_short_message(c: &mut Criterion) {
    let template = FormatTemplate::parse(b"value=%d at t=%.3f in %s");
    let args = [
        FormatArg::SignedInt(42),
        FormatArg::Float(0.125),
        FormatArg::Str(Some(b"Model1")),
    ];
    let mut group = c.benchmark_group("short_message");

    group.bench_function("parse", |b| {
        b.iter(|| criterion::black_box(FormatTemplate::parse(b"value=%d at t=%.3f in %s")));
    });
    group.bench_function("measure", |b| {
        b.iter(|| criterion::black_box(template.measure(&args)));
    });
    group.bench_function("format", |b| {
        b.iter(|| criterion::black_box(template.format(&args)));
    });
    group.bench_function("log_line", |b| {
        b.iter(|| {
            let message = template.format(&args);
            criterion::black_box(log_line(1, b"Init", b"Model1", &message));
        });
    });

    group.finish();
}

fn bench_long_string(c: &mut Criterion) {
    let template = FormatTemplate::parse(b"%s");
    let mut group = c.benchmark_group("long_string");

    for len in [64usize, 1024, 10_000] {
        let payload = vec![b'L'; len];
        let args = [FormatArg::Str(Some(payload.as_slice()))];
        group.bench_with_input(BenchmarkId::new("format", len), &args, |b, args| {
            b.iter(|| criterion::black_box(template.format(args)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_short_message, bench_long_string);
criterion_main!(benches);
