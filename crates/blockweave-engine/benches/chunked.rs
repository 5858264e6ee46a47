use std::sync::Arc;

use blockweave_engine::{
    ConversionOptions, Converter, CssFramework, HandlerRegistry, OptimizationLevel, SsrOptions,
};
use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn converter(options: ConversionOptions) -> Converter {
    Converter::new(Arc::new(HandlerRegistry::with_builtins()), options).unwrap()
}

fn bench_whole_vs_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked");
    group.sample_size(10);

    let blocks = common::generate_flat_document(5_000);
    let options = ConversionOptions::builder()
        .css_framework(CssFramework::Tailwind)
        .chunk_size(128)
        .build();
    let converter = converter(options);

    group.bench_function("whole_document", |b| {
        b.iter(|| {
            let conversion = converter.convert(std::hint::black_box(&blocks));
            std::hint::black_box(conversion);
        });
    });

    group.bench_function("chunks_of_128", |b| {
        b.iter(|| {
            for chunk in converter.chunked(std::hint::black_box(&blocks)) {
                std::hint::black_box(chunk);
            }
        });
    });

    group.finish();
}

fn bench_ssr_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("ssr");
    group.sample_size(10);

    let blocks = common::generate_nested_document(200, 4);
    for level in [
        OptimizationLevel::Minimal,
        OptimizationLevel::Balanced,
        OptimizationLevel::Maximum,
    ] {
        let converter = converter(
            ConversionOptions::builder()
                .ssr(true)
                .ssr_options(SsrOptions::Level(level))
                .build(),
        );
        group.bench_function(format!("{level:?}"), |b| {
            b.iter(|| std::hint::black_box(converter.convert(std::hint::black_box(&blocks))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_whole_vs_chunked, bench_ssr_levels);
criterion_main!(benches);
