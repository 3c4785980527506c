use catalyze::arena::{Arena, simd};
use catalyze::config::{self, ParseContext};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn project_text(targets: usize) -> String {
    let mut text = String::from(
        "config {\n\tcompiler: clang\n\tbuild_dir: build/\n\tdefault_flags: [-Wall -Wextra -pedantic]\n}\n",
    );
    for t in 0..targets {
        text.push_str(&format!("\ntarget executable app{t} {{\n\tsources: [\n"));
        for s in 0..64 {
            text.push_str(&format!("\t\tsrc/module{t}/file{s}.c\n"));
        }
        text.push_str(&format!("\t]\n\tflags: [-O3 -DNDEBUG]\n\toutput: build/bin/app{t}\n}}\n"));
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let text = project_text(config::MAX_TARGETS);
    let mut arena = Arena::default();

    let mut group = c.benchmark_group("parse_config_cat");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("16_targets", |b| {
        b.iter(|| {
            arena.reset();
            let src = arena.alloc_str(black_box(&text));
            let project = config::parse(&arena, src, &ParseContext::default()).unwrap();
            black_box(project.targets.len());
        })
    });
    group.finish();
}

fn bench_fill_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_simd");
    for len in [31usize, 256, 4096, 65536] {
        let src = vec![0x5au8; len + 1];
        let mut dst = vec![0u8; len + 1];
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("fill", len), &len, |b, &len| {
            b.iter(|| simd::fill(black_box(&mut dst[1..=len]), 0))
        });
        group.bench_with_input(BenchmarkId::new("copy", len), &len, |b, &len| {
            b.iter(|| simd::copy(black_box(&mut dst[1..=len]), &src[..len]))
        });
    }
    group.finish();
}

fn bench_alloc(c: &mut Criterion) {
    let mut arena = Arena::default();
    c.bench_function("arena_alloc_1000x24", |b| {
        b.iter(|| {
            arena.reset();
            for _ in 0..1000 {
                black_box(arena.alloc(black_box(24)));
            }
        })
    });
}

criterion_group!(benches, bench_parse, bench_fill_copy, bench_alloc);
criterion_main!(benches);
