use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sweepclip::{
    generators::{checkerboard, slanted_checkerboard, slanties, star},
    BinaryOp, Options,
};

fn checkerboards(c: &mut Criterion) {
    let (even, odd) = checkerboard(10);
    let clips = [odd];

    for op in [BinaryOp::Union, BinaryOp::Intersection, BinaryOp::Xor] {
        c.bench_function(&format!("checkerboard {op}"), |b| {
            b.iter(|| black_box(sweepclip::run(op, &even, &clips, &Options::default())))
        });
    }

    let (even, odd) = slanted_checkerboard(10);
    let clips = [odd];
    c.bench_function("slanted checkerboard xor", |b| {
        b.iter(|| black_box(sweepclip::xor(&even, &clips)))
    });
}

fn crossings(c: &mut Criterion) {
    let (even, odd) = slanties(10);
    let clips = [odd];
    c.bench_function("slanties intersection", |b| {
        b.iter(|| black_box(sweepclip::intersection(&even, &clips)))
    });

    let a = star((0.0, 0.0), 100.0, 128);
    let clips = [star((30.0, 10.0), 100.0, 128)];
    c.bench_function("stars difference", |b| {
        b.iter(|| black_box(sweepclip::difference(&a, &clips)))
    });

    let options = Options {
        epsilon: Some(1e-9),
        ..Options::default()
    };
    c.bench_function("stars difference with snapping", |b| {
        b.iter(|| black_box(sweepclip::run(BinaryOp::Difference, &a, &clips, &options)))
    });
}

criterion_group!(benches, checkerboards, crossings);
criterion_main!(benches);
