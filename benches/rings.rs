use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ringcraft::{MolReader, Molecule, SdfBlocks};

const ADAMANTANE: &str = include_str!("../tests/fixtures/adamantane.sdf");
const CUBANE: &str = include_str!("../tests/fixtures/cubane.sdf");
const CITALOPRAM: &str = include_str!("../tests/fixtures/citalopram.sdf");
const SPIRO_OCTAMER: &str = include_str!("../tests/fixtures/eight-spiro-hexanes.sdf");

fn parse(text: &str) -> Molecule {
    let block = SdfBlocks::new(std::io::Cursor::new(text))
        .next()
        .expect("fixture has a block")
        .expect("fixture reads");
    MolReader::new().parse(&block).expect("fixture parses")
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("adamantane", |b| {
        b.iter(|| black_box(parse(black_box(ADAMANTANE))))
    });
    group.bench_function("citalopram", |b| {
        b.iter(|| black_box(parse(black_box(CITALOPRAM))))
    });

    group.finish();
}

fn bench_normalise(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalise");

    group.bench_function("adamantane", |b| {
        b.iter_batched(
            || parse(ADAMANTANE),
            |mut mol| {
                mol.normalise().unwrap();
                black_box(mol)
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("cubane", |b| {
        b.iter_batched(
            || parse(CUBANE),
            |mut mol| {
                mol.normalise().unwrap();
                black_box(mol)
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("citalopram", |b| {
        b.iter_batched(
            || parse(CITALOPRAM),
            |mut mol| {
                mol.normalise().unwrap();
                black_box(mol)
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("eight-spiro-hexanes", |b| {
        b.iter_batched(
            || parse(SPIRO_OCTAMER),
            |mut mol| {
                mol.normalise().unwrap();
                black_box(mol)
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_normalise);
criterion_main!(benches);
