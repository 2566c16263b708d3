#![allow(clippy::unwrap_used, clippy::expect_used, clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sectormer::format::SequenceFormat;
use sectormer::packed_kmer::PackedKmer;
use sectormer::scanner::{scan, ScanControl};
use sectormer::sectorizer::Sector;
use sectormer::sort_stage::sort_sector;
use sectormer::spill::spill_pass;
use std::io::Write;
use tempfile::NamedTempFile;

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("PackedKmer::push");

    for k in [5, 11, 21, 31, 63] {
        let seq = "ACGT".repeat(k / 4 + 1);
        let bytes = seq.as_bytes()[..k].to_vec();

        group.bench_with_input(BenchmarkId::from_parameter(k), &bytes, |b, bytes| {
            b.iter(|| black_box(PackedKmer::from_bases(bytes)))
        });
    }

    group.finish();
}

fn bench_truncate(c: &mut Criterion) {
    let mut group = c.benchmark_group("PackedKmer::truncate");

    for k in [5, 11, 21, 31, 63] {
        let seq = "ACGT".repeat(k / 4 + 1);
        let kmer = PackedKmer::from_bases(&seq.as_bytes()[..k]).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(k), &kmer, |b, kmer| {
            b.iter(|| {
                let mut t = *kmer;
                t.truncate(black_box(k as u32 / 2));
                black_box(t)
            })
        });
    }

    group.finish();
}

fn bench_cmp(c: &mut Criterion) {
    let mut group = c.benchmark_group("PackedKmer::cmp_key");

    for k in [5, 11, 21, 31, 63] {
        let seq = "ACGT".repeat(k / 4 + 1);
        let a = PackedKmer::from_bases(&seq.as_bytes()[..k]).unwrap();
        let b_kmer = PackedKmer::from_bases(&"T".repeat(k).as_bytes()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(k), &(a, b_kmer), |bencher, &(a, b_kmer)| {
            bencher.iter(|| black_box(a.cmp_key(&b_kmer)))
        });
    }

    group.finish();
}

fn bench_canonical(c: &mut Criterion) {
    let mut group = c.benchmark_group("PackedKmer::canonical");

    for k in [5, 11, 21, 31] {
        let seq = "ACGT".repeat(k / 4 + 1);
        let kmer = PackedKmer::from_bases(&seq.as_bytes()[..k]).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(k), &kmer, |b, kmer| {
            b.iter(|| black_box(kmer.canonical()))
        });
    }

    group.finish();
}

fn bench_minimer_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("PackedKmer::to_minimer/from_minimer");

    for k in [5, 11, 21, 31, 63] {
        let seq = "ACGT".repeat(k / 4 + 1);
        let kmer = PackedKmer::from_bases(&seq.as_bytes()[..k]).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(k), &kmer, |b, kmer| {
            b.iter(|| black_box(PackedKmer::from_minimer(kmer.to_minimer())))
        });
    }

    group.finish();
}

fn synthetic_fasta(records: usize, bases_per_record: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let seq = "ACGTACGTACGTACGTACGTACGTACGTACGT".repeat(bases_per_record / 32 + 1);
    for i in 0..records {
        writeln!(file, ">seq{i}").unwrap();
        writeln!(file, "{}", &seq[..bases_per_record]).unwrap();
    }
    file
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner::scan");
    let file = synthetic_fasta(100, 320);

    group.bench_function("scan_320bp_x100", |b| {
        b.iter(|| {
            let mut count = 0u64;
            scan(std::fs::File::open(file.path()).unwrap(), 21, 21, SequenceFormat::Auto, |kmer| {
                count += black_box(kmer).len() as u64;
                ScanControl::Continue
            })
            .unwrap();
            black_box(count)
        })
    });

    group.finish();
}

fn bench_spill_and_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("spill_then_sort");
    let file = synthetic_fasta(200, 320);
    let sectors = vec![Sector { lo: 0, hi: 4096 }];

    group.bench_function("spill_sort_320bp_x200", |b| {
        b.iter(|| {
            let spilled = spill_pass(
                std::fs::File::open(file.path()).unwrap(),
                &sectors,
                21,
                21,
                SequenceFormat::Auto,
                false,
                1024,
            )
            .unwrap();
            for s in spilled {
                black_box(sort_sector(s).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_push,
    bench_truncate,
    bench_cmp,
    bench_canonical,
    bench_minimer_roundtrip,
    bench_scan,
    bench_spill_and_sort,
);

criterion_main!(benches);
