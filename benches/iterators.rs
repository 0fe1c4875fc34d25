use criterion::{criterion_group, criterion_main, Criterion};
use piece_tree::{EndOfLine, PieceTree};

const CAP: u64 = 1_000_000;
const LARGE: &str = include_str!("large.txt");

fn insert(c: &mut Criterion) {
    c.bench_function("insert_start", |bench| {
        let mut pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
        bench.iter(move || {
            if pt.length() >= CAP {
                pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
            }
            pt.insert(0, "a", true);
        });
    });

    c.bench_function("insert_middle", |bench| {
        let mut pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
        bench.iter(move || {
            if pt.length() >= CAP {
                pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
            }
            let mid = (pt.length() + 1) / 2;
            pt.insert(mid, "a", true);
        });
    });

    c.bench_function("insert_end", |bench| {
        let mut pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
        bench.iter(move || {
            if pt.length() >= CAP {
                pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
            }
            let end = pt.length();
            pt.insert(end, "a", true);
        });
    });
}

fn full_pt() -> PieceTree {
    let mut pt = PieceTree::new(Vec::new(), EndOfLine::LF, true);
    while pt.length() < CAP {
        pt.insert(0, LARGE, true);
    }
    pt
}

fn delete(c: &mut Criterion) {
    c.bench_function("delete_start", |bench| {
        let mut pt = full_pt();
        bench.iter(move || {
            if pt.length() == 0 {
                pt = full_pt();
            }
            pt.delete(0, 1);
        });
    });

    c.bench_function("delete_middle", |bench| {
        let mut pt = full_pt();
        bench.iter(move || {
            if pt.length() == 0 {
                pt = full_pt();
            }
            let mid = (pt.length() + 1) / 2;
            pt.delete(mid, 1);
        });
    });

    c.bench_function("delete_end", |bench| {
        let mut pt = full_pt();
        bench.iter(move || {
            if pt.length() == 0 {
                pt = full_pt();
            }
            let end = pt.length();
            pt.delete(end.saturating_sub(1), 1);
        });
    });
}

fn iterate(c: &mut Criterion) {
    c.bench_function("iterate_whole_document", |bench| {
        let pt = full_pt();
        bench.iter(|| {
            let mut total = 0u64;
            pt.iterate(|units| {
                total += units.len() as u64;
                true
            });
            total
        });
    });

    c.bench_function("position_at_random_offsets", |bench| {
        let pt = full_pt();
        let len = pt.length();
        bench.iter(|| {
            let mut acc = (0u64, 0u64);
            let mut offset = 0;
            while offset < len {
                acc = pt.position_at(offset);
                offset += 997;
            }
            acc
        });
    });
}

criterion_group!(benches, insert, delete, iterate);
criterion_main!(benches);
