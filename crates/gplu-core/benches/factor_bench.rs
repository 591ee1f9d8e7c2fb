//! Benchmarks for sparse LU factorization
//!
//! Banded matrices (little fill) against random sparse matrices (heavy fill),
//! with partial pivoting, threshold pivoting and an incomplete factorization.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gplu_core::{CscMatrix, FactorOptions, Factorization};
use std::hint::black_box;

/// Banded matrix with `bandwidth` off-diagonals on each side
fn banded_matrix(n: usize, bandwidth: usize) -> CscMatrix {
    let mut triplets = Vec::new();
    for col in 0..n {
        let lo = col.saturating_sub(bandwidth);
        let hi = (col + bandwidth).min(n - 1);
        for row in lo..=hi {
            let value = if row == col {
                2.0 * bandwidth as f64 + 1.0
            } else {
                -1.0
            };
            triplets.push((row, col, value));
        }
    }
    CscMatrix::from_triplets(n, n, &triplets).expect("Failed to build banded matrix")
}

/// Random sparse matrix with a dominant diagonal, `per_col` extra entries per column
fn random_sparse_matrix(n: usize, per_col: usize) -> CscMatrix {
    let mut seed = 12345u64;
    let mut triplets = Vec::with_capacity(n * (per_col + 1));
    for col in 0..n {
        triplets.push((col, col, per_col as f64 + 1.0));
        for _ in 0..per_col {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let row = (seed % n as u64) as usize;
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let value = (seed % 10000) as f64 / 10000.0 - 0.5;
            if row != col {
                triplets.push((row, col, value));
            }
        }
    }
    CscMatrix::from_triplets(n, n, &triplets).expect("Failed to build random matrix")
}

fn bench_factor(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor");

    for &n in [200usize, 1000, 5000].iter() {
        let banded = banded_matrix(n, 3);
        group.throughput(Throughput::Elements(banded.nnz() as u64));
        group.bench_with_input(BenchmarkId::new("banded_partial", n), &banded, |b, a| {
            b.iter(|| Factorization::factor(black_box(&a.view()), &FactorOptions::default()))
        });
        group.bench_with_input(BenchmarkId::new("banded_threshold", n), &banded, |b, a| {
            b.iter(|| Factorization::factor(black_box(&a.view()), &FactorOptions::threshold(0.1)))
        });
    }

    for &n in [100usize, 300, 1000].iter() {
        let random = random_sparse_matrix(n, 4);
        group.throughput(Throughput::Elements(random.nnz() as u64));
        group.bench_with_input(BenchmarkId::new("random_partial", n), &random, |b, a| {
            b.iter(|| Factorization::factor(black_box(&a.view()), &FactorOptions::default()))
        });
        let ilu = FactorOptions::threshold(0.1).with_drop_tolerance(1e-2);
        group.bench_with_input(BenchmarkId::new("random_incomplete", n), &random, |b, a| {
            b.iter(|| Factorization::factor_incomplete(black_box(&a.view()), &a.view(), None, &ilu))
        });
    }

    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");

    for &n in [1000usize, 5000].iter() {
        let a = banded_matrix(n, 3);
        let lu = Factorization::factor(&a.view(), &FactorOptions::default())
            .expect("Failed to factor banded matrix");
        let rhs = vec![1.0; n];
        group.bench_with_input(BenchmarkId::new("banded", n), &lu, |b, lu| {
            b.iter(|| {
                let mut x = rhs.clone();
                lu.solve(black_box(&mut x)).expect("solve failed");
                x
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_factor, bench_solve);
criterion_main!(benches);
