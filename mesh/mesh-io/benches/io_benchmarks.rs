//! STL read/write benchmarks.
//!
//! Run with: cargo bench -p mesh-io

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use mesh_io::{StlEncoding, load_stl, parse_stl, save_stl};
use mesh_types::icosphere;
use tempfile::tempdir;

fn bench_stl(c: &mut Criterion) {
    let mut group = c.benchmark_group("stl");
    let Ok(dir) = tempdir() else {
        return;
    };

    for subdivisions in [2, 4] {
        let mesh = icosphere(1.0, subdivisions);
        group.throughput(Throughput::Elements(mesh.faces.len() as u64));

        for encoding in [StlEncoding::Binary, StlEncoding::Ascii] {
            let path = dir
                .path()
                .join(format!("sphere_{subdivisions}_{encoding:?}.stl"));
            let label = format!("{encoding:?}/{subdivisions}");

            group.bench_function(format!("save/{label}"), |b| {
                b.iter(|| save_stl(black_box(&mesh), &path, encoding));
            });

            if save_stl(&mesh, &path, encoding).is_err() {
                continue;
            }
            group.bench_function(format!("load/{label}"), |b| {
                b.iter(|| load_stl(black_box(&path)));
            });

            if let Ok(bytes) = std::fs::read(&path) {
                group.bench_function(format!("parse/{label}"), |b| {
                    b.iter(|| parse_stl(black_box(&bytes)));
                });
            }
        }
    }

    group.finish();
}

criterion_group!(benches, bench_stl);
criterion_main!(benches);
