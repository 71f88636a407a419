//! Benchmarks exporting an animated sequence of a grid mesh.
//!
//! With validity intervals covering the sequence most frames skip writing, compare against the
//! run without intervals to see the savings.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scenemesh::convert::{ChannelIntervals, ExportContext, ExportOptions, MeshExporter};
use scenemesh::interval::ClosedInterval;
use scenemesh::scene::{MeshNode, NodePath};
use scenemesh::{MapChannel, MeshFacade, NativeMesh, PolyMesh};

/// A flat `n` by `n` grid of quads with a per-vertex texture channel.
fn grid(n: usize) -> PolyMesh {
    let mut points = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            points.push([i as f32, j as f32, 0.0]);
        }
    }
    let mut faces = Vec::with_capacity(5 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v = j * (n + 1) + i;
            faces.extend_from_slice(&[4, v, v + 1, v + n + 2, v + n + 1]);
        }
    }
    let mut mesh = PolyMesh::new(points, &faces);
    let uvs = mesh
        .vertex_positions
        .iter()
        .map(|p| [p[0] / n as f32, p[1] / n as f32, 0.0])
        .collect();
    let indices = mesh.indices.clone();
    mesh.set_channel(1, MapChannel::new(uvs, indices));
    mesh
}

fn export_frames(native: &mut NativeMesh, frames: usize, intervals: ChannelIntervals) -> MeshNode {
    let options = ExportOptions::default();
    let exporter = MeshExporter::new(&options);
    let mut node = MeshNode::new(NodePath::new("/grid").unwrap());
    for f in 0..frames {
        let mut facade = MeshFacade::borrowed(native);
        let ctx = ExportContext::frame(f as f64, intervals);
        exporter.export(&mut facade, &mut node, &ctx).unwrap();
    }
    node
}

fn bench_export_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_sequence");
    let frames = 24;
    for n in [16, 64] {
        let static_intervals = ChannelIntervals::uniform(ClosedInterval::new(0.0, frames as f64));
        group.bench_with_input(BenchmarkId::new("static_intervals", n), &n, |b, &n| {
            let mut native = NativeMesh::from(grid(n));
            b.iter(|| black_box(export_frames(&mut native, frames, static_intervals)));
        });
        group.bench_with_input(BenchmarkId::new("unknown_intervals", n), &n, |b, &n| {
            let mut native = NativeMesh::from(grid(n));
            b.iter(|| black_box(export_frames(&mut native, frames, ChannelIntervals::unknown())));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_export_sequence);
criterion_main!(benches);
