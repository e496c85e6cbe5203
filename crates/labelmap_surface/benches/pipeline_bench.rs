//! Pipeline benchmarks: label discovery, per-label extraction, codec and
//! the offloaded round trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use labelmap_surface::protocol::ExtractionRequest;
use labelmap_surface::wire::{decode_request, encode_request};
use labelmap_surface::{
  discover_labels, extract_surfaces, labelmap_to_surfaces, serialize_volume, ExecutionMode,
  ExtractionOptions, Scalars, VolumeImage,
};

/// `size`³ volume of `labels` interleaved blobs (U16 labels).
fn blob_labelmap(size: u32, labels: u16) -> VolumeImage {
  let cell = (size / 4).max(1);
  let mut values = Vec::with_capacity((size * size * size) as usize);

  for z in 0..size {
    for y in 0..size {
      for x in 0..size {
        let block = (x / cell) + 4 * (y / cell) + 16 * (z / cell);
        let label = (block % (labels as u32 + 1)) as u16;
        values.push(label);
      }
    }
  }

  VolumeImage::with_scalars([size; 3], Scalars::U16(values)).unwrap()
}

fn bench_discover_labels(c: &mut Criterion) {
  let mut group = c.benchmark_group("discover_labels");

  for size in [32u32, 64] {
    let volume = blob_labelmap(size, 8);
    group.throughput(Throughput::Elements(volume.voxel_count() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &volume, |b, volume| {
      b.iter(|| discover_labels(black_box(volume)))
    });
  }

  group.finish();
}

fn bench_extract_surfaces(c: &mut Criterion) {
  let mut group = c.benchmark_group("extract_surfaces");
  group.sample_size(20);

  for labels in [1u16, 4, 8] {
    let volume = blob_labelmap(32, labels);
    group.bench_with_input(BenchmarkId::new("labels", labels), &volume, |b, volume| {
      b.iter(|| extract_surfaces(black_box(volume), None).unwrap())
    });
  }

  group.finish();
}

fn bench_wire(c: &mut Criterion) {
  let volume = blob_labelmap(64, 8);
  let request = ExtractionRequest::new(serialize_volume(&volume), None);
  let bytes = encode_request(&request);

  let mut group = c.benchmark_group("wire");
  group.throughput(Throughput::Bytes(bytes.len() as u64));
  group.bench_function("encode_request", |b| b.iter(|| encode_request(black_box(&request))));
  group.bench_function("decode_request", |b| {
    b.iter(|| decode_request(black_box(&bytes)).unwrap())
  });
  group.finish();
}

fn bench_modes(c: &mut Criterion) {
  let mut group = c.benchmark_group("labelmap_to_surfaces");
  group.sample_size(20);
  let volume = blob_labelmap(32, 4);

  for (name, mode) in [
    ("synchronous", ExecutionMode::Synchronous),
    ("offloaded", ExecutionMode::Offloaded),
  ] {
    let options = ExtractionOptions::default().with_mode(mode);
    group.bench_function(name, |b| {
      b.iter(|| {
        labelmap_to_surfaces(black_box(&volume), &options)
          .unwrap()
          .wait()
          .unwrap()
      })
    });
  }

  group.finish();
}

criterion_group!(
  benches,
  bench_discover_labels,
  bench_extract_surfaces,
  bench_wire,
  bench_modes,
);
criterion_main!(benches);
