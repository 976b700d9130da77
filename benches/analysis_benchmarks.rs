//! Benchmarks for signature building, cut detection and sampling.
//!
//! Run with: cargo bench
//! Run with rayon: cargo bench --features rayon
//!
//! The sampling benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`; the others use synthetic frames.

use std::{path::Path, time::Duration};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use vidfeatures::{
    FfmpegLogLevel, Frame, Signature, detect_cuts, sample_frames, set_ffmpeg_log_level,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Frames cycling through a few gradients so consecutive signatures differ.
fn synthetic_frames(count: u64, width: u32, height: u32) -> Vec<Frame> {
    (0..count)
        .map(|index| {
            let phase = (index % 4) as u32 * 40;
            let image = RgbImage::from_fn(width, height, |x, y| {
                let value = ((x + y + phase) % 256) as u8;
                Rgb([value, value / 2, 255 - value])
            });
            Frame::new(index * 10, image)
        })
        .collect()
}

fn benchmark_signature(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("signature");
    for (width, height) in [(320, 240), (1280, 720), (1920, 1080)] {
        let frame = synthetic_frames(1, width, height).remove(0);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &frame,
            |bencher, frame| {
                bencher.iter(|| Signature::from_image(frame.image()));
            },
        );
    }
    group.finish();
}

fn benchmark_cut_detection(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("detect cuts");
    for count in [10, 100] {
        let frames = synthetic_frames(count, 640, 360);
        group.bench_with_input(BenchmarkId::from_parameter(count), &frames, |bencher, frames| {
            bencher.iter(|| detect_cuts(frames, 25.0));
        });
    }
    group.finish();
}

fn benchmark_sampling(criterion: &mut Criterion) {
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    criterion.bench_function("sample every 10th frame", |bencher| {
        bencher.iter(|| sample_frames(SAMPLE_VIDEO, 10).unwrap());
    });

    criterion.bench_function("sample every frame", |bencher| {
        bencher.iter(|| sample_frames(SAMPLE_VIDEO, 1).unwrap());
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(5));
    targets = benchmark_signature, benchmark_cut_detection, benchmark_sampling
}
criterion_main!(benches);
