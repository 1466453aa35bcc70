use aoi_pipeline::{
    DetectionWorker, DetectorBinding, FailurePolicy, Frame, FrameChannel, HandDetection, Marker,
    MarkerSnapshot, SessionConfig, StubHandDetector, StubMarkerDetector, WorkerContext, WorkerPool,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::RgbImage;
use rand::Rng;
use std::sync::Arc;

/// Create test frame data
fn create_test_image(width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = image::Rgb([(x % 255) as u8, (y % 255) as u8, ((x ^ y) % 255) as u8]);
    }
    image
}

fn random_markers(count: usize, width: u32, height: u32) -> Vec<Marker> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let size = rng.gen_range(20..60);
            let x = rng.gen_range(0..width as i32 - size);
            let y = rng.gen_range(0..height as i32 - size);
            Marker::square(i as u32, x, y, size)
        })
        .collect()
}

fn random_hands(count: usize) -> Vec<HandDetection> {
    let mut rng = rand::thread_rng();
    let params = SessionConfig::default().capability_params();
    (0..count)
        .map(|_| {
            let y = rng.gen_range(0.0..0.7);
            let x = rng.gen_range(0.0..0.7);
            HandDetection::from_normalized([y, x, y + 0.2, x + 0.2], rng.gen_range(0.1..1.0), &params)
        })
        .collect()
}

fn context(queue_size: usize, markers: usize) -> WorkerContext {
    let config = SessionConfig::default();
    WorkerContext {
        input: FrameChannel::new(queue_size),
        output: FrameChannel::new(queue_size),
        detectors: vec![
            DetectorBinding::unbounded(Arc::new(StubHandDetector::new(random_hands(4)))),
            DetectorBinding::unbounded(Arc::new(StubMarkerDetector::new(random_markers(
                markers,
                config.width,
                config.height,
            )))),
        ],
        params: Arc::new(config.capability_params()),
        markers: Some(MarkerSnapshot::default()),
        failure_policy: FailurePolicy::Propagate,
    }
}

/// One worker compositing a single frame, no channels involved
fn bench_single_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_frame");
    let frame = Frame::new(0, create_test_image(888, 500));

    for markers in [4, 16, 64] {
        let worker = DetectionWorker::new(0, context(1, markers));
        group.bench_with_input(BenchmarkId::new("process", markers), &markers, |b, _| {
            b.iter(|| worker.process(&frame).unwrap())
        });
    }

    group.finish();
}

/// Frames pushed through the pool, measuring end-to-end throughput
fn bench_pool_throughput(c: &mut Criterion) {
    const BATCH: u64 = 32;
    let mut group = c.benchmark_group("pool_throughput");
    group.throughput(Throughput::Elements(BATCH));
    group.sample_size(20);
    let image = create_test_image(888, 500);

    for workers in [1, 2, 4, 8] {
        let pool = WorkerPool::new(workers, context(8, 16)).unwrap();
        let (input, output) = (pool.input().clone(), pool.output().clone());

        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, _| {
            b.iter(|| {
                let feeder = {
                    let input = input.clone();
                    let image = image.clone();
                    std::thread::spawn(move || {
                        for id in 0..BATCH {
                            input.put(Some(Frame::new(id, image.clone()))).unwrap();
                        }
                    })
                };
                for _ in 0..BATCH {
                    output.get().unwrap().unwrap();
                }
                feeder.join().unwrap();
            })
        });

        drop(pool);
    }

    group.finish();
}

criterion_group!(benches, bench_single_frame, bench_pool_throughput);
criterion_main!(benches);
