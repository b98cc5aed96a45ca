use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_disparity_export::mcmanamon::{McManamon, Params};
use cv_disparity_export::prelude::*;

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

fn synthetic_pair() -> DisparityPair {
    let field = |scale: f32| {
        let data = (0..WIDTH * HEIGHT)
            .map(|i| ((i % WIDTH) as f32 * scale) % 97.0 - 3.0)
            .collect();
        DisparityField::from_vec(WIDTH, HEIGHT, data).unwrap()
    };

    DisparityPair {
        left: field(0.31),
        right: field(0.29)
    }
}

fn normalise_bench(c: &mut Criterion) {
    let disp = synthetic_pair();

    c.bench_function("normalise_pair 640x480", |b| b.iter(|| normalise_pair(black_box(&disp))));
}

fn mcmanamon_bench(c: &mut Criterion) {
    let (width, height) = (160, 120);
    let left: Vec<u8> = (0..width * height).map(|i| ((i % width) * 37 % 251) as u8).collect();
    let right: Vec<u8> = (0..width * height).map(|i| ((i % width + 4) * 37 % 251) as u8).collect();
    let dims = Dims::new(width, height);

    let mut left_disp = vec![0.0; dims.len()];
    let mut right_disp = vec![0.0; dims.len()];

    // Build disparity alg
    let mut disp = McManamon::new(Params {
        max_disparity: 16,
        dyn_disparity_threshold: 4,
        correlation_window_size: (7, 7),
        ..Default::default()
    });

    c.bench_function("mcmanamon 160x120", |b| {
        b.iter(|| disp.compute(&left, &right, &dims, &mut left_disp, &mut right_disp))
    });
}

criterion_group!(benches, normalise_bench, mcmanamon_bench);
criterion_main!(benches);
