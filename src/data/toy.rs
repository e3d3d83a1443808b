//! Small built-in two-dimensional classification problems.
//!
//! Generators are deterministic functions of the sample index so a dataset
//! is identical across runs; randomness only enters through loader
//! shuffling.

use std::f64::consts::PI;

/// The four XOR truth-table rows. Class is `a XOR b`.
pub fn xor() -> (Vec<Vec<f64>>, Vec<usize>) {
    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    (inputs, vec![0, 1, 1, 0])
}

/// `n` samples of two concentric rings (class 0 = inner, class 1 = outer),
/// normalized to [0, 1].
pub fn circles(n: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut inputs = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % 2;
        let angle = (i as f64 / n as f64) * 2.0 * PI * 10.0;
        let radius = if class == 0 { 0.3 } else { 0.8 };
        let noise = 0.05 * (i as f64 * 7.3).sin();
        let x = (radius + noise) * angle.cos();
        let y = (radius + noise) * angle.sin();
        inputs.push(vec![(x + 1.0) / 2.0, (y + 1.0) / 2.0]);
        labels.push(class);
    }
    (inputs, labels)
}

/// `n` samples of two separated blobs centred at (0.3, 0.3) and (0.7, 0.7).
pub fn blobs(n: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let centers = [(0.3f64, 0.3f64), (0.7f64, 0.7f64)];
    let mut inputs = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % 2;
        let (cx, cy) = centers[class];
        let angle = i as f64 * 2.399;
        let r = 0.12 * (i as f64 * 0.31).sin().abs();
        inputs.push(vec![
            (cx + r * angle.cos()).clamp(0.0, 1.0),
            (cy + r * angle.sin()).clamp(0.0, 1.0),
        ]);
        labels.push(class);
    }
    (inputs, labels)
}

/// `n` samples spread over three interleaved spiral arms, one class per arm.
pub fn spiral(n: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    const ARMS: usize = 3;
    let per_arm = n.div_ceil(ARMS).max(1);
    let mut inputs = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % ARMS;
        let t = (i / ARMS) as f64 / per_arm as f64;
        let radius = 0.05 + 0.9 * t;
        let angle = class as f64 * 2.0 * PI / ARMS as f64 + t * 4.0 + 0.1 * (i as f64 * 3.7).sin();
        inputs.push(vec![
            (1.0 + radius * angle.cos()) / 2.0,
            (1.0 + radius * angle.sin()) / 2.0,
        ]);
        labels.push(class);
    }
    (inputs, labels)
}

/// Holds out `val_pct` percent of the samples for validation, spread evenly
/// over the generation order so both splits cover the same region.
///
/// Sample `i` is held out when `floor((i + 1) * p / 100)` steps past
/// `floor(i * p / 100)`, which selects exactly `n * p / 100` samples.
pub fn split(
    inputs: Vec<Vec<f64>>,
    labels: Vec<usize>,
    val_pct: usize,
) -> ((Vec<Vec<f64>>, Vec<usize>), (Vec<Vec<f64>>, Vec<usize>)) {
    let mut train = (Vec::new(), Vec::new());
    let mut val = (Vec::new(), Vec::new());
    for (i, (x, y)) in inputs.into_iter().zip(labels).enumerate() {
        let held_out = (i + 1) * val_pct / 100 > i * val_pct / 100;
        let (xs, ys) = if held_out { &mut val } else { &mut train };
        xs.push(x);
        ys.push(y);
    }
    (train, val)
}
