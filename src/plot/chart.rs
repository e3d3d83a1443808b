use std::path::Path;

use image::{Rgb, RgbImage};
use tracing::info;

use crate::error::Result;
use crate::train::TrainingHistory;

pub const PANEL_WIDTH: u32 = 600;
pub const PANEL_HEIGHT: u32 = 400;
const MARGIN: u32 = 40;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const TRAIN: Rgb<u8> = Rgb([31, 119, 180]);
const VAL: Rgb<u8> = Rgb([255, 127, 14]);

/// Plot area of one panel in image coordinates, with the value range
/// mapped onto it.
struct Panel {
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
    lo: f64,
    hi: f64,
}

impl Panel {
    fn new(index: u32, lo: f64, hi: f64) -> Panel {
        Panel {
            x0: index * PANEL_WIDTH + MARGIN,
            y0: MARGIN,
            width: PANEL_WIDTH - 2 * MARGIN,
            height: PANEL_HEIGHT - 2 * MARGIN,
            lo,
            hi,
        }
    }

    fn point(&self, i: usize, n: usize, value: f64) -> (i64, i64) {
        let fx = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
        let fy = ((value - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0);
        let x = self.x0 as f64 + fx * self.width as f64;
        let y = (self.y0 + self.height) as f64 - fy * self.height as f64;
        (x.round() as i64, y.round() as i64)
    }

    fn draw_frame(&self, img: &mut RgbImage) {
        for k in 1..4 {
            let y = (self.y0 + self.height * k / 4) as i64;
            line(img, (self.x0 as i64, y), ((self.x0 + self.width) as i64, y), GRID);
        }
        let (l, t) = (self.x0 as i64, self.y0 as i64);
        let (r, b) = ((self.x0 + self.width) as i64, (self.y0 + self.height) as i64);
        line(img, (l, t), (l, b), AXIS);
        line(img, (l, b), (r, b), AXIS);
    }

    fn draw_series(&self, img: &mut RgbImage, values: &[f64], color: Rgb<u8>) {
        let n = values.len();
        let points: Vec<(i64, i64)> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| self.point(i, n, *v))
            .collect();
        for pair in points.windows(2) {
            line(img, pair[0], pair[1], color);
        }
        for &(x, y) in &points {
            for dx in -2..=2 {
                for dy in -2..=2 {
                    put(img, x + dx, y + dy, color);
                }
            }
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, two pixels thick.
fn line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x, y, color);
        put(img, x, y + 1, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Padded value range covering every finite value of both series.
fn loss_range(a: &[f64], b: &[f64]) -> (f64, f64) {
    let finite = a.iter().chain(b.iter()).copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    ((lo - pad).max(0.0), hi + pad)
}

/// Two side-by-side panels: loss on the left, accuracy (0–100) on the
/// right. Training curves are blue, validation curves orange.
pub fn render(history: &TrainingHistory) -> RgbImage {
    let mut img = RgbImage::from_pixel(2 * PANEL_WIDTH, PANEL_HEIGHT, BACKGROUND);

    let (lo, hi) = loss_range(&history.train_loss, &history.val_loss);
    let loss = Panel::new(0, lo, hi);
    let accuracy = Panel::new(1, 0.0, 100.0);

    loss.draw_frame(&mut img);
    accuracy.draw_frame(&mut img);
    loss.draw_series(&mut img, &history.train_loss, TRAIN);
    loss.draw_series(&mut img, &history.val_loss, VAL);
    accuracy.draw_series(&mut img, &history.train_acc, TRAIN);
    accuracy.draw_series(&mut img, &history.val_acc, VAL);
    img
}

pub fn save_plot(history: &TrainingHistory, path: &Path) -> Result<()> {
    render(history).save(path)?;
    info!("Saved training plot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::EpochMetrics;
    use tempfile::TempDir;

    fn history() -> TrainingHistory {
        let mut h = TrainingHistory::default();
        for (i, (loss, acc)) in [(0.9, 40.0), (0.6, 65.0), (0.4, 80.0)].into_iter().enumerate() {
            let train = EpochMetrics { loss, accuracy: acc, correct: 0, total: 0 };
            let val = EpochMetrics { loss: loss + 0.3, accuracy: acc - 20.0, correct: 0, total: 0 };
            h.push(i, &train, &val);
        }
        h
    }

    #[test]
    fn test_render_draws_both_series() {
        let img = render(&history());
        assert_eq!(img.dimensions(), (2 * PANEL_WIDTH, PANEL_HEIGHT));
        assert!(img.pixels().any(|p| *p == TRAIN));
        assert!(img.pixels().any(|p| *p == VAL));
    }

    #[test]
    fn test_empty_history_still_renders() {
        let img = render(&TrainingHistory::default());
        assert!(img.pixels().all(|p| *p != TRAIN && *p != VAL));
    }

    #[test]
    fn test_save_writes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train_MLP_XOR.png");
        save_plot(&history(), &path).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!(back.width(), 2 * PANEL_WIDTH);
    }

    #[test]
    fn test_flat_loss_gets_a_range() {
        assert_eq!(loss_range(&[0.5], &[0.5]), (0.0, 1.5));
        assert_eq!(loss_range(&[], &[]), (0.0, 1.0));
    }
}
