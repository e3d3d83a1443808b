//! Parse a pair of IDX binary files (image + label) as used by MNIST and
//! Fashion-MNIST.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (big-endian u32)
//! bytes 12-15:  cols        (big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00
//! byte   2:     0x08
//! byte   3:     0x01
//! bytes  4-7:   N           (big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```
//!
//! Returns `(inputs, labels)` with pixels scaled to `[0.0, 1.0]` and labels
//! as class indices.

use crate::error::{Result, TrainError};

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

fn check_header(bytes: &[u8], min_len: usize, dims: u8, what: &str) -> Result<()> {
    if bytes.len() < min_len {
        return Err(TrainError::dataset(format!(
            "IDX {} file too short: expected at least {} header bytes, got {}",
            what,
            min_len,
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(TrainError::dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00, got 0x{:02X} 0x{:02X}",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(TrainError::dataset(format!(
            "IDX {} file: dtype byte must be 0x08 (uint8), got 0x{:02X}",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(TrainError::dataset(format!(
            "IDX {} file: expected {} dimensions, got {}",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
) -> Result<(Vec<Vec<f64>>, Vec<usize>)> {
    check_header(image_bytes, 16, 3, "image")?;
    check_header(label_bytes, 8, 1, "label")?;

    let n_items = be_u32(image_bytes, 4);
    let rows = be_u32(image_bytes, 8);
    let cols = be_u32(image_bytes, 12);
    let n_pixels = rows.checked_mul(cols)
        .ok_or_else(|| TrainError::dataset("IDX image file: rows * cols overflows"))?;
    let required = n_items.checked_mul(n_pixels)
        .and_then(|n| n.checked_add(16))
        .ok_or_else(|| TrainError::dataset("IDX image file: data length overflows"))?;
    if image_bytes.len() < required {
        return Err(TrainError::dataset(format!(
            "IDX image file too short: header declares {} images of {}×{}, file is {} bytes",
            n_items, rows, cols, image_bytes.len()
        )));
    }

    let n_labels = be_u32(label_bytes, 4);
    if n_labels != n_items {
        return Err(TrainError::dataset(format!(
            "IDX files disagree: {} images but {} labels",
            n_items, n_labels
        )));
    }
    if label_bytes.len() < 8 + n_labels {
        return Err(TrainError::dataset(format!(
            "IDX label file too short: header declares {} labels, file is {} bytes",
            n_labels,
            label_bytes.len()
        )));
    }

    let labels: Vec<usize> = label_bytes[8..8 + n_labels].iter().map(|&b| b as usize).collect();
    if let Some(bad) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(TrainError::dataset(format!(
            "IDX label {} out of range for {} classes",
            bad, n_classes
        )));
    }

    let inputs = image_bytes[16..required]
        .chunks(n_pixels.max(1))
        .take(n_items)
        .map(|chunk| chunk.iter().map(|&p| p as f64 / 255.0).collect())
        .collect();

    Ok((inputs, labels))
}

#[cfg(test)]
pub(crate) fn encode_idx_pair(images: &[Vec<u8>], rows: u32, cols: u32, labels: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut img = vec![0, 0, 0x08, 0x03];
    img.extend_from_slice(&(images.len() as u32).to_be_bytes());
    img.extend_from_slice(&rows.to_be_bytes());
    img.extend_from_slice(&cols.to_be_bytes());
    for image in images {
        img.extend_from_slice(image);
    }
    let mut lbl = vec![0, 0, 0x08, 0x01];
    lbl.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    lbl.extend_from_slice(labels);
    (img, lbl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_images() {
        let (img, lbl) = encode_idx_pair(&[vec![0, 255, 0, 0], vec![255, 255, 255, 255]], 2, 2, &[3, 7]);
        let (inputs, labels) = parse_idx_pair(&img, &lbl, 10).unwrap();
        assert_eq!(labels, vec![3, 7]);
        assert_eq!(inputs[0], vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(inputs[1].len(), 4);
    }

    #[test]
    fn test_rejects_label_count_mismatch() {
        let (img, lbl) = encode_idx_pair(&[vec![0; 4]], 2, 2, &[1, 2]);
        assert!(parse_idx_pair(&img, &lbl, 10).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_label() {
        let (img, lbl) = encode_idx_pair(&[vec![0; 4]], 2, 2, &[10]);
        assert!(parse_idx_pair(&img, &lbl, 10).is_err());
    }

    #[test]
    fn test_rejects_wrong_dimensions() {
        let (mut img, lbl) = encode_idx_pair(&[vec![0; 4]], 2, 2, &[1]);
        img[3] = 0x02;
        assert!(parse_idx_pair(&img, &lbl, 10).is_err());
    }
}
