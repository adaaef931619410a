//! Reader for the IDX files the MNIST mirror distributes.
//!
//! All header fields are big endian `u32`:
//! - images: magic `0x00000803`, count, rows, cols, then `count * rows * cols` bytes;
//! - labels: magic `0x00000801`, count, then `count` bytes.

use super::{HEIGHT, NUM_CLASSES, WIDTH};
use crate::error::{Error, Result};
use std::path::Path;

pub const IMAGES_MAGIC: u32 = 0x0000_0803;
pub const LABELS_MAGIC: u32 = 0x0000_0801;

/// Reads an images file into one `WIDTH * HEIGHT` byte vector per image.
pub fn read_images(path: &Path) -> Result<Vec<Vec<u8>>> {
    let bytes = std::fs::read(path).map_err(Error::io(path))?;
    parse_images(&bytes).map_err(|reason| Error::InvalidIdx {
        path: path.into(),
        reason,
    })
}

/// Reads a labels file.
pub fn read_labels(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(Error::io(path))?;
    parse_labels(&bytes).map_err(|reason| Error::InvalidIdx {
        path: path.into(),
        reason,
    })
}

pub fn parse_images(bytes: &[u8]) -> Result<Vec<Vec<u8>>, String> {
    let magic = header_u32(bytes, 0)?;
    if magic != IMAGES_MAGIC {
        return Err(format!(
            "bad magic number {magic:#010x}, expected {IMAGES_MAGIC:#010x}"
        ));
    }
    let count = header_u32(bytes, 1)? as usize;
    let rows = header_u32(bytes, 2)? as usize;
    let cols = header_u32(bytes, 3)? as usize;
    if (rows, cols) != (HEIGHT, WIDTH) {
        return Err(format!(
            "images are {rows}x{cols}, expected {HEIGHT}x{WIDTH}"
        ));
    }

    let payload = &bytes[16..];
    let expected = count * WIDTH * HEIGHT;
    if payload.len() < expected {
        return Err(format!(
            "truncated payload: {} bytes for {count} images, expected {expected}",
            payload.len()
        ));
    }

    Ok(payload[..expected]
        .chunks(WIDTH * HEIGHT)
        .map(|chunk| chunk.to_vec())
        .collect())
}

pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let magic = header_u32(bytes, 0)?;
    if magic != LABELS_MAGIC {
        return Err(format!(
            "bad magic number {magic:#010x}, expected {LABELS_MAGIC:#010x}"
        ));
    }
    let count = header_u32(bytes, 1)? as usize;

    let payload = &bytes[8..];
    if payload.len() < count {
        return Err(format!(
            "truncated payload: {} bytes for {count} labels",
            payload.len()
        ));
    }
    let labels = payload[..count].to_vec();
    if let Some(label) = labels.iter().find(|&&label| label as usize >= NUM_CLASSES) {
        return Err(format!("label {label} is out of range"));
    }

    Ok(labels)
}

/// The `index`-th big endian `u32` of the header.
fn header_u32(bytes: &[u8], index: usize) -> Result<u32, String> {
    let start = index * 4;
    bytes
        .get(start..start + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| format!("truncated header ({} bytes)", bytes.len()))
}

/// Serializes images into the IDX layout. Used to build fixtures.
pub fn encode_images(images: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(16 + images.len() * WIDTH * HEIGHT);
    for field in [
        IMAGES_MAGIC,
        images.len() as u32,
        HEIGHT as u32,
        WIDTH as u32,
    ] {
        bytes.extend_from_slice(&field.to_be_bytes());
    }
    for image in images {
        bytes.extend_from_slice(image);
    }
    bytes
}

/// Serializes labels into the IDX layout. Used to build fixtures.
pub fn encode_labels(labels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + labels.len());
    bytes.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
    bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    bytes.extend_from_slice(labels);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(fill: u8) -> Vec<u8> {
        vec![fill; WIDTH * HEIGHT]
    }

    #[test]
    fn parses_encoded_images() {
        let bytes = encode_images(&[image(0), image(255), image(7)]);
        let images = parse_images(&bytes).unwrap();
        assert_eq!(images.len(), 3);
        assert!(images.iter().all(|i| i.len() == WIDTH * HEIGHT));
        assert_eq!(images[1][0], 255);
        assert_eq!(images[2][WIDTH * HEIGHT - 1], 7);
    }

    #[test]
    fn rejects_wrong_magic() {
        let bytes = encode_labels(&[1, 2, 3]);
        let err = parse_images(&bytes).unwrap_err();
        assert!(err.contains("bad magic"), "{err}");

        let bytes = encode_images(&[image(1)]);
        let err = parse_labels(&bytes).unwrap_err();
        assert!(err.contains("bad magic"), "{err}");
    }

    #[test]
    fn rejects_truncated_files() {
        let mut bytes = encode_images(&[image(1), image(2)]);
        bytes.truncate(bytes.len() - 1);
        assert!(parse_images(&bytes).unwrap_err().contains("truncated"));

        assert!(parse_labels(&[0, 0, 8]).unwrap_err().contains("header"));

        let mut bytes = encode_labels(&[1, 2, 3]);
        bytes.pop();
        assert!(parse_labels(&bytes).unwrap_err().contains("truncated"));
    }

    #[test]
    fn rejects_unexpected_dimensions() {
        let mut bytes = encode_images(&[image(1)]);
        // rows = 27
        bytes[8..12].copy_from_slice(&27u32.to_be_bytes());
        assert!(parse_images(&bytes).unwrap_err().contains("27x28"));
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let bytes = encode_labels(&[0, 9, 10]);
        assert!(parse_labels(&bytes).unwrap_err().contains("label 10"));
    }
}
