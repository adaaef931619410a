//! Shared fixtures for unit tests.

use crate::mnist::{HEIGHT, MnistBatch, MnistBatcher, MnistItem, NUM_CLASSES, WIDTH};
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

pub type TestBackend = burn::backend::NdArray<f32>;
pub type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

/// A learnable stand-in for MNIST: class `c` lights up the rows `2c + 4..2c + 6`,
/// with a per-item shift of the lit columns.
pub fn synthetic_item(index: usize) -> MnistItem {
    let label = index % NUM_CLASSES;
    let shift = (index / NUM_CLASSES) % 4;
    let mut image = vec![0u8; WIDTH * HEIGHT];
    for row in 2 * label + 4..2 * label + 6 {
        for col in 4 + shift..20 + shift {
            image[row * WIDTH + col] = 255;
        }
    }
    MnistItem {
        image,
        label: label as u8,
    }
}

pub fn synthetic_items(count: usize) -> Vec<MnistItem> {
    (0..count).map(synthetic_item).collect()
}

pub fn synthetic_batch<B: Backend>(batch_size: usize, device: &B::Device) -> MnistBatch<B> {
    MnistBatcher::default().batch(synthetic_items(batch_size), device)
}
