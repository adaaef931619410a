//! The MNIST handwritten-digit dataset and its batcher.

pub mod batcher;
pub mod dataset;
pub mod idx;

pub use batcher::{MnistBatch, MnistBatcher, denormalize_pixel, normalize_image};
pub use dataset::{MnistDataset, MnistItem, Split};

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const NUM_CLASSES: usize = 10;
