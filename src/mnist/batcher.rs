use super::{HEIGHT, MnistItem, NUM_CLASSES, WIDTH};
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

// values mean=0.1307,std=0.3081 are from the PyTorch MNIST example
// https://github.com/pytorch/examples/blob/54f4572509891883a947411fd7239237dd2a39c3/mnist/main.py#L122
pub const MEAN: f32 = 0.1307;
pub const STD: f32 = 0.3081;

/// Scales each brightness into [0, 1] then z-score normalizes it.
///
/// `z = (value / 255 - mean) / stddev`
pub fn normalize_image(image: &[u8]) -> Vec<f32> {
    image
        .iter()
        .map(|&value| (value as f32 / 255. - MEAN) / STD)
        .collect()
}

/// Inverse of [`normalize_image`] for a single value, clamped into a valid brightness.
///
/// `value = (z * stddev + mean) * 255`
pub fn denormalize_pixel(z: f32) -> u8 {
    ((z * STD + MEAN) * 255.).round().clamp(0., 255.) as u8
}

#[derive(Clone, Default)]
pub struct MnistBatcher {}

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    /// The input feature is the brightness, z-score normalized (mean=0.0, stddev=1.0).
    ///
    /// # Shape
    /// [batch_size, WIDTH * HEIGHT]
    pub images: Tensor<B, 2>,
    /// # Shape
    /// [batch_size]
    pub targets: Tensor<B, 1, Int>,
    /// The targets encoded as one-hot rows, for regression-style losses.
    ///
    /// # Shape
    /// [batch_size, NUM_CLASSES]
    pub one_hot: Tensor<B, 2>,
}

impl<B: Backend> MnistBatch<B> {
    pub fn batch_size(&self) -> usize {
        let [batch_size, _] = self.images.dims();
        batch_size
    }
}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let batch_size = items.len();

        let mut pixels = Vec::with_capacity(batch_size * WIDTH * HEIGHT);
        let mut labels = Vec::with_capacity(batch_size);
        let mut one_hot = vec![0f32; batch_size * NUM_CLASSES];
        for (i, item) in items.iter().enumerate() {
            debug_assert_eq!(item.image.len(), WIDTH * HEIGHT);
            pixels.extend(normalize_image(&item.image));
            labels.push((item.label as i64).elem::<B::IntElem>());
            one_hot[i * NUM_CLASSES + item.label as usize] = 1.;
        }

        let images = Tensor::<B, 2>::from_data(
            TensorData::new(pixels, [batch_size, WIDTH * HEIGHT]).convert::<B::FloatElem>(),
            device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [batch_size]), device);
        let one_hot = Tensor::<B, 2>::from_data(
            TensorData::new(one_hot, [batch_size, NUM_CLASSES]).convert::<B::FloatElem>(),
            device,
        );

        MnistBatch {
            images,
            targets,
            one_hot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBackend;

    #[test]
    fn normalization_round_trips_brightness() {
        for value in [0u8, 1, 33, 128, 254, 255] {
            let z = normalize_image(&[value])[0];
            assert_eq!(denormalize_pixel(z), value);
        }
        // background maps to a negative z-score
        assert!(normalize_image(&[0])[0] < -0.4);
    }

    #[test]
    fn batches_images_targets_and_one_hot() {
        let device = Default::default();
        let items = vec![
            MnistItem {
                image: vec![0; WIDTH * HEIGHT],
                label: 3,
            },
            MnistItem {
                image: vec![255; WIDTH * HEIGHT],
                label: 9,
            },
        ];

        let batch: MnistBatch<TestBackend> = MnistBatcher::default().batch(items, &device);
        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.images.dims(), [2, WIDTH * HEIGHT]);
        assert_eq!(batch.one_hot.dims(), [2, NUM_CLASSES]);

        let targets = batch.targets.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(targets, vec![3, 9]);

        let one_hot = batch.one_hot.into_data().to_vec::<f32>().unwrap();
        assert_eq!(one_hot.iter().sum::<f32>(), 2.);
        assert_eq!(one_hot[3], 1.);
        assert_eq!(one_hot[NUM_CLASSES + 9], 1.);

        let images = batch.images.into_data().to_vec::<f32>().unwrap();
        let expected_bright = (1. - MEAN) / STD;
        assert!((images[WIDTH * HEIGHT] - expected_bright).abs() < 1e-5);
    }
}
