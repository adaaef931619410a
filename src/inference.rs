//! Classifying single images and showing the result in the terminal.
//!
//! Charts are drawn with braille characters by `textplots`.

use crate::error::{Error, Result};
use crate::mlp::Mlp;
use crate::mnist::{HEIGHT, MnistBatcher, MnistItem, WIDTH};
use crate::utils::to_f32_vec;
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use image::{GrayImage, Luma};
use std::fmt::Write;
use std::path::Path;
use textplots::{Chart, Plot, Shape};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Softmax output, one entry per class.
    pub probabilities: Vec<f32>,
    /// Index of the most probable class.
    pub class: usize,
}

impl Prediction {
    fn from_probabilities(probabilities: Vec<f32>) -> Self {
        let class = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(class, _)| class)
            .unwrap_or_default();
        Self {
            probabilities,
            class,
        }
    }

    /// Probability of the predicted class.
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.class]
    }
}

/// Runs a single image through the model.
pub fn predict<B: Backend>(model: &Mlp<B>, item: &MnistItem, device: &B::Device) -> Result<Prediction> {
    let mut predictions = predict_batch(model, vec![item.clone()], device)?;
    Ok(predictions.remove(0))
}

pub fn predict_batch<B: Backend>(
    model: &Mlp<B>,
    items: Vec<MnistItem>,
    device: &B::Device,
) -> Result<Vec<Prediction>> {
    if items.is_empty() {
        return Ok(vec![]);
    }
    MnistItem::check_all(&items)?;
    let batch = MnistBatcher::default().batch(items, device);
    let [batch_size, _] = batch.images.dims();
    let num_classes = model.num_classes();

    let probabilities = to_f32_vec(model.probabilities(batch.images))?;
    debug_assert_eq!(probabilities.len(), batch_size * num_classes);

    Ok(probabilities
        .chunks(num_classes)
        .map(|row| Prediction::from_probabilities(row.to_vec()))
        .collect())
}

const DIGIT_CHART_SIZE: u32 = 2 * WIDTH as u32;
const BAR_CHART_WIDTH: u32 = 64;
const BAR_CHART_HEIGHT: u32 = 32;
// pixels at least this bright are drawn
const LIT: u8 = 128;

/// Renders the digit, a bar chart of the class probabilities and a probability table.
pub fn view_classify(item: &MnistItem, prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", digit_chart(item));
    let _ = writeln!(out, "{}", probability_chart(prediction));

    let _ = writeln!(out, "Class Probability");
    for (class, p) in prediction.probabilities.iter().enumerate() {
        let marker = if class == prediction.class { " <" } else { "" };
        let _ = writeln!(out, "{class:>5} {p:.3}{marker}");
    }
    let _ = writeln!(
        out,
        "predicted {} ({:.1}%), labeled {}",
        prediction.class,
        prediction.confidence() * 100.,
        item.label
    );
    out
}

/// Plots every lit pixel, row 0 at the top.
fn digit_chart(item: &MnistItem) -> String {
    let points: Vec<(f32, f32)> = item
        .image
        .iter()
        .enumerate()
        .filter(|(_, brightness)| **brightness >= LIT)
        .map(|(i, _)| {
            let (row, col) = (i / WIDTH, i % WIDTH);
            (col as f32 + 0.5, -(row as f32 + 0.5))
        })
        .collect();
    let shape = Shape::Points(&points);

    render(
        Chart::new_with_y_range(
            DIGIT_CHART_SIZE,
            DIGIT_CHART_SIZE,
            0.,
            WIDTH as f32,
            -(HEIGHT as f32),
            0.,
        )
        .lineplot(&shape),
    )
}

/// One bar per class over `[0, 1]`.
fn probability_chart(prediction: &Prediction) -> String {
    let mut bars: Vec<(f32, f32)> = prediction
        .probabilities
        .iter()
        .enumerate()
        .map(|(class, p)| (class as f32, *p))
        .collect();
    // closes the last bar
    bars.push((prediction.probabilities.len() as f32, 0.));
    let shape = Shape::Bars(&bars);

    render(
        Chart::new_with_y_range(
            BAR_CHART_WIDTH,
            BAR_CHART_HEIGHT,
            0.,
            prediction.probabilities.len() as f32,
            0.,
            1.,
        )
        .lineplot(&shape),
    )
}

fn render(chart: &mut Chart<'_>) -> String {
    chart.figures();
    chart.to_string()
}

/// Writes the digit as a grayscale PNG.
pub fn save_image(item: &MnistItem, path: &Path) -> Result<()> {
    item.check()
        .map_err(|reason| Error::InvalidItem { index: 0, reason })?;
    let image = GrayImage::from_fn(WIDTH as u32, HEIGHT as u32, |x, y| {
        Luma([item.image[y as usize * WIDTH + x as usize]])
    });
    log::debug!("saving the digit image to {path:?}");
    image.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::MlpConfig;
    use crate::mnist::MnistDataset;
    use crate::optim::sgd_config;
    use crate::testing::{TestAutodiffBackend, TestBackend, synthetic_item, synthetic_items};
    use crate::training::{TrainingConfig, train};
    use burn::module::AutodiffModule;

    #[test]
    fn prediction_probabilities_sum_to_one() {
        let device = Default::default();
        let model = MlpConfig::new().init::<TestBackend>(&device);

        let predictions = predict_batch(&model, synthetic_items(3), &device).unwrap();
        assert_eq!(predictions.len(), 3);
        for prediction in predictions {
            assert_eq!(prediction.probabilities.len(), 10);
            let sum: f32 = prediction.probabilities.iter().sum();
            assert!((sum - 1.).abs() < 1e-5);
            assert!(prediction.confidence() >= 0.1);
        }
        assert!(predict_batch(&model, vec![], &device).unwrap().is_empty());
    }

    #[test]
    fn trained_model_concentrates_on_the_label() {
        let device = Default::default();
        let config = TrainingConfig::new(sgd_config(0.9))
            .with_num_epochs(8)
            .with_batch_size(10)
            .with_num_workers(1)
            .with_lr(0.01)
            .with_log_interval(0);
        let model = MlpConfig::new()
            .with_hidden_sizes(vec![32])
            .init::<TestAutodiffBackend>(&device);
        let mut optim = config
            .optimizer
            .init::<TestAutodiffBackend, Mlp<TestAutodiffBackend>>();
        let (model, _) = train(
            &config,
            model,
            &mut optim,
            MnistDataset::from_items(synthetic_items(100)).unwrap(),
            None,
            &device,
            |_, _, _| Ok(()),
        )
        .unwrap();

        let item = synthetic_item(7);
        let prediction = predict(&model.valid(), &item, &device).unwrap();
        assert_eq!(prediction.class, 7);
        assert!(prediction.confidence() > 0.5, "{prediction:?}");
    }

    fn is_braille_dot(c: char) -> bool {
        ('\u{2801}'..='\u{28FF}').contains(&c)
    }

    #[test]
    fn view_shows_image_and_bars() {
        let item = synthetic_item(3);
        let mut probabilities = vec![0.; 10];
        probabilities[3] = 0.75;
        probabilities[8] = 0.25;
        let prediction = Prediction::from_probabilities(probabilities);

        let view = view_classify(&item, &prediction);
        assert!(view.chars().any(is_braille_dot));

        // one table line per class, each on its own line
        let lines: Vec<_> = view.lines().collect();
        let header = lines
            .iter()
            .position(|line| *line == "Class Probability")
            .unwrap();
        assert_eq!(lines.len(), header + 12);
        assert_eq!(lines[header + 1], "    0 0.000");
        assert_eq!(lines[header + 4], "    3 0.750 <");
        assert_eq!(lines[header + 9], "    8 0.250");
        assert_eq!(lines[header + 11], "predicted 3 (75.0%), labeled 3");
    }

    #[test]
    fn dark_image_plots_no_digit() {
        let item = MnistItem {
            image: vec![0; WIDTH * HEIGHT],
            label: 0,
        };
        assert!(!digit_chart(&item).chars().any(is_braille_dot));
        assert!(digit_chart(&synthetic_item(0)).chars().any(is_braille_dot));
    }

    #[test]
    fn invalid_items_are_not_classified() {
        let device = Default::default();
        let model = MlpConfig::new().init::<TestBackend>(&device);
        let item = MnistItem {
            image: vec![0; WIDTH * HEIGHT],
            label: 12,
        };
        let err = predict(&model, &item, &device).unwrap_err();
        assert!(matches!(err, Error::InvalidItem { .. }), "{err}");
    }

    #[test]
    fn digit_is_saved_as_png() {
        let tmp = temp_dir::TempDir::new().unwrap();
        let path = tmp.path().join("digit.png");
        let item = synthetic_item(3);
        save_image(&item, &path).unwrap();

        let image = image::open(&path).unwrap().into_luma8();
        assert_eq!(image.dimensions(), (28, 28));
        // row 10 is lit from column 4
        assert_eq!(image.get_pixel(4, 10).0, [255]);
        assert_eq!(image.get_pixel(0, 0).0, [0]);
    }
}
