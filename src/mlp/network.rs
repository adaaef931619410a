//! Fully connected classifier: `Linear -> activation -> ... -> Linear`.

use crate::mnist::{HEIGHT, MnistBatch, NUM_CLASSES, WIDTH};
use crate::utils::activation::Activation;
use crate::utils::loss::LossKind;
use burn::module::Ignored;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{log_softmax, softmax};

#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Flattened image size.
    #[config(default = "WIDTH * HEIGHT")]
    pub input_size: usize,

    /// Width of each hidden layer, in order.
    ///
    /// When empty the network is a single linear layer.
    #[config(default = "vec![128, 64]")]
    pub hidden_sizes: Vec<usize>,

    #[config(default = "NUM_CLASSES")]
    pub num_classes: usize,

    /// Applied after every layer except the last one.
    #[config(default = "Activation::Relu")]
    pub activation: Activation,
}

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub layers: Vec<Linear<B>>,
    pub activation: Ignored<Activation>,
}

impl MlpConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let sizes: Vec<usize> = std::iter::once(self.input_size)
            .chain(self.hidden_sizes.iter().copied())
            .chain(std::iter::once(self.num_classes))
            .collect();
        let layers = sizes
            .windows(2)
            .map(|pair| LinearConfig::new(pair[0], pair[1]).with_bias(true).init(device))
            .collect();

        Mlp {
            layers,
            activation: Ignored(self.activation),
        }
    }
}

/// Loss, logits and targets of one forward pass.
#[derive(Debug, Clone)]
pub struct ClassificationOutput<B: Backend> {
    /// # Shape
    /// [1]
    pub loss: Tensor<B, 1>,
    /// # Shape
    /// [batch_size, num_classes]
    pub output: Tensor<B, 2>,
    /// # Shape
    /// [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ClassificationOutput<B> {
    /// Number of rows whose highest logit is the target class.
    pub fn num_correct(&self) -> usize {
        let [batch_size, _num_classes] = self.output.dims();
        let predicted = self.output.clone().argmax(1).reshape([batch_size]);
        predicted
            .equal(self.targets.clone())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>() as usize
    }
}

impl<B: Backend> Mlp<B> {
    /// # Shapes
    ///   - Input [batch_size, input_size]
    ///   - Output [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len() - 1;
        let mut x = images;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if i != last {
                x = self.activation.0.forward(x);
            }
        }
        x
    }

    /// Class probabilities, each row sums to one.
    pub fn probabilities(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }

    pub fn log_probabilities(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        log_softmax(self.forward(images), 1)
    }

    pub fn forward_classification(
        &self,
        batch: &MnistBatch<B>,
        loss: LossKind,
    ) -> ClassificationOutput<B> {
        let [batch_size, _input_size] = batch.images.dims();
        let output = self.forward(batch.images.clone());
        debug_assert_eq!(batch_size, output.dims()[0]);

        ClassificationOutput {
            loss: loss.forward(output.clone(), batch),
            output,
            targets: batch.targets.clone(),
        }
    }

    pub fn input_size(&self) -> usize {
        let [input_size, _] = self.layers[0].weight.dims();
        input_size
    }

    pub fn num_classes(&self) -> usize {
        let [_, num_classes] = self.layers[self.layers.len() - 1].weight.dims();
        num_classes
    }
}
