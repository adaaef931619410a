//! Small demonstrations of burn's gradient tracking, run before any training.

use crate::mlp::Mlp;
use crate::mnist::MnistBatch;
use crate::utils::loss::LossKind;
use burn::optim::GradientsParams;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

/// Result of differentiating `z = mean(x^2)`.
pub struct SquareMean<B: AutodiffBackend, const D: usize> {
    /// # Shape
    /// [1]
    pub z: Tensor<B::InnerBackend, 1>,
    /// `dz/dx`, which is `2x / numel(x)`.
    pub grad: Tensor<B::InnerBackend, D>,
}

/// Tracks `x`, computes `y = x^2` and `z = mean(y)` then runs the backward pass.
pub fn square_mean<B: AutodiffBackend, const D: usize>(x: Tensor<B, D>) -> SquareMean<B, D> {
    let x = x.require_grad();
    let y = x.clone().powf_scalar(2.0);
    let z = y.mean();

    let grads = z.backward();
    let grad = x
        .grad(&grads)
        .unwrap_or_else(|| x.clone().inner().zeros_like());

    SquareMean {
        z: z.inner(),
        grad,
    }
}

/// Runs one forward and backward pass and returns the gradient of the first layer weight.
///
/// # Shape
/// [input_size, first_hidden_size]
pub fn weight_gradients<B: AutodiffBackend>(
    model: &Mlp<B>,
    batch: &MnistBatch<B>,
    loss: LossKind,
) -> Option<Tensor<B::InnerBackend, 2>> {
    let output = model.forward_classification(batch, loss);
    let grads = output.loss.backward();
    let grads = GradientsParams::from_grads(grads, model);
    grads.get::<B::InnerBackend, 2>(model.layers[0].weight.id)
}
