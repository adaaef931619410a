//! Loss functions used to drive training.
//!
//! Cross entropy comes from burn, the others are small compositions of tensor ops.

pub mod mse;
pub mod nll;

pub use mse::MseLoss;
pub use nll::nll_loss;

use crate::mnist::MnistBatch;
use burn::nn::loss::{CrossEntropyLossConfig, Reduction};
use burn::prelude::*;
use burn::tensor::activation::{log_softmax, softmax};

/// Which criterion compares the model logits with the targets.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LossKind {
    /// Cross entropy computed directly on the logits.
    #[default]
    CrossEntropy,
    /// `log_softmax` on the logits followed by the negative log likelihood.
    NegativeLogLikelihood,
    /// Squared error between the softmax probabilities and the one-hot targets.
    MeanSquaredError,
}

impl LossKind {
    /// Computes the scalar loss of a batch.
    ///
    /// # Shapes
    /// - logits: `[batch_size, num_classes]`
    /// - output: `[1]`
    pub fn forward<B: Backend>(&self, logits: Tensor<B, 2>, batch: &MnistBatch<B>) -> Tensor<B, 1> {
        match self {
            LossKind::CrossEntropy => CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits, batch.targets.clone()),
            LossKind::NegativeLogLikelihood => {
                nll_loss(log_softmax(logits, 1), batch.targets.clone())
            }
            LossKind::MeanSquaredError => {
                MseLoss::new().forward(softmax(logits, 1), batch.one_hot.clone(), Reduction::Mean)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestBackend, synthetic_batch};

    #[test]
    fn cross_entropy_matches_log_softmax_with_nll() {
        let device = Default::default();
        let batch = synthetic_batch::<TestBackend>(8, &device);
        let logits = Tensor::<TestBackend, 2>::random(
            [8, 10],
            burn::tensor::Distribution::Normal(0., 2.),
            &device,
        );

        let ce = LossKind::CrossEntropy
            .forward(logits.clone(), &batch)
            .into_scalar();
        let nll = LossKind::NegativeLogLikelihood
            .forward(logits, &batch)
            .into_scalar();
        assert!((ce - nll).abs() < 1e-4, "{ce} != {nll}");
    }

    #[test]
    fn uniform_logits_have_known_losses() {
        let device = Default::default();
        let batch = synthetic_batch::<TestBackend>(4, &device);
        let logits = Tensor::<TestBackend, 2>::zeros([4, 10], &device);

        // -ln(1/10)
        let ce = LossKind::CrossEntropy
            .forward(logits.clone(), &batch)
            .into_scalar();
        assert!((ce - 10f32.ln()).abs() < 1e-5, "{ce}");

        // one entry off by 0.9, nine entries off by 0.1, averaged over 10 entries
        let mse = LossKind::MeanSquaredError
            .forward(logits, &batch)
            .into_scalar();
        let expected = (0.9f32 * 0.9 + 9. * 0.1 * 0.1) / 10.;
        assert!((mse - expected).abs() < 1e-5, "{mse}");
    }

    #[test]
    fn confident_correct_logits_have_low_loss() {
        let device = Default::default();
        let batch = synthetic_batch::<TestBackend>(4, &device);
        let logits = batch.one_hot.clone() * 20.;

        for kind in [
            LossKind::CrossEntropy,
            LossKind::NegativeLogLikelihood,
            LossKind::MeanSquaredError,
        ] {
            let loss = kind.forward(logits.clone(), &batch).into_scalar();
            assert!(loss < 1e-3, "{kind:?}: {loss}");
        }
    }
}
