use crate::mlp::Mlp;
use crate::mnist::MnistBatch;
use crate::utils::loss::LossKind;
use burn::optim::{GradientsParams, Optimizer, SgdConfig, momentum::MomentumConfig};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

/// Stochastic gradient descent, optionally with momentum.
///
/// A `momentum` of zero is plain SGD: `w <- w - lr * grad`.
pub fn sgd_config(momentum: f64) -> SgdConfig {
    let config = SgdConfig::new();
    if momentum > 0. {
        config.with_momentum(Some(
            MomentumConfig::new()
                .with_momentum(momentum)
                .with_dampening(0.),
        ))
    } else {
        config
    }
}

/// The first layer weight around a single optimizer step.
pub struct OptimStepReport<B: Backend> {
    pub loss: f64,
    /// # Shape
    /// [input_size, first_hidden_size]
    pub before: Tensor<B, 2>,
    pub gradient: Tensor<B, 2>,
    pub after: Tensor<B, 2>,
}

/// Performs exactly one forward, backward and optimizer step, recording how
/// the first layer weight moved.
pub fn inspect_step<B, O>(
    model: Mlp<B>,
    optim: &mut O,
    lr: f64,
    batch: &MnistBatch<B>,
    loss: LossKind,
) -> (Mlp<B>, OptimStepReport<B::InnerBackend>)
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
{
    let before = model.layers[0].weight.val().inner();
    let weight_id = model.layers[0].weight.id;

    let output = model.forward_classification(batch, loss);
    let loss = crate::utils::scalar(output.loss.clone());
    let grads = GradientsParams::from_grads(output.loss.backward(), &model);
    let gradient = grads
        .get::<B::InnerBackend, 2>(weight_id)
        .unwrap_or_else(|| before.zeros_like());

    let model = optim.step(lr, model, grads);
    let after = model.layers[0].weight.val().inner();
    log::debug!("single optimizer step with lr={lr}, loss={loss:.4}");

    (
        model,
        OptimStepReport {
            loss,
            before,
            gradient,
            after,
        },
    )
}
