use burn::prelude::*;

/// Negative log likelihood of the target classes.
///
/// Expects log-probabilities (e.g. the output of `log_softmax`), so that
/// `nll_loss(log_softmax(logits), targets)` equals the cross entropy of `logits`.
///
/// `loss = -mean_i(log_probs[i, targets[i]])`
///
/// # Shapes
///
/// - log_probs: `[batch_size, num_classes]`
/// - targets: `[batch_size]`
/// - output: `[1]`
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [batch_size] = targets.dims();
    log_probs
        .gather(1, targets.reshape([batch_size, 1]))
        .mean()
        .neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBackend;

    #[test]
    fn picks_the_target_log_probability() {
        let device = Default::default();
        let log_probs = Tensor::<TestBackend, 2>::from_floats(
            [[-0.1, -2.0, -3.0], [-4.0, -0.5, -1.0]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 2], &device);

        let loss = nll_loss(log_probs, targets).into_scalar();
        assert!((loss - 0.55).abs() < 1e-6, "{loss}");
    }
}
