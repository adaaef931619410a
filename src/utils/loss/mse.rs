use burn::module::Module;
use burn::nn::loss::Reduction;
use burn::tensor::{Tensor, backend::Backend};

/// Calculate the mean squared error loss from the predictions and the targets.
#[derive(Module, Clone, Debug)]
pub struct MseLoss;

impl Default for MseLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl MseLoss {
    /// Create the criterion.
    pub fn new() -> Self {
        Self
    }

    /// Compute the criterion on the input tensor.
    ///
    /// # Shapes
    ///
    /// - predictions: [batch_size, num_targets]
    /// - targets: [batch_size, num_targets]
    pub fn forward<const D: usize, B: Backend>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
        reduction: Reduction,
    ) -> Tensor<B, 1> {
        let tensor = self.forward_no_reduction(predictions, targets);
        match reduction {
            Reduction::Sum => tensor.sum(),
            _ => tensor.mean(),
        }
    }

    /// Compute the criterion on the input tensor without reducing.
    pub fn forward_no_reduction<const D: usize, B: Backend>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        predictions.sub(targets).square()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBackend;

    #[test]
    fn reduces_squared_errors() {
        let device = Default::default();
        let predictions = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0], [0.0, 4.0]], &device);
        let loss = MseLoss::new();

        let unreduced = loss
            .forward_no_reduction(predictions.clone(), targets.clone())
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(unreduced, vec![0.0, 4.0, 9.0, 0.0]);

        let sum = loss
            .forward(predictions.clone(), targets.clone(), Reduction::Sum)
            .into_scalar();
        assert_eq!(sum, 13.0);

        let mean = loss
            .forward(predictions, targets, Reduction::Mean)
            .into_scalar();
        assert_eq!(mean, 3.25);
    }
}
