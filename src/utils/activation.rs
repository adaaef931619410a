use burn::prelude::*;
use burn::tensor::activation;

/// Nonlinearity placed between the linear layers.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Activation {
    #[default]
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Applies the activation element-wise.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Relu => activation::relu(input),
            Activation::Sigmoid => activation::sigmoid(input),
            Activation::Tanh => activation::tanh(input),
        }
    }
}
