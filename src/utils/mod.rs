use crate::error::{Error, Result};
use burn::prelude::*;

pub mod activation;
pub mod loss;

/// Copies a float tensor back to the host as `f32` values.
pub fn to_f32_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(Error::data)
}

/// Reads a single-element float tensor, such as a reduced loss.
pub fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    tensor.into_scalar().elem::<f64>()
}
