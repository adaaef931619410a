//! Teaching-sized digit classifier built on burn.
//!
//! A multilayer perceptron is trained on MNIST with a framework-provided loss,
//! autodiff backward pass and SGD step, then used to classify a single image.

pub mod artifacts;
pub mod autograd;
pub mod error;
pub mod inference;
pub mod mlp;
pub mod mnist;
pub mod optim;
pub mod training;
pub mod utils;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::inference::{Prediction, predict, predict_batch, view_classify};
    pub use crate::mlp::{Mlp, MlpConfig};
    pub use crate::mnist::{MnistBatch, MnistBatcher, MnistDataset, MnistItem, Split};
    pub use crate::training::{EpochSummary, Evaluation, TrainingConfig, TrainingReport};
    pub use crate::utils::activation::Activation;
    pub use crate::utils::loss::LossKind;
}

#[cfg(test)]
pub(crate) mod testing;
