pub mod network;

pub use network::{ClassificationOutput, Mlp, MlpConfig};
