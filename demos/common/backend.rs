//! Backend used by the demo, chosen at compile time with one `dev-*` feature,
//! e.g. `--no-default-features --features dev-wgpu`.
//!
//! Training runs on `MainAutoBackend`, inference on `MainBackend`.

use burn::backend::Autodiff;
use burn::prelude::*;

#[cfg(feature = "dev-ndarray")]
mod selected {
    pub type Backend = burn::backend::NdArray<f32>;
    pub const NAME: &str = "ndarray";
}
#[cfg(feature = "dev-tch-cpu")]
mod selected {
    pub type Backend = burn::backend::libtorch::LibTorch<f32>;
    pub const NAME: &str = "libtorch (cpu)";
}
#[cfg(feature = "dev-tch-gpu")]
mod selected {
    pub type Backend = burn::backend::libtorch::LibTorch<f32>;
    pub const NAME: &str = "libtorch (gpu)";
}
#[cfg(feature = "dev-wgpu")]
mod selected {
    pub type Backend = burn::backend::wgpu::Wgpu<f32, i32>;
    pub const NAME: &str = "wgpu";
}
#[cfg(feature = "dev-metal")]
mod selected {
    pub type Backend = burn::backend::wgpu::Wgpu<f32, i32>;
    pub const NAME: &str = "metal";
}
#[cfg(feature = "dev-cuda")]
mod selected {
    pub type Backend = burn::backend::Cuda<f32, i32>;
    pub const NAME: &str = "cuda";
}
#[cfg(not(feature = "_dev-has-backend"))]
mod selected {
    std::compile_error!("No dev backend selected. Enable one of the `dev-*` features of burn-digits.");

    // keeps the rest of the demo type-checking
    pub type Backend = burn::backend::NdArray<f32>;
    pub const NAME: &str = "none";
}

pub type MainBackend = selected::Backend;
pub type MainAutoBackend = Autodiff<MainBackend>;
pub const BACKEND_NAME: &str = selected::NAME;

/// Device the demo runs on.
pub trait MainDevice: Backend {
    fn main_device() -> Self::Device {
        Default::default()
    }
}

#[cfg(not(feature = "dev-tch-gpu"))]
impl MainDevice for MainBackend {}

#[cfg(feature = "dev-tch-gpu")]
impl MainDevice for MainBackend {
    fn main_device() -> Self::Device {
        if cfg!(target_os = "macos") {
            burn::backend::libtorch::LibTorchDevice::Mps
        } else {
            burn::backend::libtorch::LibTorchDevice::Cuda(0)
        }
    }
}

impl MainDevice for MainAutoBackend {
    fn main_device() -> Self::Device {
        MainBackend::main_device()
    }
}
