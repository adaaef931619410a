//! Configurations, model weights and optimizer state kept in an artifacts directory.

use crate::error::{Error, Result};
use crate::mlp::{Mlp, MlpConfig};
use burn::module::AutodiffModule;
use burn::optim::Optimizer;
use burn::prelude::*;
use burn::record::{CompactRecorder, FileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use std::path::{Path, PathBuf};

pub type RecorderTy = CompactRecorder;

pub const TRAINING_CONFIG_NAME: &str = "training_config";
pub const MODEL_CONFIG_NAME: &str = "model_config";
pub const MODEL_NAME: &str = "model";
pub const OPTIM_NAME: &str = "optim";

/// Creates the directory, removing the model and optimizer files first when `remove_weights` is set.
pub fn create_artifact_dir<B: Backend>(artifact_dir: &Path, remove_weights: bool) -> Result<()> {
    std::fs::create_dir_all(artifact_dir).map_err(Error::io(artifact_dir))?;
    if remove_weights {
        self::remove_weights::<B>(artifact_dir)?;
    }
    Ok(())
}

/// Deletes the saved model and optimizer, if any.
pub fn remove_weights<B: Backend>(artifact_dir: &Path) -> Result<()> {
    for name in [MODEL_NAME, OPTIM_NAME] {
        let path = weights_path::<B>(artifact_dir, name);
        log::debug!("removing {path:?}");
        match std::fs::remove_file(&path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                return Err(Error::Io { path, source: err });
            }
            _ => {}
        }
    }
    Ok(())
}

fn config_path(artifact_dir: &Path, name: &str) -> PathBuf {
    artifact_dir.join(name).with_extension("json")
}

fn weights_path<B: Backend>(artifact_dir: &Path, name: &str) -> PathBuf {
    let file_ext = <RecorderTy as FileRecorder<B>>::file_extension();
    artifact_dir.join(name).with_extension(file_ext)
}

pub fn save_config(path: &Path, config: &impl Config) -> Result<()> {
    log::debug!("saving config into {path:?}");
    config.save(path).map_err(Error::io(path))
}

/// Loads a config, `Ok(None)` when the file does not exist.
pub fn load_config<C: Config>(path: &Path) -> Result<Option<C>> {
    if !path.exists() {
        return Ok(None);
    }
    log::debug!("loading config from {path:?}");
    C::load(path).map(Some).map_err(|err| Error::Config {
        path: path.into(),
        reason: err.to_string(),
    })
}

pub fn save_training_config(artifact_dir: &Path, config: &impl Config) -> Result<()> {
    save_config(&config_path(artifact_dir, TRAINING_CONFIG_NAME), config)
}

pub fn load_training_config<C: Config>(artifact_dir: &Path) -> Result<Option<C>> {
    load_config(&config_path(artifact_dir, TRAINING_CONFIG_NAME))
}

pub fn save_model_config(artifact_dir: &Path, config: &MlpConfig) -> Result<()> {
    save_config(&config_path(artifact_dir, MODEL_CONFIG_NAME), config)
}

pub fn load_model_config(artifact_dir: &Path) -> Result<Option<MlpConfig>> {
    load_config(&config_path(artifact_dir, MODEL_CONFIG_NAME))
}

pub fn save_model<B: Backend>(artifact_dir: &Path, model: &Mlp<B>) -> Result<()> {
    let path = artifact_dir.join(MODEL_NAME);
    log::debug!("saving model to {:?}", weights_path::<B>(artifact_dir, MODEL_NAME));
    model
        .clone()
        .save_file(path, &RecorderTy::new()) // ext added automatically
        .map_err(Error::from)
}

/// Loads the weights into a model built from `model_config`, `Ok(None)` when no model was saved.
pub fn load_model<B: Backend>(
    artifact_dir: &Path,
    model_config: &MlpConfig,
    device: &B::Device,
) -> Result<Option<Mlp<B>>> {
    if !weights_path::<B>(artifact_dir, MODEL_NAME).exists() {
        return Ok(None);
    }
    log::debug!("loading model from {artifact_dir:?}");
    let model = model_config
        .init(device)
        .load_file(artifact_dir.join(MODEL_NAME), &RecorderTy::new(), device)?;
    Ok(Some(model))
}

pub fn save_optim<B, M, O>(artifact_dir: &Path, optim: &O) -> Result<()>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    let path = artifact_dir.join(OPTIM_NAME);
    log::debug!("saving optim to {:?}", weights_path::<B>(artifact_dir, OPTIM_NAME));
    RecorderTy::new()
        .record(optim.to_record(), path)
        .map_err(Error::from)
}

/// Restores the state of `optim`, which is returned unchanged when nothing was saved.
pub fn load_optim<B, M, O>(artifact_dir: &Path, optim: O, device: &B::Device) -> Result<O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    if !weights_path::<B>(artifact_dir, OPTIM_NAME).exists() {
        return Ok(optim);
    }
    log::debug!("loading optim from {artifact_dir:?}");
    let record = RecorderTy::new().load(artifact_dir.join(OPTIM_NAME), device)?;
    Ok(optim.load_record(record))
}
