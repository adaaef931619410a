//! The epoch loop: forward, loss, backward, optimizer step.

use crate::error::{Error, Result};
use crate::mlp::Mlp;
use crate::mnist::{MnistBatch, MnistBatcher, MnistDataset};
use crate::utils::loss::LossKind;
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use std::fmt;
use std::sync::Arc;

#[derive(Config, Debug)]
pub struct TrainingConfig {
    pub optimizer: SgdConfig,
    #[config(default = "LossKind::CrossEntropy")]
    pub loss: LossKind,
    #[config(default = 5)]
    pub num_epochs: usize,
    #[config(default = 64)]
    pub batch_size: usize,
    #[config(default = 2)]
    pub num_workers: usize,
    #[config(default = 0.003)]
    pub lr: f64,
    /// Seeds the shuffling of the training set.
    #[config(default = 0)]
    pub seed: u64,
    /// Batches between two progress lines. `0` disables them.
    #[config(default = 100)]
    pub log_interval: usize,
}

pub type Dataloader<B> = Arc<dyn DataLoader<B, MnistBatch<B>>>;

/// Builds a dataloader over `dataset`, shuffled when a seed is given.
pub fn dataloader<B: Backend>(
    dataset: MnistDataset,
    batch_size: usize,
    num_workers: usize,
    shuffle: Option<u64>,
    device: &B::Device,
) -> Result<Dataloader<B>> {
    if batch_size == 0 {
        return Err(Error::ZeroBatchSize);
    }
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let builder = DataLoaderBuilder::new(MnistBatcher::default())
        .batch_size(batch_size)
        .num_workers(num_workers)
        .set_device(device.clone());
    let builder = match shuffle {
        Some(seed) => builder.shuffle(seed),
        None => builder,
    };
    Ok(builder.build(dataset))
}

/// Averaged metrics over one pass on a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean of the per-batch losses.
    pub mean_loss: f64,
    /// Fraction of correctly classified items, in `[0, 1]`.
    pub accuracy: f64,
    pub num_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    /// Starts at 1.
    pub epoch: usize,
    pub num_epochs: usize,
    pub train: Evaluation,
    pub valid: Option<Evaluation>,
}

impl fmt::Display for EpochSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Epoch {}/{}, Training loss: {:.4}, Accuracy: {:.2}%",
            self.epoch,
            self.num_epochs,
            self.train.mean_loss,
            self.train.accuracy * 100.,
        )?;
        if let Some(valid) = &self.valid {
            write!(
                f,
                ", Valid loss: {:.4}, Valid accuracy: {:.2}%",
                valid.mean_loss,
                valid.accuracy * 100.,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub epochs: Vec<EpochSummary>,
}

impl TrainingReport {
    /// Mean training loss of each epoch, in order.
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.train.mean_loss).collect()
    }

    pub fn last(&self) -> Option<&EpochSummary> {
        self.epochs.last()
    }
}

/// Trains `model` for `config.num_epochs` epochs.
///
/// `on_epoch` runs after every epoch with the updated model and optimizer,
/// e.g. to persist them.
pub fn train<B, O>(
    config: &TrainingConfig,
    mut model: Mlp<B>,
    optim: &mut O,
    train_data: MnistDataset,
    valid_data: Option<MnistDataset>,
    device: &B::Device,
    mut on_epoch: impl FnMut(&Mlp<B>, &O, &EpochSummary) -> Result<()>,
) -> Result<(Mlp<B>, TrainingReport)>
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
{
    let dataloader_train = dataloader::<B>(
        train_data,
        config.batch_size,
        config.num_workers,
        Some(config.seed),
        device,
    )?;
    let dataloader_valid = valid_data
        .map(|data| {
            dataloader::<B::InnerBackend>(
                data,
                config.batch_size,
                config.num_workers,
                None,
                device,
            )
        })
        .transpose()?;

    log::info!(
        "training {} parameters on {} items for {} epochs",
        model.num_params(),
        dataloader_train.num_items(),
        config.num_epochs
    );

    let mut report = TrainingReport::default();
    for epoch in 1..config.num_epochs + 1 {
        let (trained, train) = train_epoch(
            Arc::clone(&dataloader_train),
            model,
            optim,
            config,
            epoch,
        )?;
        model = trained;

        let valid = dataloader_valid
            .as_ref()
            .map(|dataloader| evaluate(Arc::clone(dataloader), &model.valid(), config.loss))
            .transpose()?;

        let summary = EpochSummary {
            epoch,
            num_epochs: config.num_epochs,
            train,
            valid,
        };
        log::info!("{summary}");
        on_epoch(&model, optim, &summary)?;
        report.epochs.push(summary);
    }

    Ok((model, report))
}

/// One pass over the training set, stepping the optimizer after every batch.
pub fn train_epoch<B, O>(
    dataloader_train: Dataloader<B>,
    mut model: Mlp<B>,
    optim: &mut O,
    config: &TrainingConfig,
    epoch: usize,
) -> Result<(Mlp<B>, Evaluation)>
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
{
    if config.batch_size == 0 {
        return Err(Error::ZeroBatchSize);
    }
    let num_batches = dataloader_train.num_items().div_ceil(config.batch_size);
    let mut loss_sum = 0.;
    let mut num_correct = 0;
    let mut num_items = 0;
    let mut b = 0;

    for batch in dataloader_train.iter() {
        b += 1;
        let output = model.forward_classification(&batch, config.loss);
        let loss = crate::utils::scalar(output.loss.clone());
        loss_sum += loss;
        num_correct += output.num_correct();
        num_items += batch.batch_size();

        let grads = output.loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(config.lr, model, grads);

        if config.log_interval > 0 && b % config.log_interval == 0 {
            log::info!(
                "Epoch {epoch}/{}, Batch {b:0>4}/{num_batches}, Loss {:.4}, Running loss {:.4}",
                config.num_epochs,
                loss,
                loss_sum / b as f64,
            );
        }
    }

    if b == 0 {
        return Err(Error::EmptyDataset);
    }
    let evaluation = Evaluation {
        mean_loss: loss_sum / b as f64,
        accuracy: num_correct as f64 / num_items as f64,
        num_items,
    };
    Ok((model, evaluation))
}

/// Measures the loss and accuracy of `model` without tracking gradients.
pub fn evaluate<B: Backend>(
    dataloader: Dataloader<B>,
    model: &Mlp<B>,
    loss: LossKind,
) -> Result<Evaluation> {
    let mut loss_sum = 0.;
    let mut num_correct = 0;
    let mut num_items = 0;
    let mut num_batches = 0;

    for batch in dataloader.iter() {
        let output = model.forward_classification(&batch, loss);
        loss_sum += crate::utils::scalar(output.loss.clone());
        num_correct += output.num_correct();
        num_items += batch.batch_size();
        num_batches += 1;
    }

    if num_batches == 0 {
        return Err(Error::EmptyDataset);
    }
    Ok(Evaluation {
        mean_loss: loss_sum / num_batches as f64,
        accuracy: num_correct as f64 / num_items as f64,
        num_items,
    })
}
