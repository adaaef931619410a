use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use burn::tensor::Distribution;
use burn::tensor::backend::AutodiffBackend;
use burn_digits::autograd::{square_mean, weight_gradients};
use burn_digits::optim::{inspect_step, sgd_config};
use burn_digits::prelude::*;
pub use common::{
    backend::{BACKEND_NAME, MainAutoBackend, MainBackend, MainDevice},
    cli::AppArgs,
};

#[path = "../common/mod.rs"]
pub mod common;

pub fn launch<B, AutoB>(app_args: &AppArgs) -> burn_digits::Result<()>
where
    B: Backend + MainDevice,
    AutoB: AutodiffBackend + MainDevice,
{
    log::info!("using the {BACKEND_NAME} backend");
    app_args.create_artifact_dir::<B>()?;

    // setup training and model configs
    let training_config = match app_args.load_training_config()? {
        Some(config) => config,
        None => TrainingConfig::new(sgd_config(0.)),
    };
    let model_config = app_args
        .load_model_config()?
        .unwrap_or_else(MlpConfig::new);
    // save configs
    app_args.save_training_config(&training_config)?;
    app_args.save_model_config(&model_config)?;

    if app_args.autograd {
        autograd::<AutoB>(&training_config, &model_config, app_args)?;
    }

    if app_args.training {
        training::<AutoB>(&training_config, &model_config, app_args)?;
    }

    if app_args.inference {
        inference::<B>(&model_config, app_args)?;
    }

    if !app_args.autograd && !app_args.training && !app_args.inference {
        println!("neither autograd, training nor inference were enabled");
        println!("{}", common::cli::HELP);
    }
    Ok(())
}

fn autograd<AutoB: AutodiffBackend + MainDevice>(
    training_config: &TrainingConfig,
    model_config: &MlpConfig,
    app_args: &AppArgs,
) -> burn_digits::Result<()> {
    let device = AutoB::main_device();
    AutoB::seed(&device, training_config.seed);

    let x = Tensor::<AutoB, 2>::random([2, 2], Distribution::Normal(0., 1.), &device);
    println!("x = {x}");
    let result = square_mean(x);
    println!("z = mean(x^2) = {}", result.z);
    println!("dz/dx = 2x/4 = {}", result.grad);

    let dataset = app_args.dataset(Split::Train)?;
    let items: Vec<_> = (0..training_config.batch_size.min(dataset.len()))
        .filter_map(|index| dataset.get(index))
        .collect();
    if items.is_empty() {
        return Err(burn_digits::Error::EmptyDataset);
    }
    let batch = MnistBatcher::default().batch(items, &device);

    let model = model_config.init::<AutoB>(&device);
    if let Some(gradient) = weight_gradients(&model, &batch, training_config.loss) {
        println!("first layer gradient {:?}", gradient.dims());
        println!("{}", first_row(gradient));
    }

    let mut optim = sgd_config(0.).init::<AutoB, Mlp<AutoB>>();
    let (_model, report) = inspect_step(
        model,
        &mut optim,
        training_config.lr,
        &batch,
        training_config.loss,
    );
    println!("loss {:.4}, lr {}", report.loss, training_config.lr);
    println!("before {}", first_row(report.before));
    println!("gradient {}", first_row(report.gradient));
    println!("after {}", first_row(report.after));
    Ok(())
}

/// The first few weights leaving the first input pixel.
fn first_row<B: Backend>(weights: Tensor<B, 2>) -> Tensor<B, 2> {
    let [_, cols] = weights.dims();
    weights.slice([0..1, 0..cols.min(5)])
}

fn training<AutoB: AutodiffBackend + MainDevice>(
    training_config: &TrainingConfig,
    model_config: &MlpConfig,
    app_args: &AppArgs,
) -> burn_digits::Result<()> {
    let device = AutoB::main_device();
    AutoB::seed(&device, training_config.seed);

    let model = app_args.load_or_save_model::<AutoB>(model_config, &device)?;
    let optim_init = training_config.optimizer.init::<AutoB, Mlp<AutoB>>();
    let mut optim = app_args.load_or_save_optim::<AutoB, Mlp<AutoB>, _>(optim_init, &device)?;

    let train_data = app_args.dataset(Split::Train)?;
    let valid_data = app_args.dataset(Split::Test)?;

    println!("Starting training...");
    let (_model, report) = burn_digits::training::train(
        training_config,
        model,
        &mut optim,
        train_data,
        Some(valid_data),
        &device,
        |model, optim, summary| {
            println!("{summary}");
            app_args.save_model(model)?;
            app_args.save_optim::<AutoB, Mlp<AutoB>>(optim)
        },
    )?;

    if let Some(last) = report.last() {
        println!("Final training loss: {:.4}", last.train.mean_loss);
    }
    Ok(())
}

fn inference<B: Backend + MainDevice>(
    model_config: &MlpConfig,
    app_args: &AppArgs,
) -> burn_digits::Result<()> {
    let device = B::main_device();
    let model = match app_args.load_model::<B>(model_config, &device)? {
        Some(model) => model,
        None => {
            println!("no trained model in {:?}, using random weights", app_args.artifacts_path);
            model_config.init(&device)
        }
    };

    let dataset = app_args.dataset(Split::Test)?;
    let Some(item) = dataset.get(app_args.sample) else {
        println!("no test image at index {} (of {})", app_args.sample, dataset.len());
        return Ok(());
    };
    let prediction = predict(&model, &item, &device)?;
    print!("{}", view_classify(&item, &prediction));
    if let Some(path) = &app_args.save_image {
        burn_digits::inference::save_image(&item, path)?;
        println!("saved the image to {path:?}");
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let app_args = AppArgs::parse().expect("invalid arguments");
    if let Err(err) = launch::<MainBackend, MainAutoBackend>(&app_args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
