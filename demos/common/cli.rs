use burn::module::AutodiffModule;
use burn::optim::Optimizer;
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use burn_digits::artifacts;
use burn_digits::mlp::{Mlp, MlpConfig};
use burn_digits::mnist::{MnistDataset, Split};
use std::path::PathBuf;

pub const HELP: &str = "\
Burn Digits

Trains a small multilayer perceptron on the MNIST handwritten digits and classifies a test image.
Models, optimizers, and configurations are persisted in an artifacts directory.

USAGE:
    digits [OPTIONS]

When no --autograd, --training or --inference flag is provided, the program exits after handling configuration logic.

BEHAVIOR OVERVIEW
- The program manages two configurations: training config and model config.
- If --training-config or --model-config is given, the corresponding config is loaded from the specified file and saved to the artifacts directory (overwriting any existing file).
- If no explicit config file is provided for a component, the program attempts to load it from the artifacts directory; if absent, a default configuration is created and saved.
- The artifacts directory (--artifacts-path) is used to read/write model weights, optimizer state, and configurations. If not specified, a new temporary directory is created and its path is printed.
- With --remove-artifacts, any existing model and optimizer files in the artifacts directory are deleted before training (if --training is active).
- Model and optimizer weights are loaded from the artifacts directory if present; otherwise new ones are created and saved.
- The MNIST files are downloaded into ~/.cache/burn-dataset/mnist unless --data-dir points to a directory holding the decompressed idx files.
- The flags run in order: autograd demonstration, training, inference.

FLAGS:
    -h, --help                  Show this help message and exit

OPTIONS:
    -g, --autograd              Show gradient tracking and a single optimizer step before training
    -t, --training              Run training (creates or updates model / optimizer)
    -i, --inference             Classify one test image after training (if both flags are used) or immediately
    -r, --remove-artifacts      Delete existing model and optimizer files from the artifacts directory before training
                                (has no effect if --training is not used)
    -n, --sample <INDEX>        Index of the test image used for inference [default: 0]
    -c, --training-config <PATH>
                                Load training configuration from this file (overrides any config in artifacts directory)
    -m, --model-config <PATH>   Load model configuration from this file (overrides any config in artifacts directory)
    -o, --save-image <PATH>     Also write the classified test image as a PNG file
    -d, --data-dir <PATH>       Directory holding the decompressed MNIST idx files, with `train` and `test` subdirectories
    -a, --artifacts-path <PATH>
                                Directory where configurations, model weights, and optimizer state are saved and loaded.
                                If the directory does not exist, it will be created.
                                Defaults to a newly created temporary directory (path will be printed).
";

#[derive(Debug)]
pub struct AppArgs {
    pub autograd: bool,
    pub training: bool,
    pub inference: bool,
    pub remove_artifacts: bool,
    pub sample: usize,
    pub training_config: Option<PathBuf>,
    pub model_config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub save_image: Option<PathBuf>,
    pub artifacts_path: PathBuf,
}

impl AppArgs {
    pub fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = pico_args::Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            println!("{}", HELP);
            std::process::exit(0);
        }

        let args = AppArgs {
            sample: pargs.opt_value_from_str(["-n", "--sample"])?.unwrap_or(0),
            training_config: pargs
                .opt_value_from_os_str(["-c", "--training-config"], parse_path)?,
            model_config: pargs.opt_value_from_os_str(["-m", "--model-config"], parse_path)?,
            data_dir: pargs.opt_value_from_os_str(["-d", "--data-dir"], parse_path)?,
            save_image: pargs.opt_value_from_os_str(["-o", "--save-image"], parse_path)?,
            artifacts_path: match pargs
                .opt_value_from_os_str(["-a", "--artifacts-path"], parse_path)?
            {
                Some(path) => path,
                None => new_artifacts_dir()?,
            },
            // must parse flags after values
            autograd: pargs.contains(["-g", "--autograd"]),
            training: pargs.contains(["-t", "--training"]),
            inference: pargs.contains(["-i", "--inference"]),
            remove_artifacts: pargs.contains(["-r", "--remove-artifacts"]),
        };

        // It's up to the caller what to do with the remaining arguments.
        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(pico_args::Error::ArgumentParsingFailed {
                cause: format!("unused arguments: {remaining:?}"),
            });
        }

        Ok(args)
    }

    pub fn create_artifact_dir<B: Backend>(&self) -> burn_digits::Result<()> {
        artifacts::create_artifact_dir::<B>(
            &self.artifacts_path,
            self.remove_artifacts && self.training,
        )
    }

    /// The explicit config file if given, otherwise the one in the artifacts directory.
    pub fn load_training_config<C: Config>(&self) -> burn_digits::Result<Option<C>> {
        match &self.training_config {
            Some(path) => artifacts::load_config(path),
            None => artifacts::load_training_config(&self.artifacts_path),
        }
    }

    pub fn save_training_config(&self, training_config: &impl Config) -> burn_digits::Result<()> {
        artifacts::save_training_config(&self.artifacts_path, training_config)
    }

    pub fn load_model_config(&self) -> burn_digits::Result<Option<MlpConfig>> {
        match &self.model_config {
            Some(path) => artifacts::load_config(path),
            None => artifacts::load_model_config(&self.artifacts_path),
        }
    }

    pub fn save_model_config(&self, model_config: &MlpConfig) -> burn_digits::Result<()> {
        artifacts::save_model_config(&self.artifacts_path, model_config)
    }

    pub fn save_model<B: Backend>(&self, model: &Mlp<B>) -> burn_digits::Result<()> {
        artifacts::save_model(&self.artifacts_path, model)
    }

    pub fn load_model<B: Backend>(
        &self,
        model_config: &MlpConfig,
        device: &B::Device,
    ) -> burn_digits::Result<Option<Mlp<B>>> {
        artifacts::load_model(&self.artifacts_path, model_config, device)
    }

    pub fn load_or_save_model<B: Backend>(
        &self,
        model_config: &MlpConfig,
        device: &B::Device,
    ) -> burn_digits::Result<Mlp<B>> {
        if let Some(model) = self.load_model(model_config, device)? {
            return Ok(model);
        }
        println!("Initializing new model");
        let model_init = model_config.init(device);
        self.save_model(&model_init)?;
        Ok(model_init)
    }

    pub fn save_optim<AutoB, AutoM>(
        &self,
        optim: &impl Optimizer<AutoM, AutoB>,
    ) -> burn_digits::Result<()>
    where
        AutoB: AutodiffBackend,
        AutoM: AutodiffModule<AutoB>,
    {
        artifacts::save_optim(&self.artifacts_path, optim)
    }

    /// Restores a saved optimizer state into `optim_init`, otherwise saves the fresh one.
    pub fn load_or_save_optim<AutoB, AutoM, O>(
        &self,
        optim_init: O,
        device: &AutoB::Device,
    ) -> burn_digits::Result<O>
    where
        AutoB: AutodiffBackend,
        AutoM: AutodiffModule<AutoB>,
        O: Optimizer<AutoM, AutoB>,
    {
        let optim = artifacts::load_optim(&self.artifacts_path, optim_init, device)?;
        // saving an already-saved state is harmless
        self.save_optim::<AutoB, AutoM>(&optim)?;
        Ok(optim)
    }

    pub fn dataset(&self, split: Split) -> burn_digits::Result<MnistDataset> {
        match &self.data_dir {
            Some(dir) => MnistDataset::load(&dir.join(split.name()), split),
            None => MnistDataset::cached(split),
        }
    }
}

fn parse_path(s: &std::ffi::OsStr) -> Result<std::path::PathBuf, &'static str> {
    Ok(s.into())
}

fn new_artifacts_dir() -> Result<PathBuf, pico_args::Error> {
    // e.g. /tmp/burn-digits-digits-abcd-0
    let name = format!(
        "{}-{}-",
        std::env!("CARGO_PKG_NAME"), // burn-digits
        std::env!("CARGO_BIN_NAME")  // digits
    );
    let tmp = temp_dir::TempDir::with_prefix(name)
        .map_err(|err| pico_args::Error::ArgumentParsingFailed {
            cause: format!("failed to create the temporary directory: {err}"),
        })?
        .dont_delete_on_drop();
    let path = tmp.path().to_path_buf();
    println!("new artifacts directory: {path:?}");
    Ok(path)
}
