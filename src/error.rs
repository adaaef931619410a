use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid idx file {path:?}: {reason}")]
    InvalidIdx { path: PathBuf, reason: String },

    #[error("unknown dataset split {0:?}, expected \"train\" or \"test\"")]
    UnknownSplit(String),

    #[error("could not locate the home directory for the dataset cache")]
    NoCacheDir,

    #[error("failed to load the config {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Recorder(#[from] burn::record::RecorderError),

    /// Reading tensor values back to the host failed.
    #[error("tensor data conversion failed: {0}")]
    Data(String),

    #[error("item {index} is not a valid digit image: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("the dataset is empty")]
    EmptyDataset,

    #[error("the batch size must be at least 1")]
    ZeroBatchSize,

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    pub(crate) fn data(err: burn::tensor::DataError) -> Self {
        Error::Data(format!("{err:?}"))
    }
}
