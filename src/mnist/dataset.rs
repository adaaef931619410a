use super::{HEIGHT, NUM_CLASSES, WIDTH, idx};
use crate::error::{Error, Result};
use burn::data::dataset::{Dataset, InMemDataset};
use burn_common::network::downloader::download_file_as_bytes;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

// CVDF mirror of http://yann.lecun.com/exdb/mnist/
const URL: &str = "https://storage.googleapis.com/cvdf-datasets/mnist/";
const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    fn images_file(&self) -> &'static str {
        match self {
            Split::Train => TRAIN_IMAGES,
            Split::Test => TEST_IMAGES,
        }
    }

    fn labels_file(&self) -> &'static str {
        match self {
            Split::Train => TRAIN_LABELS,
            Split::Test => TEST_LABELS,
        }
    }
}

impl std::str::FromStr for Split {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            _ => Err(Error::UnknownSplit(s.to_string())),
        }
    }
}

/// MNIST item.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MnistItem {
    /// Image as a flat row-major array of brightness bytes (0 is background).
    ///
    /// # Shape
    /// [WIDTH * HEIGHT]
    pub image: Vec<u8>,

    /// Label of the image.
    /// Each value is in between 0 and 9.
    pub label: u8,
}

impl MnistItem {
    pub fn check(&self) -> Result<(), String> {
        if self.image.len() != WIDTH * HEIGHT {
            return Err(format!(
                "image has {} pixels, expected {}",
                self.image.len(),
                WIDTH * HEIGHT
            ));
        }
        if self.label as usize >= NUM_CLASSES {
            return Err(format!("label {} is not a digit", self.label));
        }
        Ok(())
    }

    pub(crate) fn check_all(items: &[MnistItem]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            item.check()
                .map_err(|reason| Error::InvalidItem { index, reason })?;
        }
        Ok(())
    }
}

/// The MNIST dataset consists of 70,000 28x28 black-and-white images in 10 classes (one for each digits), with 7,000
/// images per class. There are 60,000 training images and 10,000 test images.
///
/// The data is downloaded from the web from the [CVDF mirror](https://github.com/cvdfoundation/mnist).
pub struct MnistDataset {
    dataset: InMemDataset<MnistItem>,
}

impl Dataset<MnistItem> for MnistDataset {
    fn get(&self, index: usize) -> Option<MnistItem> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl MnistDataset {
    /// Creates a new train dataset, downloading it into the cache if needed.
    pub fn train() -> Result<Self> {
        Self::cached(Split::Train)
    }

    /// Creates a new test dataset, downloading it into the cache if needed.
    pub fn test() -> Result<Self> {
        Self::cached(Split::Test)
    }

    pub fn cached(split: Split) -> Result<Self> {
        let dir = Self::download(&cache_dir()?, split)?;
        Self::load(&dir, split)
    }

    /// Loads a split from a directory already holding the decompressed idx files.
    pub fn load(dir: &Path, split: Split) -> Result<Self> {
        // MNIST is tiny so we can load it in-memory
        // Train images (u8): 28 * 28 * 60000 = 47.04Mb
        // Test images (u8): 28 * 28 * 10000 = 7.84Mb
        let images_path = dir.join(split.images_file());
        let images = idx::read_images(&images_path)?;
        let labels = idx::read_labels(&dir.join(split.labels_file()))?;
        if images.len() != labels.len() {
            return Err(Error::InvalidIdx {
                path: images_path,
                reason: format!("{} images but {} labels", images.len(), labels.len()),
            });
        }

        let items = images
            .into_iter()
            .zip(labels)
            .map(|(image, label)| MnistItem { image, label })
            .collect();
        log::debug!("loaded the {} split from {dir:?}", split.name());

        Self::from_items(items)
    }

    /// Wraps already decoded items, rejecting any with a wrong image size or label.
    pub fn from_items(items: Vec<MnistItem>) -> Result<Self> {
        MnistItem::check_all(&items)?;
        Ok(Self {
            dataset: InMemDataset::new(items),
        })
    }

    /// Downloads the split files into `<cache_dir>/mnist/<split>` and returns that directory.
    ///
    /// Files already present are kept as they are.
    pub fn download(cache_dir: &Path, split: Split) -> Result<PathBuf> {
        let split_dir = cache_dir.join("mnist").join(split.name());
        create_dir_all(&split_dir).map_err(Error::io(&split_dir))?;

        download_file(split.images_file(), &split_dir)?;
        download_file(split.labels_file(), &split_dir)?;

        Ok(split_dir)
    }
}

/// Dataset files are stored in the burn-dataset cache directory.
pub fn cache_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or(Error::NoCacheDir)?
        .join(".cache")
        .join("burn-dataset"))
}

/// Download a gzipped file from the MNIST mirror and decompress it into `dest_dir`.
fn download_file(name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = dest_dir.join(name);
    if file_name.exists() {
        return Ok(file_name);
    }

    let url = format!("{URL}{name}.gz");
    log::debug!("downloading {url}");
    let bytes = download_file_as_bytes(&url, name);

    // never leaves a partial file under the final name
    let partial = file_name.with_extension("part");
    let mut output_file = File::create(&partial).map_err(Error::io(&partial))?;
    let mut gz_buffer = GzDecoder::new(&bytes[..]);
    std::io::copy(&mut gz_buffer, &mut output_file).map_err(Error::io(&partial))?;
    std::fs::rename(&partial, &file_name).map_err(Error::io(&file_name))?;

    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn write_split(dir: &Path, split: Split, items: &[MnistItem]) {
        let images: Vec<_> = items.iter().map(|item| item.image.clone()).collect();
        let labels: Vec<_> = items.iter().map(|item| item.label).collect();
        std::fs::write(dir.join(split.images_file()), idx::encode_images(&images)).unwrap();
        std::fs::write(dir.join(split.labels_file()), idx::encode_labels(&labels)).unwrap();
    }

    fn item(label: u8) -> MnistItem {
        MnistItem {
            image: vec![label * 20; WIDTH * HEIGHT],
            label,
        }
    }

    #[test]
    fn loads_split_from_directory() {
        let tmp = TempDir::new().unwrap();
        let items: Vec<_> = (0..10).map(item).collect();
        write_split(tmp.path(), Split::Test, &items);

        let dataset = MnistDataset::load(tmp.path(), Split::Test).unwrap();
        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.get(3), Some(item(3)));
        assert_eq!(dataset.get(10), None);
    }

    #[test]
    fn missing_files_are_io_errors() {
        let tmp = TempDir::new().unwrap();
        let err = MnistDataset::load(tmp.path(), Split::Train).err().unwrap();
        assert!(matches!(err, Error::Io { .. }), "{err}");
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), Split::Train, &[item(1), item(2)]);
        std::fs::write(
            tmp.path().join(TRAIN_LABELS),
            idx::encode_labels(&[1, 2, 3]),
        )
        .unwrap();

        let err = MnistDataset::load(tmp.path(), Split::Train).err().unwrap();
        assert!(matches!(err, Error::InvalidIdx { .. }), "{err}");
    }

    #[test]
    fn existing_files_are_not_downloaded_again() {
        let tmp = TempDir::new().unwrap();
        let split_dir = tmp.path().join("mnist").join("test");
        std::fs::create_dir_all(&split_dir).unwrap();
        write_split(&split_dir, Split::Test, &[item(4)]);

        // no network access happens when both files exist
        let dir = MnistDataset::download(tmp.path(), Split::Test).unwrap();
        assert_eq!(dir, split_dir);
        let dataset = MnistDataset::load(&dir, Split::Test).unwrap();
        assert_eq!(dataset.get(0).unwrap().label, 4);
    }

    #[test]
    fn malformed_items_are_rejected() {
        let not_a_digit = MnistItem {
            image: vec![0; WIDTH * HEIGHT],
            label: 10,
        };
        let err = MnistDataset::from_items(vec![item(2), not_a_digit])
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidItem { index: 1, .. }), "{err}");

        let truncated = MnistItem {
            image: vec![0; 27],
            label: 1,
        };
        let err = MnistDataset::from_items(vec![truncated]).err().unwrap();
        assert!(matches!(err, Error::InvalidItem { index: 0, .. }), "{err}");

        assert_eq!(MnistDataset::from_items(vec![item(9)]).unwrap().len(), 1);
    }

    #[test]
    fn split_names_round_trip() {
        for split in [Split::Train, Split::Test] {
            assert_eq!(split.name().parse::<Split>().unwrap(), split);
        }
        assert!(matches!(
            "valid".parse::<Split>(),
            Err(Error::UnknownSplit(_))
        ));
    }
}
