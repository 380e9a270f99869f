use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Serialize, Deserialize};

use crate::data::annotations::load_annotations;
use crate::data::source::{DatasetError, Example, ExampleSource, SampleMode};

/// How a decoded image becomes a flat input vector. Pixels are resized with
/// Lanczos3 and normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImageDecode {
    /// Single luminance channel; vector length `width * height`.
    Grayscale { width: u32, height: u32 },
    /// Interleaved R, G, B; vector length `width * height * 3`.
    Rgb { width: u32, height: u32 },
}

impl ImageDecode {
    fn apply(&self, img: &DynamicImage) -> Vec<f64> {
        match *self {
            ImageDecode::Grayscale { width, height } => {
                let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
                let gray = resized.to_luma8();
                gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect()
            }
            ImageDecode::Rgb { width, height } => {
                let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
                let rgb = resized.to_rgb8();
                rgb.pixels()
                    .flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0))
                    .collect()
            }
        }
    }
}

/// Image transformation applied to each retrieved view before decoding,
/// e.g. a random crop or flip for dual-view training.
pub type Augment = Box<dyn Fn(DynamicImage) -> DynamicImage + Send + Sync>;

/// An indexed image dataset rooted at an explicit directory.
///
/// Entries are `(relative_path, label)` pairs resolved against `root_dir`
/// at retrieval time. The [`SampleMode`] decides the shape of each example:
/// labeled, unlabeled, or two independently augmented views. Both the root
/// directory and the annotation file are constructor parameters; nothing is
/// hardcoded.
pub struct ImageFolder {
    root_dir: PathBuf,
    entries: Vec<(String, usize)>,
    mode: SampleMode,
    decode: ImageDecode,
    augment: Option<Augment>,
}

impl ImageFolder {
    /// Builds a dataset from in-memory entries. For `Unlabeled` and
    /// `DualView` modes the labels are carried but never surfaced.
    pub fn new(
        root_dir: impl Into<PathBuf>,
        entries: Vec<(String, usize)>,
        mode: SampleMode,
        decode: ImageDecode,
    ) -> ImageFolder {
        ImageFolder {
            root_dir: root_dir.into(),
            entries,
            mode,
            decode,
            augment: None,
        }
    }

    /// Builds a dataset by reading `(path, label)` entries from an
    /// annotation file.
    pub fn from_annotations(
        root_dir: impl Into<PathBuf>,
        annotation_path: &Path,
        mode: SampleMode,
        decode: ImageDecode,
    ) -> Result<ImageFolder, DatasetError> {
        let entries = load_annotations(annotation_path)?;
        Ok(ImageFolder::new(root_dir, entries, mode, decode))
    }

    /// Installs a per-view augmentation. Dual-view mode applies it
    /// independently to each view.
    pub fn with_augment(mut self, augment: Augment) -> ImageFolder {
        self.augment = Some(augment);
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(_, label)| *label)
    }

    fn open(&self, rel_path: &str) -> Result<DynamicImage, DatasetError> {
        let full = self.root_dir.join(rel_path);
        image::open(&full)
            .map_err(|e| DatasetError(format!("cannot decode {}: {}", full.display(), e)))
    }

    /// Decodes one view, applying the augmentation if installed.
    fn view(&self, img: &DynamicImage) -> Vec<f64> {
        match &self.augment {
            Some(augment) => self.decode.apply(&augment(img.clone())),
            None => self.decode.apply(img),
        }
    }
}

impl ExampleSource for ImageFolder {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, index: usize) -> Result<Example, DatasetError> {
        let (rel_path, label) = self
            .entries
            .get(index)
            .ok_or_else(|| {
                DatasetError(format!(
                    "index {} out of range for dataset of {}",
                    index,
                    self.entries.len()
                ))
            })?;
        let img = self.open(rel_path)?;

        Ok(match self.mode {
            SampleMode::Labeled => Example::Labeled {
                input: self.view(&img),
                label: *label,
            },
            SampleMode::Unlabeled => Example::Unlabeled { input: self.view(&img) },
            SampleMode::DualView => Example::DualView {
                first: self.view(&img),
                second: self.view(&img),
            },
        })
    }
}
