pub mod source;
pub mod annotations;
pub mod image_folder;
pub mod batcher;

pub use source::{DatasetError, Example, ExampleSource, SampleMode};
pub use annotations::load_annotations;
pub use image_folder::{ImageDecode, ImageFolder};
pub use batcher::Batcher;
