//! Text recognition for the inventory detail panel.

pub mod decode;
pub mod engine;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;

pub use decode::Vocabulary;
pub use engine::{Recognize, Recognized, SequenceModel, TextRecognizer};

use anyhow::Result;
use std::path::Path;

/// Loads the model and dictionary into a ready recognizer.
#[cfg(feature = "onnx")]
pub fn load_recognizer(model_path: &Path, dict_path: &Path) -> Result<TextRecognizer> {
    let vocab = Vocabulary::from_file(dict_path)?;
    let model = onnx::OnnxModel::load(model_path)?;
    Ok(TextRecognizer::new(Box::new(model), vocab))
}

/// Loads the model and dictionary into a ready recognizer.
#[cfg(not(feature = "onnx"))]
pub fn load_recognizer(model_path: &Path, _dict_path: &Path) -> Result<TextRecognizer> {
    Err(anyhow::anyhow!(
        "cannot load {}: built without the `onnx` feature",
        model_path.display()
    ))
}
