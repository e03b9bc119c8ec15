//! ONNX Runtime backend for the recognition model.

use anyhow::{Context, Result, anyhow};
use ndarray::{Array3, Array4};
use ort::logging::LogLevel;
use ort::session::{Session, SessionInputs};
use ort::value::TensorRef;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

use super::engine::SequenceModel;

const INPUT_NAME: &str = "input";

pub struct OnnxModel {
    session: Session,
}

impl OnnxModel {
    pub fn load(path: &Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| anyhow!("{e}"))?
            .with_log_level(LogLevel::Error)
            .map_err(|e| anyhow!("{e}"))?
            .commit_from_file(path)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Failed to load recognition model {}", path.display()))?;
        info!("Loaded recognition model {}", path.display());
        Ok(Self { session })
    }
}

impl SequenceModel for OnnxModel {
    fn forward(&mut self, batch: &Array4<f32>) -> Result<Array3<f32>> {
        let dims: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
        let data = batch
            .as_slice()
            .ok_or_else(|| anyhow!("Input batch is not contiguous"))?;
        let tensor = TensorRef::from_array_view((dims, data)).map_err(|e| anyhow!("{e}"))?;

        let inputs: SessionInputs<'_, '_, 0> =
            SessionInputs::ValueMap(vec![(Cow::Borrowed(INPUT_NAME), tensor.into())]);
        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| anyhow!("Recognition model failed: {e}"))?;

        let (shape, values) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Unexpected model output: {e}"))?;
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        let [n, t, v] = shape[..] else {
            return Err(anyhow!("Expected a 3D output, got shape {:?}", shape));
        };
        Array3::from_shape_vec((n, t, v), values.to_vec()).context("Malformed model output")
    }
}
