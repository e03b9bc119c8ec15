use anyhow::{Result, anyhow};
use image::RgbaImage;
use ndarray::{Array3, Array4, Axis};

use super::decode::{Vocabulary, greedy_decode};
use super::preprocess::prepare_batch;
use crate::calibration::PixelRect;

/// A line of recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognized {
    pub text: String,
    pub confidence: f32,
}

/// Fixed sequence-recognition network: `(n, 1, 32, 320)` in, `(n, T, V)` probabilities out.
pub trait SequenceModel {
    fn forward(&mut self, batch: &Array4<f32>) -> Result<Array3<f32>>;
}

/// Image + boxes → one line of text per box, in box order.
pub trait Recognize {
    fn recognize(&mut self, img: &RgbaImage, boxes: &[PixelRect]) -> Result<Vec<Recognized>>;
}

/// Preprocessing, model and decoding wired together.
pub struct TextRecognizer {
    model: Box<dyn SequenceModel + Send>,
    vocab: Vocabulary,
}

impl TextRecognizer {
    pub fn new(model: Box<dyn SequenceModel + Send>, vocab: Vocabulary) -> Self {
        Self { model, vocab }
    }
}

impl Recognize for TextRecognizer {
    fn recognize(&mut self, img: &RgbaImage, boxes: &[PixelRect]) -> Result<Vec<Recognized>> {
        if boxes.is_empty() {
            return Ok(Vec::new());
        }

        let batch = prepare_batch(img, boxes);
        let probs = self.model.forward(&batch)?;
        if probs.len_of(Axis(0)) != boxes.len() {
            return Err(anyhow!(
                "Model returned {} sequences for {} boxes",
                probs.len_of(Axis(0)),
                boxes.len()
            ));
        }
        if probs.len_of(Axis(2)) > self.vocab.len() {
            tracing::debug!(
                "Model vocabulary ({}) is larger than the dictionary ({})",
                probs.len_of(Axis(2)),
                self.vocab.len()
            );
        }

        Ok(probs
            .axis_iter(Axis(0))
            .map(|seq| {
                let (text, confidence) = greedy_decode(seq, &self.vocab);
                Recognized { text, confidence }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Emits a fixed index sequence for every box.
    struct ScriptedModel {
        steps: Vec<usize>,
        vocab_size: usize,
        calls: usize,
    }

    impl SequenceModel for ScriptedModel {
        fn forward(&mut self, batch: &Array4<f32>) -> Result<Array3<f32>> {
            self.calls += 1;
            assert_eq!(&batch.shape()[1..], &[1, 32, 320]);
            let n = batch.len_of(Axis(0));
            let mut out = Array3::<f32>::zeros((n, self.steps.len(), self.vocab_size));
            for b in 0..n {
                for (t, &i) in self.steps.iter().enumerate() {
                    out[[b, t, i]] = 0.8;
                }
            }
            Ok(out)
        }
    }

    #[test]
    fn test_recognize_one_result_per_box() {
        let vocab = Vocabulary::from_dict_str("★\n");
        let model = ScriptedModel {
            steps: vec![1, 0, 1, 1, 0, 1],
            vocab_size: vocab.len(),
            calls: 0,
        };
        let mut recognizer = TextRecognizer::new(Box::new(model), vocab);
        let img = RgbaImage::from_pixel(100, 40, Rgba([200, 200, 200, 255]));
        let boxes = [PixelRect::new(0, 0, 50, 20), PixelRect::new(50, 20, 100, 40)];

        let out = recognizer.recognize(&img, &boxes).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "★★★");
        assert!((out[1].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_no_boxes_skips_model() {
        let mut recognizer = TextRecognizer::new(
            Box::new(ScriptedModel {
                steps: vec![],
                vocab_size: 2,
                calls: 0,
            }),
            Vocabulary::from_dict_str(""),
        );
        let out = recognizer.recognize(&RgbaImage::new(4, 4), &[]).unwrap();
        assert!(out.is_empty());
    }
}
