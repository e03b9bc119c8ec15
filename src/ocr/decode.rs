//! Greedy CTC decoding of the model's per-step probabilities.

use anyhow::{Context, Result};
use ndarray::ArrayView2;
use std::fs;
use std::path::Path;

/// Symbol table of the recognition model.
///
/// Index 0 is the blank symbol and decodes to nothing; the dictionary entries
/// follow in file order and a space closes the table.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    symbols: Vec<String>,
}

impl Vocabulary {
    /// Builds the table from dictionary text, one symbol per line.
    pub fn from_dict_str(dict: &str) -> Self {
        let mut symbols = vec![String::new()];
        symbols.extend(dict.lines().map(|line| line.trim().to_string()));
        symbols.push(" ".to_string());
        Self { symbols }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let dict = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary {}", path.display()))?;
        Ok(Self::from_dict_str(&dict))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol for `index`; out-of-range indices decode to nothing.
    pub fn symbol(&self, index: usize) -> &str {
        self.symbols.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Collapses runs of the same index into one.
pub fn collapse_repeats(indices: &[usize]) -> Vec<usize> {
    let mut out = indices.to_vec();
    out.dedup();
    out
}

/// Decodes one `T×V` probability matrix into text and its confidence.
///
/// Confidence is the lowest of the per-step maxima.
pub fn greedy_decode(probs: ArrayView2<f32>, vocab: &Vocabulary) -> (String, f32) {
    let mut best = Vec::with_capacity(probs.nrows());
    let mut confidence = f32::INFINITY;

    for step in probs.rows() {
        let (index, value) = step
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
        best.push(index);
        confidence = confidence.min(value);
    }

    let text = collapse_repeats(&best)
        .into_iter()
        .map(|i| vocab.symbol(i))
        .collect();

    if confidence.is_infinite() {
        confidence = 0.0;
    }
    (text, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn vocab() -> Vocabulary {
        Vocabulary::from_dict_str("生\n命\n值\n+\n1\n2\n")
    }

    fn one_hot(indices: &[usize], width: usize, p: f32) -> Array2<f32> {
        let mut m = Array2::<f32>::from_elem((indices.len(), width), (1.0 - p) / width as f32);
        for (t, &i) in indices.iter().enumerate() {
            m[[t, i]] = p;
        }
        m
    }

    #[test]
    fn test_vocabulary_layout() {
        let v = vocab();
        assert_eq!(v.len(), 8);
        assert_eq!(v.symbol(0), "");
        assert_eq!(v.symbol(1), "生");
        assert_eq!(v.symbol(7), " ");
        assert_eq!(v.symbol(99), "");
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let seqs: [&[usize]; 4] = [&[], &[1, 1, 0, 1], &[3, 3, 3], &[0, 2, 2, 0, 0, 5]];
        for s in seqs {
            let once = collapse_repeats(s);
            assert_eq!(collapse_repeats(&once), once);
        }
        assert_eq!(collapse_repeats(&[1, 1, 0, 1]), vec![1, 0, 1]);
    }

    #[test]
    fn test_greedy_decode_blanks_and_repeats() {
        // 生 生 _ 命 值 值 _ _ + 1 _ 1 2
        let steps = [1, 1, 0, 2, 3, 3, 0, 0, 4, 5, 0, 5, 6];
        let probs = one_hot(&steps, 8, 0.9);
        let (text, conf) = greedy_decode(probs.view(), &vocab());
        assert_eq!(text, "生命值+112");
        assert!((conf - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_is_minimum() {
        let mut probs = one_hot(&[1, 2], 8, 0.9);
        probs[[1, 2]] = 0.4;
        let (_, conf) = greedy_decode(probs.view(), &vocab());
        assert!((conf - 0.4).abs() < 1e-6);
    }
}
