//! Scanner configuration loaded from config.json.
//!
//! Every field has a default, so a partial file only overrides what it names.
//! A missing or unreadable file falls back to the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::export::ExportFormat;

/// Waits between pointer actions and captures, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanTiming {
    /// After clicking the first card of a page, before capturing it
    pub settle_ms: u64,
    /// After clicking a card sampled for the page skip check
    pub sample_ms: u64,
    /// After each wheel tick while watching for card boundaries
    pub scroll_tick_ms: u64,
    /// After each wheel tick of a blind fast-forward
    pub fast_scroll_tick_ms: u64,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            sample_ms: 50,
            scroll_tick_ms: 50,
            fast_scroll_tick_ms: 10,
        }
    }
}

impl ScanTiming {
    /// All waits zero; scans run as fast as the surface answers.
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            sample_ms: 0,
            scroll_tick_ms: 0,
            fast_scroll_tick_ms: 0,
        }
    }
}

/// Sleeps for `ms` milliseconds, skipping the syscall for zero.
pub fn wait_ms(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    /// Anchor strip similarity above which the list rests on a card boundary
    pub anchor_match: f64,
    /// Whole-frame similarity above which a scroll tick produced no motion
    pub frame_unchanged: f64,
    /// Pointer displacement (pixels, per axis) treated as user interference
    pub pointer_tolerance_px: i32,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            anchor_match: 0.8,
            frame_unchanged: 0.95,
            pointer_tolerance_px: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Recognition model (ONNX)
    pub model_path: PathBuf,
    /// Model dictionary, one symbol per line
    pub dict_path: PathBuf,
    /// Directory of layout definition JSON files
    pub layouts_dir: PathBuf,
    /// Directory of export vocabulary overrides (`mona.json`, `yuanmo.json`)
    pub mapper_dir: PathBuf,
    /// Replaces the builtin game-text tables when set
    pub localization_path: Option<PathBuf>,
    /// Game window titles, tried in order
    pub window_titles: Vec<String>,
    pub export_format: ExportFormat,
    pub timing: ScanTiming,
    pub thresholds: MatchThresholds,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/latest.onnx"),
            dict_path: PathBuf::from("model/dict.txt"),
            layouts_dir: PathBuf::from("config/layouts"),
            mapper_dir: PathBuf::from("config/mapper"),
            localization_path: None,
            window_titles: vec!["原神".to_string(), "Genshin Impact".to_string()],
            export_format: ExportFormat::Mona,
            timing: ScanTiming::default(),
            thresholds: MatchThresholds::default(),
        }
    }
}

impl ScannerConfig {
    /// Resolves relative paths against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.model_path);
        resolve(&mut self.dict_path);
        resolve(&mut self.layouts_dir);
        resolve(&mut self.mapper_dir);
        if let Some(p) = self.localization_path.as_mut() {
            resolve(p);
        }
        self
    }
}

/// Loads configuration from `path`, or returns defaults.
pub fn load_config(path: &Path) -> ScannerConfig {
    info!("Looking for config at: {}", path.display());

    if !path.exists() {
        info!("{} not found. Using default config.", path.display());
        return ScannerConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                ScannerConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
            ScannerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.thresholds.anchor_match, 0.8);
        assert_eq!(config.thresholds.frame_unchanged, 0.95);
        assert_eq!(config.thresholds.pointer_tolerance_px, 10);
        assert_eq!(config.timing.settle_ms, 100);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "export_format": "yuanmo", "timing": { "settle_ms": 250 } }"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.export_format, ExportFormat::Yuanmo);
        assert_eq!(config.timing.settle_ms, 250);
        assert_eq!(config.timing.sample_ms, 50);
        assert_eq!(config.window_titles.len(), 2);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_config(&path), ScannerConfig::default());
        assert_eq!(
            load_config(&dir.path().join("missing.json")),
            ScannerConfig::default()
        );
    }

    #[test]
    fn test_resolve_paths() {
        let dir = TempDir::new().unwrap();
        let absolute = dir.path().join("dict.txt");
        let config = ScannerConfig {
            dict_path: absolute.clone(),
            ..Default::default()
        }
        .resolve_paths(Path::new("scanner"));
        assert_eq!(
            config.model_path,
            Path::new("scanner").join("model/latest.onnx")
        );
        assert_eq!(config.dict_path, absolute);
    }
}
