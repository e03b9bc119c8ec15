//! Stored layout definitions and resolution matching.
//!
//! A definition describes the inventory screen at one design resolution. It is
//! used as-is for that resolution and scaled for any other capture with the
//! same aspect ratio.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::geometry::{CalibratedLayout, GridGeometry, PixelRect};
use crate::error::ScanError;

/// Relative aspect-ratio tolerance for reusing a definition at another resolution.
const ASPECT_TOLERANCE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Evenly spaced rows of the sub-attribute / set-name panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextRowsDefinition {
    pub rows: u32,
    pub row_height: f64,
    pub bound: [f64; 4],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub rows: u32,
    pub columns: u32,
    pub bound: [f64; 4],
    pub card_width: f64,
    pub card_height: f64,
}

/// Persisted layout of the inventory screen, rectangles as `[left, top, right, bottom]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    pub resolution: Resolution,
    pub count: [f64; 4],
    pub pos: [f64; 4],
    pub level: [f64; 4],
    pub main_attr: [f64; 4],
    pub main_value: [f64; 4],
    pub star: [f64; 4],
    pub lock: [f64; 4],
    pub equipper: [f64; 4],
    pub text_rows: TextRowsDefinition,
    pub grid: GridDefinition,
}

impl LayoutDefinition {
    /// Rejects definitions the scanner cannot walk: an empty grid or text panel,
    /// or a zero resolution.
    pub fn validate(&self) -> Result<()> {
        let Resolution { width, height } = self.resolution;
        if width == 0 || height == 0 {
            bail!("resolution {}x{} is empty", width, height);
        }
        if self.grid.rows == 0 || self.grid.columns == 0 {
            bail!(
                "grid has {} rows and {} columns",
                self.grid.rows,
                self.grid.columns
            );
        }
        if self.text_rows.rows == 0 {
            bail!("text panel has no rows");
        }
        Ok(())
    }

    fn aspect_ratio(&self) -> f64 {
        self.resolution.width as f64 / self.resolution.height as f64
    }

    /// Derives pixel boxes and grid geometry for a `width`×`height` capture.
    pub fn calibrate(&self, width: u32, height: u32) -> CalibratedLayout {
        let scale = width as f64 / self.resolution.width as f64;
        let rect = |edges: [f64; 4]| PixelRect::scaled(edges, scale);

        let rows = &self.text_rows;
        let [bl, bt, br, bb] = rows.bound;
        let row_gap = if rows.rows > 1 {
            (bb - bt - rows.row_height * rows.rows as f64) / (rows.rows - 1) as f64
        } else {
            0.0
        };
        let text_rows = (0..rows.rows)
            .map(|i| {
                let top = bt + i as f64 * (rows.row_height + row_gap);
                rect([bl, top, br, top + rows.row_height])
            })
            .collect();

        let grid = &self.grid;
        let bound = rect(grid.bound);
        let card_width = (grid.card_width * scale).round() as i32;
        let card_height = (grid.card_height * scale).round() as i32;
        let spacing = |extent: i32, card: i32, count: u32| {
            if count > 1 {
                ((extent - card * count as i32) as f64 / (count - 1) as f64) as i32
            } else {
                0
            }
        };

        CalibratedLayout {
            width,
            height,
            scale,
            count: rect(self.count),
            pos: rect(self.pos),
            level: rect(self.level),
            main_attr: rect(self.main_attr),
            main_value: rect(self.main_value),
            star: rect(self.star),
            lock: rect(self.lock),
            equipper: rect(self.equipper),
            text_rows,
            grid: GridGeometry {
                rows: grid.rows,
                columns: grid.columns,
                bound,
                card_width,
                card_height,
                spacing_x: spacing(bound.width(), card_width, grid.columns),
                spacing_y: spacing(bound.height(), card_height, grid.rows),
            },
        }
    }
}

/// Ordered collection of layout definitions.
#[derive(Clone, Debug, Default)]
pub struct LayoutRepository {
    definitions: Vec<LayoutDefinition>,
}

impl LayoutRepository {
    /// Keeps the valid definitions in order; invalid ones are dropped with a warning.
    pub fn new(definitions: Vec<LayoutDefinition>) -> Self {
        let definitions = definitions
            .into_iter()
            .filter(|def| match def.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        "Dropping {}x{} layout: {:#}",
                        def.resolution.width, def.resolution.height, e
                    );
                    false
                }
            })
            .collect();
        Self { definitions }
    }

    /// Builtin 16:9 and 16:10 definitions only.
    pub fn builtin() -> Self {
        Self::new(builtin_definitions())
    }

    /// Loads every `*.json` in `dir` (sorted by file name), followed by the builtins.
    ///
    /// Unparseable files are skipped with a warning. A missing directory yields
    /// the builtins alone.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut definitions = Vec::new();

        if dir.is_dir() {
            let mut paths: Vec<_> = fs::read_dir(dir)
                .with_context(|| format!("Failed to read layouts directory {}", dir.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            paths.sort();

            for path in paths {
                match load_definition(&path) {
                    Ok(def) => {
                        debug!(
                            "Loaded layout {} ({}x{})",
                            path.display(),
                            def.resolution.width,
                            def.resolution.height
                        );
                        definitions.push(def);
                    }
                    Err(e) => warn!("Skipping layout {}: {:#}", path.display(), e),
                }
            }
        } else {
            debug!("Layouts directory {} not found", dir.display());
        }

        definitions.extend(builtin_definitions());
        Ok(Self::new(definitions))
    }

    pub fn definitions(&self) -> &[LayoutDefinition] {
        &self.definitions
    }

    /// First definition with the exact resolution, else the first whose aspect
    /// ratio is within tolerance.
    pub fn select(&self, width: u32, height: u32) -> Option<&LayoutDefinition> {
        if width == 0 || height == 0 {
            return None;
        }
        let exact = self
            .definitions
            .iter()
            .find(|d| d.resolution.width == width && d.resolution.height == height);
        if exact.is_some() {
            return exact;
        }

        let ratio = width as f64 / height as f64;
        self.definitions
            .iter()
            .find(|d| ((d.aspect_ratio() - ratio) / ratio).abs() < ASPECT_TOLERANCE)
    }

    pub fn calibrate(&self, width: u32, height: u32) -> Result<CalibratedLayout, ScanError> {
        let def = self
            .select(width, height)
            .ok_or(ScanError::NoMatchingLayout { width, height })?;
        info!(
            "Using {}x{} layout for {}x{} capture",
            def.resolution.width, def.resolution.height, width, height
        );
        Ok(def.calibrate(width, height))
    }
}

fn load_definition(path: &Path) -> Result<LayoutDefinition> {
    let contents = fs::read_to_string(path)?;
    let definition: LayoutDefinition =
        serde_json::from_str(&contents).context("Invalid layout definition")?;
    definition.validate()?;
    Ok(definition)
}

fn builtin_definitions() -> Vec<LayoutDefinition> {
    vec![
        LayoutDefinition {
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            count: [1560.0, 28.0, 1800.0, 66.0],
            pos: [1310.0, 160.0, 1500.0, 195.0],
            level: [1320.0, 410.0, 1390.0, 440.0],
            main_attr: [1310.0, 265.0, 1500.0, 295.0],
            main_value: [1310.0, 295.0, 1540.0, 345.0],
            star: [1310.0, 350.0, 1560.0, 390.0],
            lock: [1720.0, 410.0, 1760.0, 450.0],
            equipper: [1360.0, 1015.0, 1800.0, 1050.0],
            text_rows: TextRowsDefinition {
                rows: 9,
                row_height: 34.0,
                bound: [1330.0, 470.0, 1800.0, 900.0],
            },
            grid: GridDefinition {
                rows: 5,
                columns: 8,
                bound: [117.0, 130.0, 1260.0, 950.0],
                card_width: 123.0,
                card_height: 153.0,
            },
        },
        LayoutDefinition {
            resolution: Resolution {
                width: 1440,
                height: 900,
            },
            count: [1170.0, 21.0, 1350.0, 50.0],
            pos: [983.0, 135.0, 1125.0, 162.0],
            level: [990.0, 330.0, 1043.0, 355.0],
            main_attr: [983.0, 214.0, 1125.0, 238.0],
            main_value: [983.0, 238.0, 1155.0, 276.0],
            star: [983.0, 282.0, 1170.0, 312.0],
            lock: [1290.0, 330.0, 1320.0, 360.0],
            equipper: [1020.0, 850.0, 1350.0, 876.0],
            text_rows: TextRowsDefinition {
                rows: 9,
                row_height: 26.0,
                bound: [998.0, 380.0, 1350.0, 740.0],
            },
            grid: GridDefinition {
                rows: 5,
                columns: 8,
                bound: [88.0, 110.0, 945.0, 800.0],
                card_width: 92.0,
                card_height: 115.0,
            },
        },
    ]
}
