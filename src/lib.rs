//! Artifact Scanner
//!
//! Reads the artifact inventory of a running game window: the grid is walked
//! card by card with pointer clicks and wheel scrolling, each detail panel is
//! screenshotted and run through a text recognition model, and the decoded
//! records are exported for external optimizer tools.
//!
//! - `calibration`: layout definitions scaled to the window resolution
//! - `ocr`: preprocessing, model inference and greedy decoding
//! - `artifact`: text-to-field mapping and the canonical record
//! - `scan`: the scan state machine and its worker
//! - `export`: destination schema encoders
//! - `capture`: capture and pointer capabilities over the game window

pub mod artifact;
pub mod calibration;
pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod ocr;
pub mod paths;
pub mod scan;

pub use error::{Result, ScanError};
pub use scan::{CancelToken, ScanContext, ScanEvent, ScanHandle, ScanRequest, Scanner};
