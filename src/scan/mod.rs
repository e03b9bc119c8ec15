//! Inventory scanning: the state machine, its session bookkeeping and the
//! worker that runs it.

pub mod events;
pub mod filter;
pub mod machine;
pub mod matching;
pub mod runner;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{ScanEvent, event_channel};
pub use filter::ScanFilter;
pub use machine::{ScanMachine, ScanOutcome};
pub use runner::{CancelToken, ScanContext, ScanHandle, ScanRequest, Scanner};
pub use state::ScanState;
