//! Events a scan reports to its caller.

use std::sync::mpsc::{Receiver, Sender, channel};

use crate::export::ExportDocument;

/// Everything a scan can report. A scan emits any number of non-terminal
/// events followed by exactly one terminal event.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    InvalidParameters,
    SwitchSurfaceFailed,
    NoMatchingLayout,
    ArtifactCountUnreadable,
    /// A card whose detail panel did not decode; the scan continues.
    RecognizeWarning { raw_fields: Vec<String> },
    ArtifactCount { count: u32 },
    Progress { percent: u8 },
    Finished { records: ExportDocument },
    InterruptedByUser { records: ExportDocument },
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ScanEvent::RecognizeWarning { .. }
                | ScanEvent::ArtifactCount { .. }
                | ScanEvent::Progress { .. }
        )
    }
}

/// Channel for callers that prefer receiving events over a callback.
///
/// Forward from the scan callback with `move |e| { let _ = tx.send(e); }`.
pub fn event_channel() -> (Sender<ScanEvent>, Receiver<ScanEvent>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(ScanEvent::InvalidParameters.is_terminal());
        assert!(
            ScanEvent::Finished {
                records: ExportDocument::Canonical(vec![])
            }
            .is_terminal()
        );
        assert!(!ScanEvent::Progress { percent: 3 }.is_terminal());
        assert!(
            !ScanEvent::RecognizeWarning {
                raw_fields: vec![]
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_event_channel_forwarding() {
        let (tx, rx) = event_channel();
        let mut on_event = move |e: ScanEvent| {
            let _ = tx.send(e);
        };
        on_event(ScanEvent::ArtifactCount { count: 12 });
        on_event(ScanEvent::InvalidParameters);
        assert!(matches!(rx.recv().unwrap(), ScanEvent::ArtifactCount { count: 12 }));
        assert!(rx.recv().unwrap().is_terminal());
    }
}
