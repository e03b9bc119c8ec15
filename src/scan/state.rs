/// Scan state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Pointer to the anchor, nudge the list to its top
    Begin,
    /// Sample the first and last card to decide whether the page can be skipped
    CheckPageSkippable,
    /// Reset the cursor to the first card of the page
    IterStart,
    /// Click the next card
    IterClickNext,
    /// Capture the detail panel of the clicked card
    IterCaptureScreenshot,
    /// Recognize the last captured detail panel
    IterRecognize,
    /// Queue one page worth of cards to scroll
    ScrollNextPage,
    /// Scroll card by card until the queued count is reached or the list ends
    ScrollCards,
    /// End of the list or of the requested range
    EndByEnding,
    /// The user interrupted the scan
    EndByUser,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::EndByEnding | ScanState::EndByUser)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Begin => write!(f, "Begin"),
            ScanState::CheckPageSkippable => write!(f, "Checking page"),
            ScanState::IterStart => write!(f, "Starting page"),
            ScanState::IterClickNext => write!(f, "Clicking card"),
            ScanState::IterCaptureScreenshot => write!(f, "Capturing"),
            ScanState::IterRecognize => write!(f, "Recognizing"),
            ScanState::ScrollNextPage => write!(f, "Next page"),
            ScanState::ScrollCards => write!(f, "Scrolling"),
            ScanState::EndByEnding => write!(f, "Finished"),
            ScanState::EndByUser => write!(f, "Interrupted"),
        }
    }
}
