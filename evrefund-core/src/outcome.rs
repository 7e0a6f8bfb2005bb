use std::fmt;

/// Tally of one run. Lives only until the summary line is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunOutcome {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Number of bills looked at.
    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} failed={} skipped={}",
            self.success, self.failed, self.skipped
        )
    }
}
