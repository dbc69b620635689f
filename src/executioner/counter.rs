//! Run statistics.

/// Aggregate tallies for one execution run. Advance-only; owned exclusively
/// by the run that created it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    events_total: u64,
    evaluated: u64,
    scheduled: u64,
    executed: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of kickoff events in the campaign. Advanced once per run.
    pub fn events_total(&self) -> u64 {
        self.events_total
    }

    /// Event x contact pairs considered so far.
    pub fn evaluated(&self) -> u64 {
        self.evaluated
    }

    /// Pairs deferred to a future execution time.
    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }

    /// Pairs dispatched for immediate execution. Tallied by the executor.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn advance_events(&mut self, n: u64) {
        self.events_total += n;
    }

    pub fn advance_evaluated(&mut self, n: u64) {
        self.evaluated += n;
    }

    pub fn advance_scheduled(&mut self, n: u64) {
        self.scheduled += n;
    }

    pub fn advance_executed(&mut self, n: u64) {
        self.executed += n;
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} event(s), {} evaluated, {} scheduled, {} executed",
            self.events_total, self.evaluated, self.scheduled, self.executed
        )
    }
}
