//! Ordered, short-circuiting stage driver.
//!
//! A file verdict is built from a list of stages. Stages run lazily in order
//! and the first terminal failure ends the list; later stages never run.

/// Outcome of a single verification stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<S> {
    /// The stage found nothing wrong; continue with the next one.
    Pass,
    /// Terminal failure with the status to report and a non-empty detail.
    Fail { status: S, detail: String },
}

impl<S> StageOutcome<S> {
    pub fn fail(status: S, detail: impl Into<String>) -> Self {
        Self::Fail {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// A deferred stage. Boxed so stages with different captures share one list.
pub type Stage<'a, S> = Box<dyn FnOnce() -> StageOutcome<S> + 'a>;

/// Run `stages` in order, returning the first failure or `Pass` if all pass.
pub fn run_stages<'a, S>(stages: Vec<Stage<'a, S>>) -> StageOutcome<S> {
    for stage in stages {
        let outcome = stage();
        if !outcome.is_pass() {
            return outcome;
        }
    }
    StageOutcome::Pass
}
