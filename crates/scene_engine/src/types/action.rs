//! Transition decisions and chain control values

/// Selects a step by name or positional index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSelector {
    Name(String),
    Index(usize),
}

impl From<&str> for StepSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<usize> for StepSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// The transition chosen by a step handler. Returning it (rather than calling
/// one of several action callbacks) makes "more than one action per
/// invocation" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// Advance to the next step, or complete the scene on the last one.
    Next,
    /// Return to the previous step. Fatal on the first step.
    Back,
    SelectStep(StepSelector),
    /// Re-enter the current step, re-running its entry hooks.
    Repeat,
    /// Leave the scene immediately.
    Exit,
}

/// Continuation decision of a linear middleware: `Continue` is the analogue
/// of calling `next()`, `Halt` leaves the chain incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Action taken by an input gatekeeper. Returning `None` instead swallows the
/// update without further processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Let the input continue towards the handler.
    Next,
    /// Leave the scene without running the handler.
    Exit,
    /// Advance to the next step without running the handler.
    Skip,
}
