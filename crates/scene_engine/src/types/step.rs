//! Step definition and its middleware signatures

use futures::future::BoxFuture;

use crate::context::Ctx;
use crate::error::Result;
use crate::types::action::{ActionResult, Flow, Gate};
use crate::types::state::StepState;

/// Linear middleware over some state `S`; returns [`Flow::Continue`] to keep
/// the chain going.
pub type Middleware<S> =
    Box<dyn for<'a> Fn(&'a Ctx, &'a mut S) -> BoxFuture<'a, Result<Flow>> + Send + Sync>;

/// Input gatekeeper: decides whether input reaches the step handler.
pub type Gatekeeper = Box<
    dyn for<'a> Fn(&'a Ctx, &'a mut StepState) -> BoxFuture<'a, Result<Option<Gate>>>
        + Send
        + Sync,
>;

/// The step handler: the only place allowed to choose a transition. `None`
/// means the input was consumed without transitioning (the step stays
/// active).
pub type InputHandler = Box<
    dyn for<'a> Fn(&'a Ctx, &'a mut StepState) -> BoxFuture<'a, Result<Option<ActionResult>>>
        + Send
        + Sync,
>;

/// Post-processing middleware observing the transition the handler chose.
pub type AfterInputMiddleware = Box<
    dyn for<'a> Fn(
            &'a Ctx,
            &'a mut StepState,
            Option<&'a ActionResult>,
        ) -> BoxFuture<'a, Result<Flow>>
        + Send
        + Sync,
>;

/// One stage within a scene.
pub struct Step {
    pub name: String,
    /// Run once when the step becomes active; an incomplete chain aborts the
    /// scene.
    pub on_enter: Vec<Middleware<StepState>>,
    /// Run before the handler on every input while this step is active.
    pub before_handle_input: Vec<Gatekeeper>,
    pub handle_input: InputHandler,
    /// Run after the handler; failures here never block the transition.
    pub after_handle_input: Vec<AfterInputMiddleware>,
}

impl Step {
    pub fn builder(name: impl Into<String>) -> StepBuilder {
        StepBuilder {
            name: name.into(),
            on_enter: Vec::new(),
            before_handle_input: Vec::new(),
            after_handle_input: Vec::new(),
        }
    }
}

pub struct StepBuilder {
    name: String,
    on_enter: Vec<Middleware<StepState>>,
    before_handle_input: Vec<Gatekeeper>,
    after_handle_input: Vec<AfterInputMiddleware>,
}

impl StepBuilder {
    pub fn on_enter(mut self, middleware: Middleware<StepState>) -> Self {
        self.on_enter.push(middleware);
        self
    }

    pub fn gate(mut self, gatekeeper: Gatekeeper) -> Self {
        self.before_handle_input.push(gatekeeper);
        self
    }

    pub fn after_input(mut self, middleware: AfterInputMiddleware) -> Self {
        self.after_handle_input.push(middleware);
        self
    }

    /// Set the required input handler and finish the step.
    pub fn handle<F>(self, handler: F) -> Step
    where
        F: for<'a> Fn(&'a Ctx, &'a mut StepState) -> BoxFuture<'a, Result<Option<ActionResult>>>
            + Send
            + Sync
            + 'static,
    {
        Step {
            name: self.name,
            on_enter: self.on_enter,
            before_handle_input: self.before_handle_input,
            handle_input: Box::new(handler),
            after_handle_input: self.after_handle_input,
        }
    }
}
