//! Scene definition

use futures::future::BoxFuture;

use bot_core::Command;

use crate::context::Ctx;
use crate::error::Result;
use crate::types::action::{ActionResult, Flow, StepSelector};
use crate::types::state::{EntryState, ExitState};
use crate::types::step::{Middleware, Step};

/// Decides whether a scene claims an update. Only evaluated while no scene is
/// active for the user.
pub type MatchFn = Box<dyn for<'a> Fn(&'a Ctx) -> BoxFuture<'a, bool> + Send + Sync>;

/// Run on scene completion or exit, observing the final transition
/// ([`ActionResult::Next`] or [`ActionResult::Exit`]).
pub type SceneAfterMiddleware = Box<
    dyn for<'a> Fn(&'a Ctx, &'a mut ExitState, &'a ActionResult) -> BoxFuture<'a, Result<Flow>>
        + Send
        + Sync,
>;

/// A named, registrable multi-step conversation definition.
pub struct Scene {
    pub name: String,
    /// Optional entry in the transport-level command menu.
    pub command: Option<Command>,
    match_fn: MatchFn,
    /// Gate scene entry; an incomplete chain leaves the update unconsumed.
    pub before: Vec<Middleware<EntryState>>,
    pub steps: Vec<Step>,
    pub after: Vec<SceneAfterMiddleware>,
}

impl Scene {
    pub fn new(name: impl Into<String>, match_fn: MatchFn) -> Self {
        Self {
            name: name.into(),
            command: None,
            match_fn,
            before: Vec::new(),
            steps: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn command(mut self, command: impl Into<String>, description: impl Into<String>) -> Self {
        self.command = Some(Command::new(command, description));
        self
    }

    pub fn before(mut self, middleware: Middleware<EntryState>) -> Self {
        self.before.push(middleware);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn after(mut self, middleware: SceneAfterMiddleware) -> Self {
        self.after.push(middleware);
        self
    }

    pub async fn matches(&self, ctx: &Ctx) -> bool {
        (self.match_fn)(ctx).await
    }

    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.name == name)
    }

    pub fn resolve_selector(&self, selector: &StepSelector) -> Option<usize> {
        match selector {
            StepSelector::Name(name) => self.step_index(name),
            StepSelector::Index(index) if *index < self.steps.len() => Some(*index),
            StepSelector::Index(_) => None,
        }
    }
}
