//! Scene/step data model
//!
//! Declarative descriptions of wizards: immutable after registration.

mod action;
mod scene;
mod state;
mod step;

pub use action::{ActionResult, Flow, Gate, StepSelector};
pub use scene::{MatchFn, Scene, SceneAfterMiddleware};
pub use state::{EntryState, ExitState, Payload, StepState};
pub use step::{AfterInputMiddleware, Gatekeeper, InputHandler, Middleware, Step, StepBuilder};
