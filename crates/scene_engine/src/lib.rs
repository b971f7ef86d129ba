//! Scene/step orchestration engine
//!
//! A persistent, resumable finite state machine layered over a stateless
//! chat transport. Scenes are multi-step wizards; the engine keeps each
//! user's position durable across process restarts, classifies every inbound
//! update against the active step, and drives transitions from handler
//! results.
//!
//! The moving parts:
//! - [`registry::SceneRegistry`] holds the declarative scene set
//! - [`dispatcher::Dispatcher`] routes updates through the two controllers
//! - [`middleware`] runs the entry / gatekeeper / after chains
//! - [`fingerprint`] stamps step instances so stale keyboards are rejected
//! - [`buttons`] and [`helpers`] are the building blocks steps are made of

pub mod buttons;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod filters;
pub mod fingerprint;
pub mod helpers;
pub mod middleware;
pub mod registry;
pub mod types;

pub use buttons::{
    add_page_buttons, build_button, decode_button, page_button, paginate, DecodedButton, PageFlow,
};
pub use context::Ctx;
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{EngineError, Result};
pub use filters::{any_command, any_of, callback_query, command, message, use_if, Filter};
pub use fingerprint::{fingerprint, validate_fingerprint};
pub use helpers::{after_reply_on, exit_on, next_on, reply, reply_on, skip_on};
pub use registry::SceneRegistry;
pub use types::{
    ActionResult, AfterInputMiddleware, EntryState, ExitState, Flow, Gate, Gatekeeper,
    InputHandler, MatchFn, Middleware, Payload, Scene, SceneAfterMiddleware, Step, StepBuilder,
    StepSelector, StepState,
};
