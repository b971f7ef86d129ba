//! Middleware chain runners
//!
//! Two composition primitives: a linear runner for plain middlewares and a
//! gated runner for input gatekeepers that can short-circuit with `Exit` or
//! `Skip`. Both run strictly in array order and both stop at the first
//! middleware that errors, propagating the error to the caller.

use crate::context::Ctx;
use crate::error::Result;
use crate::types::{
    ActionResult, AfterInputMiddleware, ExitState, Flow, Gate, Gatekeeper, Middleware,
    SceneAfterMiddleware, StepState,
};

/// Run a linear chain. Returns `true` iff every middleware returned
/// [`Flow::Continue`] and the chain reached its end.
pub async fn run_chain<S>(
    ctx: &Ctx,
    middlewares: &[Middleware<S>],
    state: &mut S,
) -> Result<bool> {
    for middleware in middlewares {
        match middleware(ctx, state).await? {
            Flow::Continue => {}
            Flow::Halt => return Ok(false),
        }
    }
    Ok(true)
}

/// Run a gatekeeper chain.
///
/// `Some(Gate::Next)` continues to the next gatekeeper; `Exit` and `Skip`
/// short-circuit the rest of the chain and become its result; `None` swallows
/// the update (`None` overall). A chain that runs to its end, and the empty
/// chain, yield `Some(Gate::Next)`.
pub async fn run_gated_chain(
    ctx: &Ctx,
    gatekeepers: &[Gatekeeper],
    state: &mut StepState,
) -> Result<Option<Gate>> {
    for gatekeeper in gatekeepers {
        match gatekeeper(ctx, state).await? {
            Some(Gate::Next) => {}
            Some(gate) => return Ok(Some(gate)),
            None => return Ok(None),
        }
    }
    Ok(Some(Gate::Next))
}

/// Linear runner for step post-processing middlewares, which additionally
/// observe the transition the handler chose (if any).
pub async fn run_after_input_chain(
    ctx: &Ctx,
    middlewares: &[AfterInputMiddleware],
    state: &mut StepState,
    action: Option<&ActionResult>,
) -> Result<bool> {
    for middleware in middlewares {
        match middleware(ctx, state, action).await? {
            Flow::Continue => {}
            Flow::Halt => return Ok(false),
        }
    }
    Ok(true)
}

/// Linear runner for scene completion/exit middlewares.
pub async fn run_scene_after_chain(
    ctx: &Ctx,
    middlewares: &[SceneAfterMiddleware],
    state: &mut ExitState,
    action: &ActionResult,
) -> Result<bool> {
    for middleware in middlewares {
        match middleware(ctx, state, action).await? {
            Flow::Continue => {}
            Flow::Halt => return Ok(false),
        }
    }
    Ok(true)
}
