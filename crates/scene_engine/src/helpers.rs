//! Middleware and gatekeeper combinators
//!
//! Small builders covering the recurring shapes: prompt the user, map a
//! command to a gate action, let a class of input through.

use crate::context::Ctx;
use crate::filters::Filter;
use crate::types::{Flow, Gate, Gatekeeper, Middleware, SceneAfterMiddleware};

/// Middleware that sends a text reply and continues.
pub fn reply<S: 'static>(text: impl Into<String>) -> Middleware<S> {
    let text = text.into();
    Box::new(move |ctx: &Ctx, _state: &mut S| {
        let text = text.clone();
        Box::pin(async move {
            ctx.reply(&text).await?;
            Ok(Flow::Continue)
        })
    })
}

/// Middleware that replies only when the filter matches, and always
/// continues.
pub fn reply_on<S: 'static>(text: impl Into<String>, filter: Filter) -> Middleware<S> {
    let text = text.into();
    Box::new(move |ctx: &Ctx, _state: &mut S| {
        let hit = filter.matches(&ctx.update, None);
        let text = text.clone();
        Box::pin(async move {
            if hit {
                ctx.reply(&text).await?;
            }
            Ok(Flow::Continue)
        })
    })
}

/// Scene `after` middleware that replies when the filter matches the final
/// update (e.g. "Ok, canceled" on `/cancel`), and always continues.
pub fn after_reply_on(text: impl Into<String>, filter: Filter) -> SceneAfterMiddleware {
    let text = text.into();
    Box::new(move |ctx, _state, _action| {
        let hit = filter.matches(&ctx.update, None);
        let text = text.clone();
        Box::pin(async move {
            if hit {
                ctx.reply(&text).await?;
            }
            Ok(Flow::Continue)
        })
    })
}

/// Gatekeeper that exits the scene when the filter matches, and otherwise
/// lets the input continue.
pub fn exit_on(filter: Filter) -> Gatekeeper {
    Box::new(move |ctx, state| {
        let hit = filter.matches(&ctx.update, Some(&*state));
        Box::pin(async move { Ok(Some(if hit { Gate::Exit } else { Gate::Next })) })
    })
}

/// Gatekeeper that lets matching input continue and swallows everything
/// else.
pub fn next_on(filter: Filter) -> Gatekeeper {
    Box::new(move |ctx, state| {
        let hit = filter.matches(&ctx.update, Some(&*state));
        Box::pin(async move { Ok(if hit { Some(Gate::Next) } else { None }) })
    })
}

/// Gatekeeper that skips the handler (advancing to the next step) when the
/// filter matches.
pub fn skip_on(filter: Filter) -> Gatekeeper {
    Box::new(move |ctx, state| {
        let hit = filter.matches(&ctx.update, Some(&*state));
        Box::pin(async move { Ok(Some(if hit { Gate::Skip } else { Gate::Next })) })
    })
}
