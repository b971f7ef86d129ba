//! Fingerprinted callback buttons and pagination
//!
//! Callback data is JSON `{"h": <fingerprint>, "p": <payload>}`. The hash
//! binds the button to the step instance that rendered it; the payload is
//! whatever the step needs back on a press.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bot_core::InlineKeyboardButton;

use crate::context::Ctx;
use crate::error::{EngineError, Result};
use crate::types::{Gate, Gatekeeper, StepState};

#[derive(Debug, Serialize, Deserialize)]
struct CallbackData {
    h: i32,
    p: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedButton {
    pub hash: i32,
    pub payload: Value,
}

const PAGE_PREFIX: &str = "page:";

/// Build a button stamped with the fingerprint of the rendering step
/// instance.
pub fn build_button(
    state: &StepState,
    label: &str,
    payload: impl Serialize,
) -> Result<InlineKeyboardButton> {
    let data = CallbackData {
        h: state.fingerprint(),
        p: serde_json::to_value(payload)?,
    };
    Ok(InlineKeyboardButton {
        text: label.to_string(),
        callback_data: serde_json::to_string(&data)?,
    })
}

/// Decode raw callback data. Malformed JSON and schema mismatches are
/// user-input errors: old clients can send anything.
pub fn decode_button(raw: &str) -> Result<DecodedButton> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| EngineError::InvalidCallback(format!("malformed callback data: {err}")))?;
    let data: CallbackData = serde_json::from_value(value).map_err(|_| {
        EngineError::InvalidCallback("callback data is missing \"h\" or \"p\"".into())
    })?;
    Ok(DecodedButton {
        hash: data.h,
        payload: data.p,
    })
}

pub fn page_button(state: &StepState, label: &str, page: u32) -> Result<InlineKeyboardButton> {
    build_button(state, label, format!("{PAGE_PREFIX}{page}"))
}

/// Extract the requested page from a decoded button payload, if it is a
/// page-navigation payload.
pub fn parse_page_payload(payload: &Value) -> Option<u32> {
    payload.as_str()?.strip_prefix(PAGE_PREFIX)?.parse().ok()
}

/// Append a `<-` / `->` control row when there are pages before/after the
/// current one.
pub fn add_page_buttons(
    state: &StepState,
    mut rows: Vec<Vec<InlineKeyboardButton>>,
    total_items: usize,
    page: u32,
    items_per_page: usize,
) -> Result<Vec<Vec<InlineKeyboardButton>>> {
    let mut controls = Vec::new();

    if page > 0 {
        controls.push(page_button(state, "<-", page - 1)?);
    }
    if total_items > (page as usize + 1) * items_per_page {
        controls.push(page_button(state, "->", page + 1)?);
    }

    if !controls.is_empty() {
        rows.push(controls);
    }
    Ok(rows)
}

/// Outcome of a page change requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFlow {
    /// The keyboard was re-rendered in place; stay on the step.
    Stay,
    /// The requested page is gone (raced with a concurrent deletion); leave
    /// the scene.
    Exit,
}

/// Gatekeeper handling page-navigation presses.
///
/// On a fingerprint-valid page callback it invokes `change_page` and swallows
/// the update (or drives `exit` when the page is gone). Every other update
/// passes through to the next gatekeeper.
pub fn paginate<F>(change_page: F) -> Gatekeeper
where
    F: for<'a> Fn(&'a Ctx, &'a mut StepState, u32) -> BoxFuture<'a, Result<PageFlow>>
        + Send
        + Sync
        + 'static,
{
    Box::new(move |ctx, state| {
        let page = ctx.update.callback_data().and_then(|raw| {
            let decoded = decode_button(raw).ok()?;
            if decoded.hash != state.fingerprint() {
                return None;
            }
            parse_page_payload(&decoded.payload)
        });

        match page {
            None => Box::pin(async { Ok(Some(Gate::Next)) }),
            Some(page) => {
                let fut = change_page(ctx, state, page);
                Box::pin(async move {
                    match fut.await? {
                        PageFlow::Stay => Ok(None),
                        PageFlow::Exit => Ok(Some(Gate::Exit)),
                    }
                })
            }
        }
    })
}
