//! Choose-one-item step with a paginated inline keyboard
//!
//! The item list lives behind [`ItemSource`] so the same step works for
//! accounts, categories, or anything else with an id and a label. Every
//! button is stamped with the rendering step instance's fingerprint, so
//! presses on keyboards from an earlier entry are ignored upstream.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use bot_core::{InlineKeyboardButton, InlineKeyboardMarkup, User};
use scene_engine::{
    add_page_buttons, build_button, callback_query, command, decode_button, exit_on, next_on,
    paginate, ActionResult, Ctx, Flow, Middleware, PageFlow, Result, Step, StepState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub label: String,
}

/// Pageable item listing. `find_page` returns one page of items plus the
/// total count across all pages.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn find_page(
        &self,
        user: &User,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<(Vec<Item>, usize)>;
}

pub struct ChooseItemOptions {
    pub name: String,
    pub prompt: String,
    /// Payload key the chosen item id is stored under.
    pub property: String,
    /// Sent when the source has nothing to offer; the scene is left.
    pub empty_text: String,
    pub per_page: usize,
}

async fn build_rows(
    source: &dyn ItemSource,
    state: &StepState,
    page: u32,
    per_page: usize,
) -> Result<Vec<Vec<InlineKeyboardButton>>> {
    let (items, total) = source
        .find_page(&state.user, page as usize * per_page, per_page)
        .await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        rows.push(vec![build_button(state, &item.label, item.id)?]);
    }
    add_page_buttons(state, rows, total, page, per_page)
}

/// A step that renders the source as a fingerprinted keyboard, one item per
/// row, and stores the pressed item's id. Page controls are handled before
/// the handler ever sees the press.
pub fn choose_item_step(options: ChooseItemOptions, source: Arc<dyn ItemSource>) -> Step {
    let ChooseItemOptions {
        name,
        prompt,
        property,
        empty_text,
        per_page,
    } = options;

    let enter_source = Arc::clone(&source);
    let enter_prompt = prompt;
    let enter_empty = empty_text.clone();
    let on_enter: Middleware<StepState> = Box::new(move |ctx, state| {
        let source = Arc::clone(&enter_source);
        let prompt = enter_prompt.clone();
        let empty_text = enter_empty.clone();
        Box::pin(async move {
            let rows = build_rows(&*source, &*state, 0, per_page).await?;
            if rows.is_empty() {
                ctx.reply(&empty_text).await?;
                return Ok(Flow::Halt);
            }
            ctx.reply_with_keyboard(&prompt, InlineKeyboardMarkup::new(rows))
                .await?;
            Ok(Flow::Continue)
        })
    });

    fn constrain_page_fn<F>(f: F) -> F
    where
        F: for<'a> Fn(
            &'a Ctx,
            &'a mut StepState,
            u32,
        ) -> futures::future::BoxFuture<'a, Result<PageFlow>>,
    {
        f
    }

    let page_source = Arc::clone(&source);
    let change_page = constrain_page_fn(move |ctx: &Ctx, state: &mut StepState, page: u32| {
        let source = Arc::clone(&page_source);
        let empty_text = empty_text.clone();
        Box::pin(async move {
            let rows = build_rows(&*source, &*state, page, per_page).await?;
            if rows.is_empty() {
                // the listing emptied under the open keyboard
                ctx.reply(&empty_text).await?;
                return Ok(PageFlow::Exit);
            }
            ctx.edit_message_reply_markup(InlineKeyboardMarkup::new(rows))
                .await?;
            ctx.answer_callback().await?;
            Ok(PageFlow::Stay)
        })
    });

    Step::builder(name)
        .on_enter(on_enter)
        .gate(exit_on(command("cancel")))
        .gate(next_on(callback_query()))
        .gate(paginate(change_page))
        .handle(move |ctx: &Ctx, state: &mut StepState| {
            let property = property.clone();
            Box::pin(async move {
                let Some(raw) = ctx.update.callback_data() else {
                    return Ok(None);
                };
                let decoded = decode_button(raw)?;

                let Some(id) = decoded.payload.as_str() else {
                    ctx.reply("Invalid choice, try starting over").await?;
                    ctx.answer_callback().await?;
                    return Ok(Some(ActionResult::Exit));
                };

                state.payload.insert(property, json!(id));
                ctx.answer_callback().await?;
                Ok(Some(ActionResult::Next))
            })
        })
}
