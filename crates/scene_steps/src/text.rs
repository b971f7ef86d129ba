//! Free-text input step

use serde_json::json;

use bot_core::Kind;
use scene_engine::{
    command, exit_on, message, next_on, reply, skip_on, ActionResult, Ctx, Step, StepState,
};

pub struct TextStepOptions {
    pub name: String,
    /// Sent to the user when the step becomes active.
    pub prompt: String,
    /// Payload key the raw text is stored under.
    pub property: String,
    /// When set, `/skip` advances past the step without storing anything.
    pub optional: bool,
}

/// A step that prompts for a line of text and stores it in the payload.
/// `/cancel` leaves the scene; anything that is not a text message is
/// ignored.
pub fn text_step(options: TextStepOptions) -> Step {
    let TextStepOptions {
        name,
        prompt,
        property,
        optional,
    } = options;

    let mut builder = Step::builder(name)
        .on_enter(reply(prompt))
        .gate(exit_on(command("cancel")));
    if optional {
        builder = builder.gate(skip_on(command("skip")));
    }

    builder
        .gate(next_on(message(Kind::Text)))
        .handle(move |ctx: &Ctx, state: &mut StepState| {
            let property = property.clone();
            Box::pin(async move {
                let Some(text) = ctx.update.text() else {
                    return Ok(None);
                };
                state.payload.insert(property, json!(text));
                Ok(Some(ActionResult::Next))
            })
        })
}
