//! Monetary amount input step

use serde_json::json;

use bot_core::{parsers::parse_number, Kind};
use scene_engine::{
    command, exit_on, message, next_on, reply, skip_on, ActionResult, Ctx, Step, StepState,
};

pub struct SumStepOptions {
    pub name: String,
    pub prompt: String,
    /// Payload key the parsed amount is stored under.
    pub property: String,
    pub optional: bool,
}

/// A step that prompts for an amount and stores the parsed number. Invalid
/// input gets a format hint and the step stays active.
pub fn sum_step(options: SumStepOptions) -> Step {
    let SumStepOptions {
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

                let Some(sum) = parse_number(text) else {
                    ctx.reply(
                        "Sum should be in format 123.45 or -123.45 (max 2 decimal places)",
                    )
                    .await?;
                    return Ok(None);
                };

                state.payload.insert(property, json!(sum));
                Ok(Some(ActionResult::Next))
            })
        })
}
