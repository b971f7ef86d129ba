//! Update predicates
//!
//! Pure classifiers over inbound updates. The callback filter additionally
//! checks the step-instance fingerprint when the caller supplies the current
//! step state, which is what rejects presses on stale keyboards.

use bot_core::{EntityKind, Kind, MessageContent, Update, UpdateKind};

use crate::buttons::decode_button;
use crate::types::{MatchFn, StepState};

/// A pure predicate over an update, optionally aware of the active step.
pub struct Filter(Box<dyn Fn(&Update, Option<&StepState>) -> bool + Send + Sync>);

impl Filter {
    pub fn new(f: impl Fn(&Update, Option<&StepState>) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn matches(&self, update: &Update, state: Option<&StepState>) -> bool {
        (self.0)(update, state)
    }
}

fn matches_command(update: &Update, name: Option<&str>) -> bool {
    let UpdateKind::Message(message) = &update.kind else {
        return false;
    };
    let MessageContent::Text { text, entities } = &message.content else {
        return false;
    };
    let Some(first) = entities.first() else {
        return false;
    };
    if first.kind != EntityKind::BotCommand || first.offset != 0 {
        return false;
    }
    let Some(raw) = text.get(..first.length) else {
        return false;
    };

    let mut parts = raw.splitn(2, '@');
    let cmd_part = parts.next().unwrap_or_default();
    let addressee = parts.next();

    if !cmd_part.starts_with('/') || cmd_part.len() < 2 {
        return false;
    }
    // always check against the bot's own username case-insensitively
    if let (Some(to), Some(me)) = (addressee, update.me.as_deref()) {
        if !to.eq_ignore_ascii_case(me) {
            return false;
        }
    }

    let cmd = &cmd_part[1..];
    name.map_or(true, |name| cmd == name)
}

/// Text message whose first entity is a bot command at offset 0, addressed to
/// this bot, matching `name`.
pub fn command(name: &str) -> Filter {
    let name = name.to_string();
    Filter::new(move |update, _state| matches_command(update, Some(&name)))
}

/// Any bot command addressed to this bot.
pub fn any_command() -> Filter {
    Filter::new(|update, _state| matches_command(update, None))
}

/// Message of the given kind that is NOT a command. Commands are never
/// treated as plain input.
pub fn message(kind: Kind) -> Filter {
    Filter::new(move |update, _state| {
        let UpdateKind::Message(message) = &update.kind else {
            return false;
        };
        message.kind() == kind && !matches_command(update, None)
    })
}

/// Data callback query. When a step state is supplied, the payload must
/// decode to `{h, p}` with `h` equal to that state's fingerprint; decode
/// failures and mismatches yield `false`.
pub fn callback_query() -> Filter {
    Filter::new(|update, state| {
        let UpdateKind::CallbackQuery(query) = &update.kind else {
            return false;
        };
        let Some(data) = query.data.as_deref() else {
            return false;
        };
        let Some(state) = state else {
            return true;
        };
        match decode_button(data) {
            Ok(decoded) => decoded.hash == state.fingerprint(),
            Err(_) => false,
        }
    })
}

/// Logical OR over filters.
pub fn any_of(filters: Vec<Filter>) -> Filter {
    Filter::new(move |update, state| filters.iter().any(|filter| filter.matches(update, state)))
}

/// Adapt a filter into a scene `matches` function.
pub fn use_if(filter: Filter) -> MatchFn {
    Box::new(move |ctx| {
        let hit = filter.matches(&ctx.update, None);
        Box::pin(async move { hit })
    })
}
