//! # Scene Steps
//!
//! Reusable step builders on top of `scene_engine`: free-text input, monetary
//! amounts, and choosing one item from a paginated inline keyboard. Scenes
//! compose these instead of re-wiring the cancel/skip/input gates by hand.

pub mod choose_item;
pub mod sum;
pub mod text;

// Re-exports
pub use choose_item::{choose_item_step, ChooseItemOptions, Item, ItemSource};
pub use sum::{sum_step, SumStepOptions};
pub use text::{text_step, TextStepOptions};
