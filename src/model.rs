//! Action graph model
//!
//! Declarative story data: actions with their context preconditions and
//! effects, context slots, intent disambiguation rules, unknown-input
//! fallbacks and story settings. Pure data plus lookup helpers.

mod action;
mod configuration;
mod context;
mod settings;
mod unknown;

pub use action::TickAction;
pub use configuration::{TickConfiguration, TickStory};
pub use context::{TickContext, TickIntent, TickIntentAssociation};
pub use settings::TickStorySettings;
pub use unknown::{TickUnknownAnswerConfig, TickUnknownConfiguration, UNKNOWN};

use std::collections::BTreeMap;

/// Session context bindings
///
/// An absent key is unbound; `Some(None)` is bound to `null`.
pub type ContextMap = BTreeMap<String, Option<String>>;
