//! Story validation report
//!
//! Unlike [`TickStory::new`](crate::model::TickStory::new), which refuses a
//! configuration the engine cannot run, the report lists every consistency
//! issue at once so a story designer can fix them in one pass. Each check
//! returns human-readable messages; [`validate_tick_story`] merges them.

use crate::model::{TickConfiguration, TickIntentAssociation, UNKNOWN};
use crate::runtime::ActionHandlerRepository;
use crate::state_machine::StateMachine;
use std::collections::BTreeSet;

/// Intents and triggers the story is declared to react to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryDeclaration {
    pub main_intent: Option<String>,
    pub primary_intents: BTreeSet<String>,
    pub secondary_intents: BTreeSet<String>,
    pub triggers: BTreeSet<String>,
}

impl StoryDeclaration {
    /// Declaration implied by the configuration alone.
    ///
    /// Triggers are those raised by actions, secondary intents those carrying
    /// context associations or unknown answers, and every other transition
    /// is taken as a primary intent.
    pub fn infer(configuration: &TickConfiguration) -> Self {
        let triggers: BTreeSet<String> = configuration
            .actions
            .iter()
            .filter_map(|action| action.trigger.clone())
            .collect();
        let secondary_intents: BTreeSet<String> = configuration
            .intents_contexts
            .iter()
            .map(|intent| intent.intent_name.clone())
            .chain(
                configuration
                    .unknown_handle_configuration
                    .unknown_answer_configs
                    .iter()
                    .map(|config| config.intent.clone()),
            )
            .collect();
        let primary_intents = StateMachine::new(configuration.state_machine.clone())
            .map(|machine| {
                machine
                    .transitions()
                    .into_iter()
                    .filter(|event| {
                        *event != UNKNOWN
                            && !triggers.contains(*event)
                            && !secondary_intents.contains(*event)
                    })
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            main_intent: None,
            primary_intents,
            secondary_intents,
            triggers,
        }
    }

    #[must_use]
    pub fn with_main_intent(mut self, intent: impl Into<String>) -> Self {
        self.main_intent = Some(intent.into());
        self
    }

    fn intents(&self) -> impl Iterator<Item = &str> {
        self.main_intent
            .iter()
            .chain(&self.primary_intents)
            .chain(&self.secondary_intents)
            .map(String::as_str)
    }
}

/// Every issue of `configuration`, deduplicated and sorted
pub fn validate_tick_story(
    configuration: &TickConfiguration,
    declaration: &StoryDeclaration,
    handlers: &dyn ActionHandlerRepository,
    story_exists: impl Fn(&str) -> bool,
) -> BTreeSet<String> {
    let machine = match StateMachine::new(configuration.state_machine.clone()) {
        Ok(machine) => machine,
        Err(error) => return BTreeSet::from([format!("Invalid state machine: {error}")]),
    };

    let mut issues = BTreeSet::new();
    // Intents, triggers and transitions
    issues.extend(validate_intents(configuration, declaration, &machine));
    issues.extend(validate_triggers(declaration, &machine));
    issues.extend(validate_transitions(declaration, &machine));
    // Actions and states
    issues.extend(validate_actions(configuration, &machine));
    issues.extend(validate_states(configuration, &machine));
    issues.extend(validate_action_handlers(configuration, handlers));
    // Contexts
    issues.extend(validate_input_output_contexts(configuration));
    issues.extend(validate_declared_action_contexts(configuration));
    // Intent associations
    issues.extend(validate_tick_intent_names(configuration, declaration));
    issues.extend(validate_association_actions(configuration));
    issues.extend(validate_association_contexts(configuration));
    issues.extend(validate_names(configuration));
    // Unknown answers
    issues.extend(validate_unknown_config_actions(configuration));
    issues.extend(validate_unknown_config_intents(configuration, declaration));
    issues.extend(validate_target_stories(configuration, story_exists));

    if !issues.is_empty() {
        tracing::debug!(issues = issues.len(), "Story validation found issues");
    }
    issues
}

pub fn validate_intents(
    configuration: &TickConfiguration,
    declaration: &StoryDeclaration,
    machine: &StateMachine,
) -> Vec<String> {
    let unknown = configuration.unknown_handle_configuration.unknown_intents();
    declaration
        .intents()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|intent| !unknown.contains(intent) && !machine.contains_transition(intent))
        .map(|intent| format!("Intent {intent} not found in StateMachine"))
        .collect()
}

pub fn validate_triggers(declaration: &StoryDeclaration, machine: &StateMachine) -> Vec<String> {
    declaration
        .triggers
        .iter()
        .filter(|trigger| !machine.contains_transition(trigger))
        .map(|trigger| format!("Trigger {trigger} not found in StateMachine"))
        .collect()
}

/// Transitions no declared intent or trigger can fire; `unknown` needs no
/// declaration
pub fn validate_transitions(declaration: &StoryDeclaration, machine: &StateMachine) -> Vec<String> {
    let declared: BTreeSet<&str> = declaration
        .intents()
        .chain(declaration.triggers.iter().map(String::as_str))
        .collect();
    machine
        .transitions()
        .into_iter()
        .filter(|event| *event != UNKNOWN && !declared.contains(event))
        .map(|event| format!("Transition {event} not found in TickStory intents or triggers"))
        .collect()
}

pub fn validate_actions(configuration: &TickConfiguration, machine: &StateMachine) -> Vec<String> {
    configuration
        .actions
        .iter()
        .filter(|action| !machine.contains(&action.name))
        .map(|action| format!("Action {} not found in StateMachine", action.name))
        .collect()
}

pub fn validate_states(configuration: &TickConfiguration, machine: &StateMachine) -> Vec<String> {
    machine
        .leaf_states()
        .into_iter()
        .filter(|state| configuration.action(state).is_none())
        .map(|state| format!("State {state} not found in TickStory actions"))
        .collect()
}

pub fn validate_action_handlers(
    configuration: &TickConfiguration,
    handlers: &dyn ActionHandlerRepository,
) -> Vec<String> {
    configuration
        .actions
        .iter()
        .filter_map(|action| action.handler_name())
        .filter(|handler| !handlers.contains(handler))
        .map(|handler| format!("Action handler {handler} not found in handlers repository"))
        .collect()
}

/// Every input must be produced by another action and every output consumed
/// by another one. Contexts bound by intent associations count as both.
pub fn validate_input_output_contexts(configuration: &TickConfiguration) -> Vec<String> {
    let from_intents: BTreeSet<&str> = associations(configuration)
        .flat_map(|association| &association.context_names)
        .map(String::as_str)
        .collect();
    let actions = &configuration.actions;
    let mut issues = Vec::new();

    for action in actions {
        let others = || actions.iter().filter(|other| other.name != action.name);
        let produced = |name: &str| {
            from_intents.contains(name)
                || configuration
                    .producers(name)
                    .any(|producer| producer.name != action.name)
        };
        let consumed: BTreeSet<&str> = others()
            .flat_map(|other| &other.input_context_names)
            .map(String::as_str)
            .chain(from_intents.iter().copied())
            .collect();

        issues.extend(
            action
                .input_context_names
                .iter()
                .filter(|name| !produced(name.as_str()))
                .map(|name| {
                    format!(
                        "Input context {name} of action {} not found in output contexts of others",
                        action.name
                    )
                }),
        );
        issues.extend(
            action
                .output_context_names
                .iter()
                .filter(|name| !consumed.contains(name.as_str()))
                .map(|name| {
                    format!(
                        "Output context {name} of action {} not found in input contexts of others",
                        action.name
                    )
                }),
        );
    }
    issues
}

pub fn validate_declared_action_contexts(configuration: &TickConfiguration) -> Vec<String> {
    let used: BTreeSet<&str> = configuration
        .actions
        .iter()
        .flat_map(|action| action.input_context_names.iter().chain(&action.output_context_names))
        .map(String::as_str)
        .collect();
    let declared: BTreeSet<&str> = configuration
        .contexts
        .iter()
        .map(|context| context.name.as_str())
        .collect();

    used.difference(&declared)
        .map(|name| format!("Action context {name} not found in declared contexts"))
        .chain(
            declared
                .difference(&used)
                .map(|name| format!("Declared context {name} not used by any action")),
        )
        .collect()
}

/// Only secondary intents may carry context associations
pub fn validate_tick_intent_names(
    configuration: &TickConfiguration,
    declaration: &StoryDeclaration,
) -> Vec<String> {
    configuration
        .intents_contexts
        .iter()
        .filter(|intent| !declaration.secondary_intents.contains(&intent.intent_name))
        .map(|intent| {
            format!(
                "Intent {} is not secondary, it cannot be associated to contexts",
                intent.intent_name
            )
        })
        .collect()
}

pub fn validate_association_actions(configuration: &TickConfiguration) -> Vec<String> {
    associations(configuration)
        .filter(|association| configuration.action(&association.action_name).is_none())
        .map(|association| {
            format!(
                "Intent association action {} not found in declared actions",
                association.action_name
            )
        })
        .collect()
}

pub fn validate_association_contexts(configuration: &TickConfiguration) -> Vec<String> {
    associations(configuration)
        .flat_map(|association| &association.context_names)
        .filter(|name| configuration.context(name).is_none())
        .map(|name| format!("Intent association context {name} not found in declared contexts"))
        .collect()
}

/// A name may not denote both a context and an action
pub fn validate_names(configuration: &TickConfiguration) -> Vec<String> {
    configuration
        .contexts
        .iter()
        .filter(|context| configuration.action(&context.name).is_some())
        .map(|context| format!("The same name {} is used for Action handler and context", context.name))
        .collect()
}

pub fn validate_unknown_config_actions(configuration: &TickConfiguration) -> Vec<String> {
    configuration
        .unknown_handle_configuration
        .unknown_answer_configs
        .iter()
        .filter(|config| configuration.action(&config.action).is_none())
        .map(|config| {
            format!(
                "Unknown answer config action {} not found in declared actions",
                config.action
            )
        })
        .collect()
}

pub fn validate_unknown_config_intents(
    configuration: &TickConfiguration,
    declaration: &StoryDeclaration,
) -> Vec<String> {
    configuration
        .unknown_handle_configuration
        .unknown_answer_configs
        .iter()
        .filter(|config| !declaration.secondary_intents.contains(&config.intent))
        .map(|config| {
            format!(
                "Unknown answer config intent {} not found in secondary intents",
                config.intent
            )
        })
        .collect()
}

pub fn validate_target_stories(
    configuration: &TickConfiguration,
    story_exists: impl Fn(&str) -> bool,
) -> Vec<String> {
    configuration
        .actions
        .iter()
        .filter_map(|action| Some((action, action.target_story()?)))
        .filter(|(_, story)| !story_exists(story))
        .map(|(action, story)| format!("Target story {story} of action {} not found", action.name))
        .collect()
}

fn associations(configuration: &TickConfiguration) -> impl Iterator<Item = &TickIntentAssociation> {
    configuration
        .intents_contexts
        .iter()
        .flat_map(|intent| &intent.associations)
}
