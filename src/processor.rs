//! Tick story processor
//!
//! Runs one dialog turn: resolves the user's intent to an objective through
//! the state machine (or an intent association, or the objectives stack),
//! plans toward it with the graph solver, executes the planned actions and
//! emits their answers through the sender.
//!
//! The processor never mutates the caller's session. Each turn works on its
//! own copy and hands it back in [`ProcessingResult::Success`]. Answers are
//! held in an outbox and reach the sender only once the turn succeeded, so a
//! failed handler leaves both the stored session and the conversation as
//! they were.

mod outbox;
mod session;
mod unknown;


pub use session::{
    ProcessingResult, TickActionHandlingStep, TickSession, TickUnknownHandlingStep,
    TickUserAction,
};

use self::outbox::Outbox;
use crate::error::{EngineError, EngineResult};
use crate::model::{TickAction, TickStory, UNKNOWN};
use crate::runtime::{ActionHandlerRepository, TickSender};
use crate::solver::{GraphSolver, SolveRequest};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Plain-text line closing a turn in debug mode
const DEBUG_SEPARATOR: &str = "---";

pub struct TickStoryProcessor<H> {
    story: Arc<TickStory>,
    handlers: H,
    /// An ending rule of the surrounding bot takes over after final actions
    ending_story_rule: bool,
}

impl<H: ActionHandlerRepository> TickStoryProcessor<H> {
    pub fn new(story: Arc<TickStory>, handlers: H) -> Self {
        Self {
            story,
            handlers,
            ending_story_rule: false,
        }
    }

    #[must_use]
    pub fn with_ending_story_rule(mut self, exists: bool) -> Self {
        self.ending_story_rule = exists;
        self
    }

    pub fn story(&self) -> &TickStory {
        &self.story
    }

    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    /// Process one user action against `session`.
    ///
    /// Without a user action there is nothing to do and the session comes
    /// back unchanged.
    pub async fn process(
        &self,
        session: &TickSession,
        user_action: Option<&TickUserAction>,
        sender: &dyn TickSender,
    ) -> EngineResult<ProcessingResult> {
        let story = &*self.story;
        let Some(user_action) = user_action else {
            debug!(story = %story.id(), "No user action");
            return Ok(ProcessingResult::Success {
                session: session.clone(),
            });
        };

        let mut turn = Turn {
            story,
            handlers: &self.handlers,
            outbox: Outbox::default(),
            ending_story_rule: self.ending_story_rule,
            intent: &user_action.intent_name,
            session: session.clone(),
            visited: BTreeSet::new(),
            fired_triggers: BTreeSet::new(),
            pending: None,
        };
        let current = turn.current_state().to_string();
        info!(
            story = %story.id(),
            intent = %user_action.intent_name,
            state = %current,
            "Processing user action"
        );

        let result = turn.play(user_action, &current).await?;
        turn.outbox.deliver(sender).await;
        Ok(result)
    }
}

/// Working state of a single turn
struct Turn<'p> {
    story: &'p TickStory,
    handlers: &'p dyn ActionHandlerRepository,
    outbox: Outbox,
    ending_story_rule: bool,
    intent: &'p str,
    session: TickSession,
    /// Actions executed during this turn
    visited: BTreeSet<String>,
    fired_triggers: BTreeSet<String>,
    /// Last executed action whose answer has not been emitted yet
    pending: Option<&'p TickAction>,
}

impl<'p> Turn<'p> {
    fn current_state(&self) -> &str {
        match self.session.current_state.as_deref() {
            Some(state) => state,
            None => self.story.state_machine().default_state(),
        }
    }

    async fn play(
        &mut self,
        user_action: &TickUserAction,
        current: &str,
    ) -> EngineResult<ProcessingResult> {
        let story = self.story;
        if !story.configuration().is_unknown_intent(self.intent) {
            if let Some((objective, resumed)) = self.resolve_objective(current) {
                self.bind_contexts(user_action);
                self.session.unknown_handling_step = None;
                return self.run(objective, resumed).await;
            }
        }

        if let Some(result) = self.unknown_fallback() {
            return Ok(result);
        }
        match story.state_machine().resolve_event(current, UNKNOWN) {
            Some(objective) => self.run(objective.to_string(), None).await,
            None => Ok(self.give_up("nothing handles the input")),
        }
    }

    /// Primary objective for the turn's intent, with the objective popped
    /// from the stack when that is what resolved it
    fn resolve_objective(&mut self, current: &str) -> Option<(String, Option<String>)> {
        let story = self.story;
        if let Some(target) = story.state_machine().resolve_event(current, self.intent) {
            debug!(story = %story.id(), state = %current, objective = %target, "Resolved by state machine");
            return Some((target.to_string(), None));
        }

        let associations = story
            .configuration()
            .matching_associations(self.intent, &self.session.contexts);
        if let [association] = associations.as_slice() {
            debug!(
                story = %story.id(),
                objective = %association.action_name,
                "Resolved by intent association"
            );
            return Some((association.action_name.clone(), None));
        }

        let resumed = self.session.objectives_stack.pop()?;
        debug!(story = %story.id(), objective = %resumed, "Resuming pending objective");
        Some((resumed.clone(), Some(resumed)))
    }

    /// Bind contexts carried by the user action: entity values by role, and
    /// the contexts of the intent's association with the last ran action
    fn bind_contexts(&mut self, user_action: &TickUserAction) {
        let configuration = self.story.configuration();
        for context in &configuration.contexts {
            let value = context
                .entity_role
                .as_deref()
                .and_then(|role| user_action.parameters.get(role));
            if let Some(value) = value {
                self.session
                    .contexts
                    .insert(context.name.clone(), Some(value.clone()));
            }
        }

        let association = self.session.last_ran_handler().and_then(|last| {
            configuration
                .intent(&user_action.intent_name)?
                .association_for(last)
        });
        if let Some(association) = association {
            for name in &association.context_names {
                self.session.contexts.entry(name.clone()).or_insert(None);
            }
        }
    }

    /// Plan toward `objective` and execute until the turn can go no further
    async fn run(
        &mut self,
        objective: String,
        resumed: Option<String>,
    ) -> EngineResult<ProcessingResult> {
        let story = self.story;
        let configuration = story.configuration();
        let settings = story.settings();
        let solver = GraphSolver::new(&configuration.actions).with_settings(settings);

        let mut target = objective;
        let mut resumed = resumed;
        // The user's own intent may call for a detour too
        let mut raised = Some(self.intent.to_string());
        let mut first_pass = true;

        'turn: loop {
            let plan = solver.solve(
                &SolveRequest::new(
                    &target,
                    &self.session.contexts,
                    &self.session.ran_handlers,
                    &self.visited,
                )
                .with_stack(&self.session.objectives_stack)
                .with_raised_event(raised.as_deref())
                .with_resumed(resumed.as_deref()),
            );

            if first_pass {
                first_pass = false;
                let first = plan.steps.first().map(String::as_str);
                if let Some(result) = self.start(first, &target) {
                    return Ok(result);
                }
            }

            let mut progressed = false;
            let mut diverged = false;
            for name in &plan.steps {
                let action = configuration
                    .action(name)
                    .ok_or_else(|| EngineError::UnknownAction(name.clone()))?;
                if !action.inputs_satisfied(&self.session.contexts) {
                    // A handler did not bind what the action declared
                    debug!(story = %story.id(), action = %action.name, "Inputs missing, replanning");
                    diverged = true;
                    break;
                }
                if let Some(story_id) = self.execute(action).await? {
                    return Ok(ProcessingResult::Redirect { story_id });
                }
                progressed = true;

                if action.trigger.as_deref() == Some(self.intent)
                    && action.name != target
                    && !self.visited.contains(&target)
                {
                    self.session.push_objective(&target);
                }
                if let Some(next) = self.follow_trigger(action) {
                    if !self.visited.contains(&target) {
                        self.session.push_objective(&target);
                    }
                    target = next;
                    raised.clone_from(&action.trigger);
                    resumed = None;
                    continue 'turn;
                }
            }

            if diverged && progressed {
                continue;
            }

            if self.visited.contains(&target) {
                if self.session.objectives_stack.last() == Some(&target) {
                    self.session.objectives_stack.pop();
                }
                let silent = configuration
                    .action(&target)
                    .is_none_or(TickAction::is_silent);
                if silent {
                    if let Some(next) = self.session.objectives_stack.pop() {
                        debug!(story = %story.id(), objective = %next, "Continuing with pending objective");
                        resumed = Some(next.clone());
                        target = next;
                        raised = None;
                        continue;
                    }
                }
            } else {
                warn!(
                    story = %story.id(),
                    objective = %target,
                    dead_end = !plan.complete,
                    "Objective deferred"
                );
                self.session.push_objective(&target);
            }
            break;
        }

        self.finish_turn();
        info!(
            story = %story.id(),
            state = ?self.session.current_state,
            executed = self.visited.len(),
            emitted = self.outbox.count(),
            finished = self.session.finished,
            "Turn completed"
        );
        Ok(ProcessingResult::Success {
            session: std::mem::take(&mut self.session),
        })
    }

    /// Count the turn's first action against the repetition limit.
    ///
    /// Returns the outcome that ends the turn early: nothing can run, or
    /// the same first action has come back too often.
    fn start(&mut self, first: Option<&str>, target: &str) -> Option<ProcessingResult> {
        let story = self.story;
        let Some(first) = first else {
            warn!(story = %story.id(), objective = %target, "No executable step");
            return Some(match self.unknown_fallback() {
                Some(result) => result,
                None => self.give_up("no executable step"),
            });
        };
        let step = TickActionHandlingStep::advance(self.session.handling_step.as_ref(), first);
        if story.settings().exceeded(step.repeated) {
            info!(
                story = %story.id(),
                action = %step.action_name,
                repeated = step.repeated,
                "Repetition limit reached"
            );
            return Some(self.give_up("repetition limit reached"));
        }
        self.session.handling_step = Some(step);
        None
    }

    /// Objective raised by `action`'s trigger, once per turn
    fn follow_trigger(&mut self, action: &TickAction) -> Option<String> {
        let trigger = action.trigger.as_deref()?;
        if trigger == self.intent || !self.fired_triggers.insert(trigger.to_string()) {
            return None;
        }
        let next = self.story.state_machine().resolve_event(&action.name, trigger);
        if next.is_none() {
            warn!(story = %self.story.id(), action = %action.name, trigger, "Trigger resolves to no state");
        }
        next.map(str::to_string)
    }

    /// Run one action; returns the story to redirect to when it has one
    async fn execute(&mut self, action: &'p TickAction) -> EngineResult<Option<String>> {
        self.flush_pending();
        self.debug_contexts(action, "INPUT");

        if let Some(handler) = action.handler_name() {
            let produced = self
                .handlers
                .invoke(handler, &self.session.contexts)
                .await
                .inspect_err(|error| {
                    warn!(story = %self.story.id(), action = %action.name, %error, "Handler failed");
                })?;
            debug!(action = %action.name, handler, ?produced, "Handler invoked");
            self.session.contexts.extend(produced);
        }

        self.session.ran_handlers.push(action.name.clone());
        self.visited.insert(action.name.clone());
        self.session.current_state = Some(action.name.clone());
        self.session.finished = action.is_final;
        self.debug_contexts(action, "OUTPUT");

        if let Some(story_id) = action.target_story() {
            if let Some(answer) = action.answer() {
                self.outbox.send_by_id(answer);
            }
            info!(story = %self.story.id(), action = %action.name, target_story = story_id, "Redirecting");
            return Ok(Some(story_id.to_string()));
        }

        self.pending = Some(action);
        Ok(None)
    }

    /// Emit the previous action's answer now that the turn goes on
    fn flush_pending(&mut self) {
        if let Some(answer) = self.pending.take().and_then(TickAction::answer) {
            self.outbox.send_by_id(answer);
        }
    }

    /// Emit the last executed action's answer, closing the turn if needed
    fn finish_turn(&mut self) {
        let Some(action) = self.pending.take() else {
            return;
        };
        let handed_over = action.is_final && self.ending_story_rule;

        if self.story.is_debug() {
            if let Some(answer) = action.answer() {
                self.outbox.send_by_id(answer);
            }
            if handed_over {
                self.outbox.send_plain_text(DEBUG_SEPARATOR);
            } else {
                self.outbox.end_plain_text(DEBUG_SEPARATOR);
            }
            return;
        }

        match action.answer() {
            Some(answer) if action.is_final && !handed_over => self.outbox.end_by_id(answer),
            Some(answer) => self.outbox.send_by_id(answer),
            // Silent last step still closes the turn
            None if !handed_over => self.outbox.end(),
            None => {}
        }
    }

    fn debug_contexts(&mut self, action: &TickAction, kind: &str) {
        if !self.story.is_debug() {
            return;
        }
        let contexts = self
            .session
            .contexts
            .iter()
            .map(|(name, value)| format!("{name} : {}", value.as_deref().unwrap_or("null")))
            .collect::<Vec<_>>()
            .join(" | ");
        let message = format!("[DEBUG] {} : {kind} CONTEXTS [ {contexts} ]", action.name);
        info!(story = %self.story.id(), "{message}");
        self.outbox.send_plain_text(&message);
    }

    fn give_up(&self, reason: &str) -> ProcessingResult {
        let story_id = self.story.settings().redirect_target();
        info!(story = %self.story.id(), redirect = %story_id, reason, "Leaving story");
        ProcessingResult::Redirect { story_id }
    }
}
