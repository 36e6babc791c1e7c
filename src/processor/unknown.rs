//! Unknown-intent handling

use super::{ProcessingResult, TickUnknownHandlingStep, Turn, DEBUG_SEPARATOR};
use crate::model::TickUnknownAnswerConfig;
use tracing::info;

impl Turn<'_> {
    /// Answer unrecognized input with the fallback configured for the most
    /// recent action that has one, else with the story's default unknown
    /// answer.
    ///
    /// Returns `None` when the story declares no fallback at all.
    pub(super) fn unknown_fallback(&mut self) -> Option<ProcessingResult> {
        let story = self.story;
        let settings = story.settings();
        let fallbacks = &story.configuration().unknown_handle_configuration;
        let intent = self.intent;

        let answer_config = self
            .session
            .ran_handlers
            .iter()
            .rev()
            .find_map(|action| fallbacks.find(action, intent))
            .cloned()
            .or_else(|| {
                let answer_id = settings
                    .unknown_answer_id
                    .as_deref()
                    .filter(|id| !id.trim().is_empty())?;
                Some(TickUnknownAnswerConfig {
                    intent: intent.to_string(),
                    action: self.current_state().to_string(),
                    answer_id: answer_id.to_string(),
                })
            })?;

        let step =
            TickUnknownHandlingStep::advance(self.session.unknown_handling_step.as_ref(), answer_config);
        if settings.exceeded(step.repeated) {
            return Some(self.give_up("unknown answer limit reached"));
        }

        info!(
            story = %story.id(),
            intent,
            action = %step.answer_config.action,
            repeated = step.repeated,
            "Answering unknown input"
        );
        let answer_id = step.answer_config.answer_id.as_str();
        if story.is_debug() {
            self.outbox.send_by_id(answer_id);
            self.outbox.end_plain_text(DEBUG_SEPARATOR);
        } else {
            self.outbox.end_by_id(answer_id);
        }

        self.session.unknown_handling_step = Some(step);
        self.session.finished = false;
        Some(ProcessingResult::Success {
            session: std::mem::take(&mut self.session),
        })
    }
}
