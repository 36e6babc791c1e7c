//! Interactive console connector
//!
//! Reads `<intent> [role=value ...]` lines from stdin and drives the story
//! named by `TICK_STORY_PATH`, printing answers as `< answer_id` lines.

use std::sync::Arc;
use tick_engine::runtime::{parse_user_action, ConsoleSender};
use tick_engine::{
    validate_tick_story, EngineConfig, HandlerRegistry, InMemorySessionStore, ProcessingResult,
    StoryDeclaration, StoryRuntime, TickStory, TickStoryProcessor,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tick_engine=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = EngineConfig::from_env();
    let Some(story_path) = config.story_path.as_ref() else {
        return Err("TICK_STORY_PATH is not set".into());
    };

    let mut story = TickStory::load(story_path)?;
    if let Some(debug) = config.debug_enabled {
        story = story.with_debug(debug);
    }
    tracing::info!(story = %story.id(), path = %story_path.display(), "Story loaded");

    let handlers = HandlerRegistry::new().with_dev_tools();
    let declaration = StoryDeclaration::infer(story.configuration());
    let own_id = story.id().to_string();
    for issue in validate_tick_story(story.configuration(), &declaration, &handlers, |id| {
        id == own_id
    }) {
        tracing::warn!(story = %own_id, issue, "Story validation issue");
    }

    let processor = TickStoryProcessor::new(Arc::new(story), handlers)
        .with_ending_story_rule(config.ending_story_rule);
    let runtime = StoryRuntime::new(processor, InMemorySessionStore::new());
    let sender = ConsoleSender::new(tokio::io::stdout());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(user_action) = parse_user_action(&line) else {
            continue;
        };
        match runtime
            .handle(&config.session_id, Some(&user_action), &sender)
            .await
        {
            Ok(ProcessingResult::Redirect { story_id }) => {
                println!("> redirected to story {story_id}");
            }
            Ok(ProcessingResult::Success { .. }) => {}
            Err(error) => {
                tracing::error!(%error, "Turn failed");
                println!("> error: {error}");
            }
        }
    }
    Ok(())
}
