//! Line-oriented console connector

use super::traits::TickSender;
use crate::processor::TickUserAction;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writes answers as `< answer` lines; terminal answers are tagged `[end]`
#[derive(Debug)]
pub struct ConsoleSender<W> {
    out: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSender<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_line(&self, line: &str) {
        let mut out = self.out.lock().await;
        let written = async {
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await
        }
        .await;
        if let Err(error) = written {
            tracing::warn!(%error, "Failed to write console answer");
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> TickSender for ConsoleSender<W> {
    async fn send_by_id(&self, answer_id: &str) {
        self.write_line(&format!("< {answer_id}")).await;
    }

    async fn end_by_id(&self, answer_id: &str) {
        self.write_line(&format!("< {answer_id} [end]")).await;
    }

    async fn send_plain_text(&self, text: &str) {
        self.write_line(&format!("< {text}")).await;
    }

    async fn end_plain_text(&self, text: &str) {
        self.write_line(&format!("< {text} [end]")).await;
    }

    async fn end(&self) {
        self.write_line("< [end]").await;
    }
}

/// Parse `<intent> [role=value ...]`; blank lines give nothing
pub fn parse_user_action(line: &str) -> Option<TickUserAction> {
    let mut words = line.split_whitespace();
    let mut action = TickUserAction::new(words.next()?);
    for word in words {
        match word.split_once('=') {
            Some((role, value)) if !role.is_empty() => {
                action = action.with_parameter(role, value);
            }
            _ => tracing::warn!(word, "Ignoring malformed parameter, expected role=value"),
        }
    }
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_action() {
        assert_eq!(parse_user_action("   "), None);

        let action = parse_user_action("declare plate=AB-123 broken").unwrap();
        assert_eq!(action.intent_name, "declare");
        assert_eq!(action.parameters.len(), 1);
        assert_eq!(action.parameters["plate"], "AB-123");
    }

    #[tokio::test]
    async fn test_console_output() {
        let sender = ConsoleSender::new(Vec::new());
        sender.send_by_id("hello").await;
        sender.end_by_id("bye").await;
        sender.end().await;

        let output = String::from_utf8(sender.into_inner()).unwrap();
        assert_eq!(output, "< hello\n< bye [end]\n< [end]\n");
    }
}
