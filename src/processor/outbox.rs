//! Sender calls held back until the turn commits

use crate::runtime::TickSender;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Emission {
    SendById(String),
    EndById(String),
    SendPlainText(String),
    EndPlainText(String),
    End,
}

/// Everything a turn wants to say, in order.
///
/// A failed handler drops the outbox with the turn, so the connector only
/// ever hears from turns whose session is kept.
#[derive(Debug, Default)]
pub(super) struct Outbox {
    emissions: Vec<Emission>,
}

impl Outbox {
    pub(super) fn send_by_id(&mut self, answer_id: &str) {
        self.emissions.push(Emission::SendById(answer_id.to_string()));
    }

    pub(super) fn end_by_id(&mut self, answer_id: &str) {
        self.emissions.push(Emission::EndById(answer_id.to_string()));
    }

    pub(super) fn send_plain_text(&mut self, text: &str) {
        self.emissions.push(Emission::SendPlainText(text.to_string()));
    }

    pub(super) fn end_plain_text(&mut self, text: &str) {
        self.emissions.push(Emission::EndPlainText(text.to_string()));
    }

    pub(super) fn end(&mut self) {
        self.emissions.push(Emission::End);
    }

    pub(super) fn count(&self) -> usize {
        self.emissions.len()
    }

    pub(super) async fn deliver(self, sender: &dyn TickSender) {
        for emission in self.emissions {
            match emission {
                Emission::SendById(answer_id) => sender.send_by_id(&answer_id).await,
                Emission::EndById(answer_id) => sender.end_by_id(&answer_id).await,
                Emission::SendPlainText(text) => sender.send_plain_text(&text).await,
                Emission::EndPlainText(text) => sender.end_plain_text(&text).await,
                Emission::End => sender.end().await,
            }
        }
    }
}
