//! Conversation entities

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One message of a conversation plus whether it is shared with the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub message: Message,
    /// Local entries are shown to the learner but never sent upstream
    /// (refused input, canned replies, outage notices).
    pub local: bool,
}

/// Ordered exchange between the learner and the assistant, bound to the
/// page (context) it was started on.
///
/// The system prompt is not stored; it is prepended when the conversation is
/// assembled for a request, so a rebuilt prompt takes effect immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    context_id: String,
    entries: Vec<ConversationEntry>,
}

impl Conversation {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Every visible message, local ones included.
    pub fn messages(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.entries.iter().map(|entry| &entry.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(ConversationEntry {
            message,
            local: false,
        });
    }

    pub fn push_local(&mut self, message: Message) {
        self.entries.push(ConversationEntry {
            message,
            local: true,
        });
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.entries.pop().map(|entry| entry.message)
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages()
            .rev()
            .find(|message| message.role == Role::Assistant)
    }

    /// Messages for one request: the system prompt followed by at most
    /// `history_limit` of the most recent shared messages. The latest
    /// learner message is always included, even with a limit of 0.
    ///
    /// A window that would start on an assistant message is shifted forward
    /// so the first history message is always from the learner.
    pub fn assemble(&self, system_prompt: &str, history_limit: usize) -> Vec<Message> {
        let shared: Vec<&Message> = self
            .entries
            .iter()
            .filter(|entry| !entry.local)
            .map(|entry| &entry.message)
            .collect();

        let mut start = shared.len().saturating_sub(history_limit);
        if let Some(last_user) = shared.iter().rposition(|m| m.role == Role::User) {
            start = start.min(last_user);
        }
        while start < shared.len() && shared[start].role == Role::Assistant {
            start += 1;
        }

        std::iter::once(Message::system(system_prompt))
            .chain(shared[start..].iter().map(|message| (*message).clone()))
            .collect()
    }
}
