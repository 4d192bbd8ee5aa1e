//! Transcript model: the ordered, role-tagged message history exchanged with
//! a model.
//!
//! A [`Transcript`] is a value. [`Transcript::append`] and
//! [`Transcript::extend`] return a new transcript and leave the receiver
//! untouched, so a transcript handed to the gateway can never be rewritten
//! behind the caller's back. Messages live behind an `Arc<[Message]>`; clones
//! are cheap and growth copies the (short) message list once.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    /// Only ever produced by a [`crate::pipeline::llm::TranscriptGateway`].
    Assistant,
}

/// One element of a multi-part message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// An image reference: a `data:` URI or a remote URL.
    Image { source: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(source: impl Into<String>) -> Self {
        ContentPart::Image {
            source: source.into(),
        }
    }

    /// The text of a text part; `None` for attachments.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::Image { .. } => None,
        }
    }
}

/// A message body: either one string or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Concatenate every text part. Attachments contribute nothing.
    pub fn flatten_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts.iter().filter_map(ContentPart::as_text).collect(),
        }
    }

    /// Image sources in order of appearance.
    pub fn image_sources(&self) -> Vec<&str> {
        match self {
            Content::Text(_) => Vec::new(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Image { source } => Some(source.as_str()),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(parts: Vec<ContentPart>) -> Self {
        Content::Parts(parts)
    }
}

/// A single message in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    /// A system message. System messages carry plain text only.
    pub fn system(text: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: Content::Text(text.into()),
        }
    }

    /// A user message with mixed text and attachments.
    pub fn user(content: impl Into<Content>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message. Local code never authors these except on behalf
    /// of a gateway implementation.
    pub fn assistant(content: impl Into<Content>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Immutable, append-only message sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Arc<[Message]>,
}

impl Transcript {
    /// A transcript with no messages.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A new transcript with `message` after every existing message.
    #[must_use]
    pub fn append(&self, message: Message) -> Self {
        let messages: Vec<Message> = self
            .messages
            .iter()
            .cloned()
            .chain(std::iter::once(message))
            .collect();
        Self {
            messages: messages.into(),
        }
    }

    /// A new transcript with `continuation`'s messages after this one's.
    #[must_use]
    pub fn extend(&self, continuation: &Transcript) -> Self {
        let messages: Vec<Message> = self
            .messages
            .iter()
            .chain(continuation.messages.iter())
            .cloned()
            .collect();
        Self {
            messages: messages.into(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// First message authored by `role`, if any.
    pub fn first_with_role(&self, role: Role) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == role)
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<T: IntoIterator<Item = Message>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().collect::<Vec<_>>().into(),
        }
    }
}

impl Serialize for Transcript {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.messages().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transcript {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Message>::deserialize(deserializer).map(|messages| Self {
            messages: messages.into(),
        })
    }
}
