//! Pipeline type definitions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Who spoke a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Role implied by a turn's position when the caller did not tag it.
    pub fn from_position(index: usize) -> Self {
        if index % 2 == 0 {
            Role::Human
        } else {
            Role::Assistant
        }
    }

    /// Label used when rendering the transcript into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Human => "Human",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One utterance of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// A history item as submitted by a caller.
///
/// Plain strings get their role from their position; tagged entries keep
/// the role they carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Tagged { role: Role, text: String },
    Plain(String),
}

impl From<&str> for HistoryEntry {
    fn from(text: &str) -> Self {
        HistoryEntry::Plain(text.to_string())
    }
}

impl From<String> for HistoryEntry {
    fn from(text: String) -> Self {
        HistoryEntry::Plain(text)
    }
}

impl From<ConversationTurn> for HistoryEntry {
    fn from(turn: ConversationTurn) -> Self {
        HistoryEntry::Tagged {
            role: turn.role,
            text: turn.text,
        }
    }
}

/// A retrieved chunk of source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFragment {
    /// Text content used as grounding context
    pub text: String,

    /// Opaque metadata carried through to the caller (e.g. source file, page)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DocumentFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A fragment with its similarity score, as returned by a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub fragment: DocumentFragment,
    pub score: f32,
}

impl ScoredFragment {
    pub fn new(fragment: DocumentFragment, score: f32) -> Self {
        Self { fragment, score }
    }

    /// Descending score order, total over `f32`. NaN scores of either sign
    /// sort after every real score and compare equal to each other.
    pub fn best_first(a: &Self, b: &Self) -> Ordering {
        rank_key(b.score).total_cmp(&rank_key(a.score))
    }
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// The answer to one request together with its supporting fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    /// Generated answer text
    pub answer: String,

    /// Fragments used as context, in retrieval order
    pub source_documents: Vec<DocumentFragment>,
}

impl PipelineResult {
    /// Pair the generated answer with the fragments it was grounded on.
    pub fn new(answer: impl Into<String>, source_documents: Vec<DocumentFragment>) -> Self {
        Self {
            answer: answer.into(),
            source_documents,
        }
    }
}

/// A caller request: a question plus the prior turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>, history: Vec<HistoryEntry>) -> Self {
        Self {
            question: Some(question.into()),
            history,
        }
    }
}

/// What the transport sends back for a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    /// No question was supplied; nothing ran
    NoQuestion { message: String },

    /// The pipeline produced an answer
    Answer(PipelineResult),

    /// A stage failed
    Failure { error: String },
}

impl ChatReply {
    pub fn is_failure(&self) -> bool {
        matches!(self, ChatReply::Failure { .. })
    }
}
