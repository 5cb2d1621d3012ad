use serde::{Deserialize, Serialize};

/// One recognized text segment with optional timing bounds in centiseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Utterance {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
}

/// Ordered result of a completed transcription job. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Transcript {
    pub utterances: Vec<Utterance>,
}

impl Transcript {
    /// Canonical plain-text rendering: utterance texts joined by newlines,
    /// in delivery order. Used for clipboard copy and file export.
    pub fn to_text(&self) -> String {
        self.utterances
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            stop: None,
        }
    }
}
