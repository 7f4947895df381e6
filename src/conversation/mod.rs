pub mod drag;
pub mod layout;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::surface::MessageId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(default)]
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub messages: Vec<Message>,
}

impl Transcript {
    /// Parse a transcript: a JSON array of `{id, author, text}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        let messages: Vec<Message> = serde_json::from_str(json).context("Invalid transcript")?;

        let mut seen = std::collections::HashSet::new();
        for message in &messages {
            if !seen.insert(&message.id) {
                anyhow::bail!("Duplicate message id '{}' in transcript", message.id);
            }
        }

        Ok(Self { messages })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Built-in conversation used when no transcript is configured
    pub fn demo() -> Self {
        let message = |id: &str, author: &str, text: &str| Message {
            id: MessageId::new(id),
            author: author.to_string(),
            text: text.to_string(),
        };

        Self {
            messages: vec![
                message(
                    "101",
                    "ada",
                    "Drag across any part of a message to select it. Moving the pointer over the message afterwards fills in the comment and like widgets on the right.",
                ),
                message(
                    "102",
                    "brian",
                    "Short selections can be liked. Anything longer than the configured limit shows a notice instead of the like form.",
                ),
                message(
                    "103",
                    "chen",
                    "Press e to open the error card for the loaded response envelope, and s inside it to see the HTML.",
                ),
            ],
        }
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }
}
