//! Typed element addressing
//!
//! Every widget belonging to a message is named by a `(MessageId, Target)`
//! pair. The page markup uses flat string ids; `ElementId`'s `Display` output
//! is that string and must stay bit-exact with the markup.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a single chat/forum message. Backends send either strings
/// or integers; both are kept as their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The selection widgets rendered under each message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Container of the "comment on selection" form
    CommentContainer,
    /// Quote of the selected text above the comment form
    CommentSpan,
    /// Hidden field carrying the selection in the comment form
    CommentInput,
    /// Hidden field carrying the selection in the like form
    LikeInput,
    /// The like form itself
    LikeForm,
    /// Notice shown instead of the like form when the selection is too long
    LikeError,
    /// Selection length label inside the like form
    SelectionLength,
    /// Cost of liking the selection
    LikeCost,
}

impl Target {
    pub const ALL: [Target; 8] = [
        Target::CommentContainer,
        Target::CommentSpan,
        Target::CommentInput,
        Target::LikeInput,
        Target::LikeForm,
        Target::LikeError,
        Target::SelectionLength,
        Target::LikeCost,
    ];
}

/// Address of one widget of one message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub message_id: MessageId,
    pub target: Target,
}

impl ElementId {
    pub fn new(message_id: &MessageId, target: Target) -> Self {
        Self {
            message_id: message_id.clone(),
            target,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.message_id;
        match self.target {
            Target::CommentContainer => write!(f, "create_comment_from_selection_{}", id),
            Target::CommentSpan => write!(f, "create_comment_from_selection_{}_span", id),
            Target::CommentInput => {
                write!(f, "create_comment_from_selection_{}_hidden_input", id)
            }
            Target::LikeInput => write!(f, "like_selection_{}_hidden_input", id),
            Target::LikeForm => write!(f, "like_form_message_{}", id),
            Target::LikeError => write!(f, "like_error_div_{}", id),
            Target::SelectionLength => write!(f, "len_of_selected_text_in_like_form_{}", id),
            Target::LikeCost => write!(f, "cost_of_like_of_selected_text_{}", id),
        }
    }
}
