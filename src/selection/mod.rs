//! Tracks which text is selected in a message
//!
//! The tracker is driven by pointer movement over a message. It keeps the
//! last non-empty selection and mirrors it into the "comment on selection"
//! and "like selection" widgets of that message.

use thiserror::Error;

use crate::config::FailurePolicy;
use crate::surface::{ElementId, MessageId, SurfaceError, Target, UiSurface};

/// Where the current selection comes from (the browser's `getSelection()`,
/// or the viewer's drag state)
pub trait SelectionSource {
    /// The selected text, `None` if the selection cannot be read at all
    fn selected_text(&self) -> Option<String>;
}

/// Last captured selection. The text is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRecord {
    pub message_id: MessageId,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The source could not be read and the policy says to carry on
    Unavailable,
    /// Nothing is selected; the previous selection is kept
    Empty,
    /// Same text as the stored record
    Unchanged,
    Updated { length: usize, likeable: bool },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("selection widget missing: {0}")]
    MissingTarget(#[from] SurfaceError),
    #[error("current selection is not available")]
    SelectionUnavailable,
}

/// Owns the selection record for one page/view. Dropping the tracker drops
/// the record.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    record: Option<SelectionRecord>,
    policy: FailurePolicy,
}

impl SelectionTracker {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            record: None,
            policy,
        }
    }

    pub fn record(&self) -> Option<&SelectionRecord> {
        self.record.as_ref()
    }

    /// Handle a pointer movement over `message_id`.
    pub fn update_selection<S>(
        &mut self,
        surface: &mut S,
        source: &dyn SelectionSource,
        message_id: &MessageId,
        max_likeable_length: usize,
    ) -> Result<SelectionOutcome, TrackerError>
    where
        S: UiSurface + ?Sized,
    {
        let text = match source.selected_text() {
            Some(text) => text,
            None => {
                return match self.policy {
                    FailurePolicy::Fail => Err(TrackerError::SelectionUnavailable),
                    FailurePolicy::Ignore => {
                        tracing::warn!("Selection unavailable, ignoring pointer move");
                        Ok(SelectionOutcome::Unavailable)
                    }
                };
            }
        };

        // Pointer moves fire constantly; an empty selection must not wipe the
        // one the user made in another message.
        if text.is_empty() {
            return Ok(SelectionOutcome::Empty);
        }

        if self.record.as_ref().is_some_and(|r| r.text == text) {
            return Ok(SelectionOutcome::Unchanged);
        }

        tracing::debug!(message_id = %message_id, text = %text, "Selection updated");
        self.record = Some(SelectionRecord {
            message_id: message_id.clone(),
            text: text.clone(),
        });

        let length = text.chars().count();
        let likeable = length <= max_likeable_length;
        let length_text = length.to_string();
        let text = text.as_str();
        let id = |target| ElementId::new(message_id, target);

        // Comment form
        self.apply(surface.set_visible(&id(Target::CommentContainer), true))?;
        self.apply(surface.set_inner_html(&id(Target::CommentSpan), text))?;
        self.apply(surface.set_value(&id(Target::CommentInput), text))?;

        // Like form
        self.apply(surface.set_value(&id(Target::LikeInput), text))?;
        self.apply(surface.set_inner_html(&id(Target::LikeCost), &length_text))?;
        self.apply(surface.set_inner_html(&id(Target::SelectionLength), &length_text))?;
        self.apply(surface.set_visible(&id(Target::LikeForm), likeable))?;
        self.apply(surface.set_visible(&id(Target::LikeError), !likeable))?;

        Ok(SelectionOutcome::Updated { length, likeable })
    }

    fn apply(&self, result: Result<(), SurfaceError>) -> Result<(), TrackerError> {
        match (result, self.policy) {
            (Ok(()), _) => Ok(()),
            (Err(e), FailurePolicy::Fail) => Err(e.into()),
            (Err(e), FailurePolicy::Ignore) => {
                tracing::warn!("Skipping selection widget update: {}", e);
                Ok(())
            }
        }
    }
}
