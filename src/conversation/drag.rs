use super::layout::Hit;
use super::Transcript;
use crate::selection::SelectionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DragRange {
    message: usize,
    anchor: usize,
    head: usize,
}

/// Text selected by dragging the mouse inside a message. A drag never
/// spans messages: leaving the anchor message extends to its start or end.
#[derive(Debug, Clone, Default)]
pub struct DragSelection {
    range: Option<DragRange>,
    text: String,
}

impl DragSelection {
    /// Begin a new selection at `hit`, dropping the previous one
    pub fn start(&mut self, hit: Hit) {
        self.range = Some(DragRange {
            message: hit.message,
            anchor: hit.offset,
            head: hit.offset,
        });
        self.text.clear();
    }

    /// Move the selection head to `hit`
    pub fn extend(&mut self, transcript: &Transcript, hit: Hit) {
        let Some(range) = self.range.as_mut() else {
            return;
        };
        let Some(message) = transcript.get(range.message) else {
            return;
        };

        range.head = if hit.message == range.message {
            hit.offset
        } else if hit.message > range.message {
            message.text.chars().count()
        } else {
            0
        };

        let (start, end) = ordered(range.anchor, range.head);
        self.text = message.text.chars().skip(start).take(end - start).collect();
    }

    pub fn clear(&mut self) {
        self.range = None;
        self.text.clear();
    }

    /// Selected `(message, start, end)` char range, for highlighting
    pub fn span(&self) -> Option<(usize, usize, usize)> {
        self.range.map(|r| {
            let (start, end) = ordered(r.anchor, r.head);
            (r.message, start, end)
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl SelectionSource for DragSelection {
    fn selected_text(&self) -> Option<String> {
        Some(self.text.clone())
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
