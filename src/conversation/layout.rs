//! Transcript layout for the message pane
//!
//! Messages are laid out top to bottom as an author row, the hard-wrapped
//! text, and a blank separator row. Rows and columns are content
//! coordinates: row 0 is the first row of the transcript, before scrolling.
//! One character occupies one cell.

use super::Transcript;

/// One wrapped row of message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub row: usize,
    /// Char offset of the first character within the message text
    pub start: usize,
    pub text: String,
}

impl TextLine {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    pub index: usize,
    pub header_row: usize,
    pub lines: Vec<TextLine>,
}

impl MessageBlock {
    fn last_row(&self) -> usize {
        self.lines.last().map(|l| l.row).unwrap_or(self.header_row)
    }
}

/// Pointer position resolved to a message and a char offset in its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub message: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptLayout {
    pub blocks: Vec<MessageBlock>,
    pub total_rows: usize,
}

impl TranscriptLayout {
    pub fn new(transcript: &Transcript, width: usize) -> Self {
        let width = width.max(1);
        let mut blocks = Vec::with_capacity(transcript.messages.len());
        let mut row = 0;

        for (index, message) in transcript.messages.iter().enumerate() {
            let header_row = row;
            row += 1;

            let mut lines = Vec::new();
            let mut offset = 0;
            for paragraph in message.text.split('\n') {
                let chars: Vec<char> = paragraph.chars().collect();
                if chars.is_empty() {
                    lines.push(TextLine {
                        row,
                        start: offset,
                        text: String::new(),
                    });
                    row += 1;
                }
                for chunk in chars.chunks(width) {
                    lines.push(TextLine {
                        row,
                        start: offset,
                        text: chunk.iter().collect(),
                    });
                    offset += chunk.len();
                    row += 1;
                }
                // the '\n' itself
                offset += 1;
            }

            blocks.push(MessageBlock {
                index,
                header_row,
                lines,
            });
            // separator
            row += 1;
        }

        Self {
            blocks,
            total_rows: row,
        }
    }

    /// Resolve a content cell to a message position. The author row maps to
    /// the start of the text; separator rows belong to no message.
    pub fn hit_test(&self, col: usize, row: usize) -> Option<Hit> {
        let block = self
            .blocks
            .iter()
            .find(|b| row >= b.header_row && row <= b.last_row())?;

        if row == block.header_row {
            return Some(Hit {
                message: block.index,
                offset: 0,
            });
        }

        let line = block.lines.iter().find(|l| l.row == row)?;
        Some(Hit {
            message: block.index,
            offset: line.start + col.min(line.len()),
        })
    }

    pub fn block(&self, index: usize) -> Option<&MessageBlock> {
        self.blocks.get(index)
    }
}
