use std::collections::HashMap;

use super::{ElementId, MessageId, SurfaceError, Target, UiSurface};

/// State of a single element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub visible: bool,
    pub inner_html: String,
    pub value: String,
}

/// In-memory element table keyed by [`ElementId`]
#[derive(Debug, Default)]
pub struct MemorySurface {
    elements: HashMap<ElementId, Element>,
    writes: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the widgets rendered under a message, in their initial state:
    /// comment box collapsed, like form shown, like error hidden.
    pub fn register_message(&mut self, message_id: &MessageId) {
        for target in Target::ALL {
            let visible = !matches!(target, Target::CommentContainer | Target::LikeError);
            self.elements.insert(
                ElementId::new(message_id, target),
                Element {
                    visible,
                    ..Element::default()
                },
            );
        }
    }

    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        self.elements.remove(id)
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Shorthand for looking up one widget of one message
    pub fn widget(&self, message_id: &MessageId, target: Target) -> Option<&Element> {
        self.element(&ElementId::new(message_id, target))
    }

    /// Number of successful writes since creation
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn element_mut(&mut self, id: &ElementId) -> Result<&mut Element, SurfaceError> {
        let element = self
            .elements
            .get_mut(id)
            .ok_or_else(|| SurfaceError::missing(id))?;
        self.writes += 1;
        Ok(element)
    }
}

impl UiSurface for MemorySurface {
    fn set_visible(&mut self, id: &ElementId, visible: bool) -> Result<(), SurfaceError> {
        self.element_mut(id)?.visible = visible;
        Ok(())
    }

    fn set_inner_html(&mut self, id: &ElementId, html: &str) -> Result<(), SurfaceError> {
        self.element_mut(id)?.inner_html = html.to_string();
        Ok(())
    }

    fn set_value(&mut self, id: &ElementId, value: &str) -> Result<(), SurfaceError> {
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }
}
