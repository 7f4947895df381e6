//! The UI surface the selection widgets live on
//!
//! In a browser this is the DOM; here it is anything implementing
//! [`UiSurface`]. The viewer and the tests use [`MemorySurface`].

mod ids;
mod memory;

pub use ids::{ElementId, MessageId, Target};
pub use memory::{Element, MemorySurface};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("no element with id '{id}'")]
    MissingElement { id: String },
}

impl SurfaceError {
    pub fn missing(id: &ElementId) -> Self {
        Self::MissingElement { id: id.to_string() }
    }
}

/// Write access to addressable UI elements
pub trait UiSurface {
    /// Show (`display: block`) or hide (`display: none`) an element
    fn set_visible(&mut self, id: &ElementId, visible: bool) -> Result<(), SurfaceError>;

    /// Replace an element's inner HTML
    fn set_inner_html(&mut self, id: &ElementId, html: &str) -> Result<(), SurfaceError>;

    /// Set a form field's value
    fn set_value(&mut self, id: &ElementId, value: &str) -> Result<(), SurfaceError>;
}
