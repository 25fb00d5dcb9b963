//! Events emitted by the document for observers.

use super::element::{ElementIndex, ElementKind};

/// Events emitted as the document changes.
///
/// These let the host redraw or persist without polling the document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// A new strip was opened for the named brush.
    StripBegan { brush: String },
    /// An element was closed and appended to the log.
    ElementFinished {
        index: ElementIndex,
        kind: ElementKind,
    },
    /// The active elements were moved aside by a clear.
    Cleared,
    /// The last element (or clear) was undone.
    Undone { kind: ElementKind },
    /// An undone element (or clear) was replayed.
    Redone { kind: ElementKind },
    /// The document was replaced wholesale, e.g. by an import.
    Reset { element_count: usize },
}
