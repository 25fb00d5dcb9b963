//! Append-only element log with clear snapshots and linear undo history.

use tracing::{debug, info};

use crate::types::{Color, LineSegment};

use super::element::{
    Chartlet, ClearAction, ClearedSnapshot, Element, ElementGroup, ElementIndex, ElementKind,
    GroupItems, Strip,
};
use super::events::DocumentEvent;

type Observer = Box<dyn Fn(&DocumentEvent) + Send + Sync>;

/// Everything drawn on a canvas.
///
/// Closed elements live in an append-only log ordered by strictly increasing
/// index. At most one element (a strip or a chartlet group) is open and still
/// being extended; it gets its index when it is closed. Any edit other than
/// undo/redo drops the redo history.
#[derive(Default)]
pub struct Document {
    elements: Vec<Element>,
    current: Option<Element>,
    cleared: Vec<ClearedSnapshot>,
    /// Undone elements, most recent last. Clears come back as `Element::Clear`.
    undo_stack: Vec<Element>,
    last_index: ElementIndex,
    observers: Vec<Observer>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("element_count", &self.elements.len())
            .field("current", &self.current.as_ref().map(Element::kind))
            .field("cleared_count", &self.cleared.len())
            .field("undo_count", &self.undo_stack.len())
            .field("last_index", &self.last_index)
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed elements in draw order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The open element, if any
    pub fn current_element(&self) -> Option<&Element> {
        self.current.as_ref()
    }

    /// Snapshots moved aside by clears, oldest first
    pub fn cleared_elements(&self) -> &[ClearedSnapshot] {
        &self.cleared
    }

    /// Index given to the most recently closed element or clear
    pub fn last_index(&self) -> ElementIndex {
        self.last_index
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some() || !self.elements.is_empty() || !self.cleared.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Register an observer for document events.
    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: Fn(&DocumentEvent) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn emit(&self, event: DocumentEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    /// Append segments drawn with `brush`.
    ///
    /// Extends the open strip when it belongs to the same brush; otherwise the
    /// open element is closed and a new strip is opened. Returns whether a
    /// strip was opened.
    pub fn append_segments(
        &mut self,
        segments: impl IntoIterator<Item = LineSegment>,
        brush: &str,
        color: Color,
    ) -> bool {
        let mut segments = segments.into_iter().peekable();
        if segments.peek().is_none() {
            return false;
        }
        self.undo_stack.clear();

        if let Some(Element::Strip(strip)) = &mut self.current {
            if strip.brush == brush {
                strip.segments.extend(segments);
                return false;
            }
        }

        self.finish_current_element();
        let mut strip = Strip::new(brush, color);
        strip.segments.extend(segments);
        debug!(
            "Document: strip began for brush {:?} with {} segments",
            brush,
            strip.segments.len()
        );
        self.current = Some(Element::Strip(strip));
        self.emit(DocumentEvent::StripBegan {
            brush: brush.to_string(),
        });
        true
    }

    /// Append a chartlet.
    ///
    /// Ungrouped chartlets are closed immediately as their own element.
    /// Grouped chartlets accumulate in the open group until an ungrouped
    /// append or [`finish_current_element`](Self::finish_current_element).
    pub fn append_chartlet(&mut self, chartlet: Chartlet, grouped: bool) {
        self.undo_stack.clear();

        if !grouped {
            self.finish_current_element();
            self.current = Some(Element::Chartlet(chartlet));
            self.finish_current_element();
            return;
        }

        if let Some(Element::Group(ElementGroup {
            items: GroupItems::Chartlets(chartlets),
            ..
        })) = &mut self.current
        {
            chartlets.push(chartlet);
            return;
        }

        self.finish_current_element();
        self.current = Some(Element::Group(ElementGroup {
            index: 0,
            items: GroupItems::Chartlets(vec![chartlet]),
        }));
    }

    /// Close the open element, giving it the next index.
    ///
    /// Returns the assigned index, or `None` if nothing was open.
    pub fn finish_current_element(&mut self) -> Option<ElementIndex> {
        let mut element = self.current.take()?;
        self.last_index += 1;
        element.set_index(self.last_index);
        let kind = element.kind();
        self.elements.push(element);
        self.undo_stack.clear();

        debug!("Document: finished {:?} #{}", kind, self.last_index);
        self.emit(DocumentEvent::ElementFinished {
            index: self.last_index,
            kind,
        });
        Some(self.last_index)
    }

    /// Drop the open element without adding it to the log
    pub fn discard_current_element(&mut self) -> Option<Element> {
        let element = self.current.take();
        if let Some(element) = &element {
            debug!("Document: discarded open {:?}", element.kind());
        }
        element
    }

    /// Erase all active content, keeping it for undo.
    ///
    /// Closes the open element first. Does nothing to the log when it is
    /// empty; the redo history is dropped either way. Returns whether a clear
    /// was recorded.
    pub fn append_clear_action(&mut self) -> bool {
        self.finish_current_element();
        self.undo_stack.clear();
        if self.elements.is_empty() {
            return false;
        }

        self.last_index += 1;
        let snapshot = ClearedSnapshot {
            action: ClearAction {
                index: self.last_index,
            },
            elements: std::mem::take(&mut self.elements),
        };
        info!(
            "Document: cleared {} elements (clear #{})",
            snapshot.elements.len(),
            self.last_index
        );
        self.cleared.push(snapshot);
        self.emit(DocumentEvent::Cleared);
        true
    }

    /// Undo the most recent element or clear.
    ///
    /// Returns true if an undo was performed, false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.finish_current_element();

        let kind = if let Some(element) = self.elements.pop() {
            let kind = element.kind();
            self.undo_stack.push(element);
            kind
        } else if let Some(snapshot) = self.cleared.pop() {
            self.elements = snapshot.elements;
            self.undo_stack.push(Element::Clear(snapshot.action));
            ElementKind::Clear
        } else {
            debug!("Undo: nothing to undo");
            return false;
        };

        debug!("Undo: {:?} ({} redo levels)", kind, self.undo_stack.len());
        self.emit(DocumentEvent::Undone { kind });
        true
    }

    /// Replay the most recently undone element or clear.
    ///
    /// Returns false if an element is open or nothing was undone.
    pub fn redo(&mut self) -> bool {
        if self.current.is_some() {
            return false;
        }
        let Some(element) = self.undo_stack.pop() else {
            debug!("Redo: nothing to redo");
            return false;
        };

        let kind = element.kind();
        match element {
            Element::Clear(action) => {
                let elements = std::mem::take(&mut self.elements);
                self.cleared.push(ClearedSnapshot { action, elements });
            }
            element => self.elements.push(element),
        }

        debug!("Redo: {:?} ({} redo levels)", kind, self.undo_stack.len());
        self.emit(DocumentEvent::Redone { kind });
        true
    }

    /// Replace the whole document with `elements`, ordered by index.
    ///
    /// Clear snapshots, the open element and the redo history are dropped.
    pub fn reset(&mut self, mut elements: Vec<Element>) {
        elements.sort_by_key(Element::index);
        self.last_index = elements.last().map(Element::index).unwrap_or(0);
        self.elements = elements;
        self.current = None;
        self.cleared.clear();
        self.undo_stack.clear();

        info!("Document: reset with {} elements", self.elements.len());
        self.emit(DocumentEvent::Reset {
            element_count: self.elements.len(),
        });
    }
}
