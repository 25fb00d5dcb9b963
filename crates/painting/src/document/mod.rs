//! Document engine for the inkline canvas.
//!
//! This module provides:
//! - [`Document`] - Append-only element log with undo/redo and clear snapshots
//! - [`Element`] - Strips, chartlets, groups and clear markers
//! - [`DocumentEvent`] - Events for observers
//!
//! ## Stroke lifecycle
//!
//! ```text
//! Idle -> Open(Strip) -> (append)* -> Closed
//! Idle -> Closed                      (tap: single-segment strip)
//! ```
//!
//! Indices are handed out when an element is closed and only ever grow, so
//! the log is always sorted by index. Clears take an index too, which keeps
//! everything drawn after a clear ordered after it.

mod element;
mod events;
mod storage;

pub use element::{
    Chartlet, ClearAction, ClearedSnapshot, Element, ElementGroup, ElementIndex, ElementKind,
    GroupItems, Strip,
};
pub use events::DocumentEvent;
pub use storage::Document;
