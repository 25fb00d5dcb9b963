//! Inkline painting system - stroke capture, stamps and the document
//!
//! This crate provides the core of the canvas:
//! - [`smoothing`] - Quadratic curve smoothing of raw input points
//! - [`brush`] - Brushes, the brush registry and segment tessellation
//! - [`document`] - Element log with undo/redo and clear snapshots
//! - [`texture`] - Shared registry of decoded textures
//! - [`canvas`] - Complete stroke capture pipeline
//! - [`types`] - Segments, stamps (GPU-compatible with bytemuck) and colors
//! - [`validation`] - Helpers for fixed-point conversion and validation

pub mod brush;
pub mod canvas;
pub mod constants;
pub mod document;
pub mod smoothing;
pub mod texture;
pub mod types;
pub mod validation;

pub use brush::*;
pub use canvas::*;
pub use constants::*;
pub use document::*;
pub use smoothing::*;
pub use texture::*;
pub use types::*;
pub use validation::*;
