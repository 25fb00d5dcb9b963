//! Stroke capture pipeline
//!
//! This module connects:
//! - Input handling (raw samples from the host's gesture layer)
//! - Curve smoothing
//! - Brush tessellation (stamp generation)
//! - The document (element log, undo/redo)
//!
//! The canvas is single-threaded: samples, document mutation and stamp output
//! all happen on the caller's thread. Only the texture registry is shared, so
//! a background export can read it.

mod render;
mod stroke;
mod undo;

use std::sync::Arc;

use glam::Vec2;
use tracing::debug;

use inkline_config::CanvasConfig;

use crate::brush::{Brush, BrushError, BrushRegistry};
use crate::document::{Chartlet, Document, Element};
use crate::smoothing::CurveSmoother;
use crate::texture::{TextureId, TextureRegistry};

pub use render::chartlet_stamp;
use stroke::ActiveStroke;

/// Drawing surface state: brushes, textures, the document and the stroke in progress
///
/// 1. Input comes in via [`handle_input`](Canvas::handle_input) (or
///    `begin_stroke`, `stroke_to`, `end_stroke`)
/// 2. Raw points are smoothed into a dense polyline
/// 3. The polyline is cut into segments sized by pressure
/// 4. Segments are tessellated into stamps for the rasterizer
/// 5. Segments are recorded in the document
pub struct Canvas {
    config: CanvasConfig,
    brushes: BrushRegistry,
    textures: TextureRegistry,
    document: Document,
    smoother: CurveSmoother,
    current_brush: Arc<Brush>,
    /// Stroke in progress (None if not drawing)
    stroke: Option<ActiveStroke>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("canvas_size", &self.config.canvas_size)
            .field("current_brush", &self.current_brush.name)
            .field("brush_count", &self.brushes.len())
            .field("textures", &self.textures)
            .field("document", &self.document)
            .field("stroking", &self.stroke.is_some())
            .finish()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    /// Create a canvas with only the default brush registered
    pub fn new(config: CanvasConfig) -> Self {
        let brushes = BrushRegistry::new();
        let current_brush = brushes.default_brush();
        Self {
            smoother: CurveSmoother::new(config.smoothing_samples),
            config,
            brushes,
            textures: TextureRegistry::new(),
            document: Document::new(),
            current_brush,
            stroke: None,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Canvas size in document points
    pub fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.config.width_f32(), self.config.height_f32())
    }

    pub fn set_canvas_size(&mut self, size: [u32; 2]) {
        self.config.canvas_size = size;
    }

    pub fn brushes(&self) -> &BrushRegistry {
        &self.brushes
    }

    /// Handle to the shared texture registry
    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Validate and register a brush against this canvas' textures
    pub fn register_brush(&mut self, brush: Brush) -> Result<Arc<Brush>, BrushError> {
        self.brushes.register(brush, &self.textures)
    }

    /// Select the brush used by the next stroke
    pub fn set_current_brush(&mut self, name: &str) -> Result<(), BrushError> {
        let brush = self
            .brushes
            .find(name)
            .ok_or_else(|| BrushError::UnknownBrush(name.to_string()))?;
        debug!("Canvas: current brush {:?}", brush.name);
        self.current_brush = brush;
        Ok(())
    }

    pub fn current_brush(&self) -> &Arc<Brush> {
        &self.current_brush
    }

    /// Check if a stroke is currently in progress
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Replace the document with loaded elements, abandoning any stroke in progress
    pub fn load_elements(&mut self, elements: Vec<Element>) {
        self.drop_stroke_state();
        self.document.reset(elements);
    }

    /// Place an image on the canvas.
    ///
    /// With `grouped`, consecutive chartlets form one undo unit until an
    /// ungrouped chartlet or the next closed element.
    pub fn paste_chartlet(
        &mut self,
        center: Vec2,
        size: Vec2,
        texture: TextureId,
        angle: f32,
        grouped: bool,
    ) -> Result<(), BrushError> {
        if !self.textures.contains(texture) {
            return Err(BrushError::MissingTexture {
                owner: "Chartlet".to_string(),
                texture,
            });
        }
        self.document
            .append_chartlet(Chartlet::new(center, size, angle, texture), grouped);
        Ok(())
    }
}
