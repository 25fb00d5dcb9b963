//! Brushes registered on a canvas, looked up by name.

use std::sync::Arc;

use tracing::{info, warn};

use crate::texture::TextureRegistry;

use super::{Brush, BrushError};

/// Named brushes owned by a canvas
///
/// Always holds at least the default brush. Documents reference brushes by
/// name only, so lookups that miss fall back to the default brush instead of
/// failing.
#[derive(Debug, Clone)]
pub struct BrushRegistry {
    brushes: Vec<Arc<Brush>>,
    default_index: usize,
}

impl Default for BrushRegistry {
    fn default() -> Self {
        Self {
            brushes: vec![Arc::new(Brush::default())],
            default_index: 0,
        }
    }
}

impl BrushRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a brush. Names must be unique.
    pub fn register(
        &mut self,
        brush: Brush,
        textures: &TextureRegistry,
    ) -> Result<Arc<Brush>, BrushError> {
        if self.find(&brush.name).is_some() {
            return Err(BrushError::DuplicateName(brush.name));
        }
        brush.validate(textures)?;

        info!("Registered brush {:?} ({:?})", brush.name, brush.kind);
        let brush = Arc::new(brush);
        self.brushes.push(Arc::clone(&brush));
        Ok(brush)
    }

    pub fn find(&self, name: &str) -> Option<Arc<Brush>> {
        self.brushes.iter().find(|b| b.name == name).cloned()
    }

    /// Look up `name`, falling back to the default brush
    pub fn resolve(&self, name: &str) -> Arc<Brush> {
        self.find(name).unwrap_or_else(|| {
            warn!("Brush {:?} not registered, using default brush", name);
            self.default_brush()
        })
    }

    pub fn default_brush(&self) -> Arc<Brush> {
        Arc::clone(&self.brushes[self.default_index])
    }

    /// Make a registered brush the fallback for unresolved names
    pub fn set_default(&mut self, name: &str) -> Result<(), BrushError> {
        let index = self
            .brushes
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| BrushError::UnknownBrush(name.to_string()))?;
        self.default_index = index;
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.brushes.iter().map(|b| b.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.brushes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brushes.is_empty()
    }
}
