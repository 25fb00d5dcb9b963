//! Brush definitions and stamp generation
//!
//! A [`Brush`] turns pairs of smoothed points into [`LineSegment`]s (sizing
//! them from pressure), and a [`StampEngine`] turns segments into the
//! [`Stamp`](crate::types::Stamp) stream the rasterizer draws. Brushes live
//! in a [`BrushRegistry`] owned by the canvas; document elements only refer to
//! them by name.

mod engine;
mod registry;

pub use engine::{StampEngine, stamp_count};
pub use registry::BrushRegistry;

use glam::Vec2;

use crate::constants::{DEFAULT_BRUSH_NAME, DENSE_STEP, PRESSURE_CARRY};
use crate::texture::{TextureId, TextureRegistry};
use crate::types::{BlendMode, Color, LineSegment};
use crate::validation::{self, ValidationError};

/// Error type for brush setup and selection.
#[derive(Debug, thiserror::Error)]
pub enum BrushError {
    #[error("{owner} references missing texture {texture}")]
    MissingTexture { owner: String, texture: TextureId },
    #[error("Brush {0} is already registered")]
    DuplicateName(String),
    #[error("Unknown brush: {0}")]
    UnknownBrush(String),
    #[error("Invalid brush {brush}: {source}")]
    Invalid {
        brush: String,
        #[source]
        source: ValidationError,
    },
}

/// How each stamp is rotated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    /// Constant angle in radians
    Fixed(f32),
    /// Uniformly random angle per stamp
    Random,
    /// Follow the direction of travel
    Ahead,
}

/// How a chartlet brush picks the image for each stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartletOrder {
    Cycle,
    Random,
}

/// Stamp generation variant
#[derive(Debug, Clone, PartialEq)]
pub enum BrushKind {
    /// One stamp stream with the brush texture
    Plain,
    /// Outer stream plus a narrower, lagging core stream
    Glow {
        /// Core diameter as a fraction of the outer diameter, in (0, 1]
        core_proportion: f32,
        core_color: Color,
    },
    /// Stamps images from a fixed list instead of a single texture
    Chartlet {
        images: Vec<TextureId>,
        order: ChartletOrder,
    },
}

/// Brush parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Unique name, the only thing documents store about a brush
    pub name: String,
    pub kind: BrushKind,
    /// Stamp diameter at full pressure
    pub diameter: f32,
    /// Distance between stamps; at or below 1.0 the brush is dense
    pub step: f32,
    /// Pressure exponent: 0 ignores pressure, 1 is linear
    pub force_sensitivity: f32,
    /// Pressure used for taps instead of the sampled pressure
    pub force_on_tap: Option<f32>,
    pub color: Color,
    /// Multiplied into the stamp alpha
    pub opacity: f32,
    pub rotation: Rotation,
    /// Tip texture, `None` for the built-in round tip
    pub texture: Option<TextureId>,
    pub blend: BlendMode,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            name: DEFAULT_BRUSH_NAME.to_string(),
            kind: BrushKind::Plain,
            diameter: 4.0,
            step: 1.0,
            force_sensitivity: 0.0,
            force_on_tap: None,
            color: Color::BLACK,
            opacity: 1.0,
            rotation: Rotation::Fixed(0.0),
            texture: None,
            blend: BlendMode::Normal,
        }
    }
}

impl Brush {
    /// Create a plain round brush
    pub fn new(name: impl Into<String>, diameter: f32, step: f32) -> Self {
        Self {
            name: name.into(),
            diameter,
            step,
            ..Default::default()
        }
    }

    /// Plain brush that erases instead of painting
    pub fn eraser(name: impl Into<String>, diameter: f32) -> Self {
        Self {
            blend: BlendMode::Erase,
            ..Self::new(name, diameter, 1.0)
        }
    }

    /// Brush with a bright core stream trailing the outer stream
    pub fn glow(
        name: impl Into<String>,
        diameter: f32,
        step: f32,
        core_proportion: f32,
        core_color: Color,
    ) -> Self {
        Self {
            kind: BrushKind::Glow {
                core_proportion,
                core_color,
            },
            ..Self::new(name, diameter, step)
        }
    }

    /// Brush that stamps images from `images`
    pub fn chartlet(
        name: impl Into<String>,
        diameter: f32,
        step: f32,
        images: Vec<TextureId>,
        order: ChartletOrder,
    ) -> Self {
        Self {
            kind: BrushKind::Chartlet { images, order },
            ..Self::new(name, diameter, step)
        }
    }

    /// Dense brushes place a segment at every smoothed point with no spacing filter
    pub fn is_dense(&self) -> bool {
        self.step <= DENSE_STEP
    }

    /// Low-pass the pressure across a segment's endpoints
    pub fn filtered_pressure(from: f32, to: f32) -> f32 {
        PRESSURE_CARRY * from + (1.0 - PRESSURE_CARRY) * to
    }

    /// Stamp diameter for an (already filtered) pressure
    pub fn diameter_for_pressure(&self, pressure: f32) -> f32 {
        self.diameter * pressure.clamp(0.0, 1.0).powf(self.force_sensitivity)
    }

    /// Build the segment `from -> to`, sizing it from the filtered pressure pair
    pub fn make_segment(
        &self,
        from: Vec2,
        to: Vec2,
        from_pressure: f32,
        to_pressure: f32,
    ) -> LineSegment {
        let pressure = Self::filtered_pressure(from_pressure, to_pressure);
        LineSegment::new(from, to, self.diameter_for_pressure(pressure), self.step)
    }

    /// Every texture this brush draws with
    pub fn referenced_textures(&self) -> Vec<TextureId> {
        let mut ids: Vec<TextureId> = self.texture.into_iter().collect();
        if let BrushKind::Chartlet { images, .. } = &self.kind {
            ids.extend(images.iter().copied());
        }
        ids
    }

    /// Check parameters and that every referenced texture is registered
    pub fn validate(&self, textures: &TextureRegistry) -> Result<(), BrushError> {
        self.validate_parameters().map_err(|source| BrushError::Invalid {
            brush: self.name.clone(),
            source,
        })?;

        for texture in self.referenced_textures() {
            if !textures.contains(texture) {
                return Err(BrushError::MissingTexture {
                    owner: format!("Brush {}", self.name),
                    texture,
                });
            }
        }
        Ok(())
    }

    fn validate_parameters(&self) -> Result<(), ValidationError> {
        validation::positive("diameter", self.diameter)?;
        validation::step("step", self.step)?;
        validation::non_negative("force_sensitivity", self.force_sensitivity)?;
        validation::in_range("opacity", self.opacity, 0.0, 1.0)?;
        if let Some(pressure) = self.force_on_tap {
            validation::in_range("force_on_tap", pressure, 0.0, 1.0)?;
        }
        match &self.kind {
            BrushKind::Plain => {}
            BrushKind::Glow {
                core_proportion, ..
            } => {
                validation::positive("core_proportion", *core_proportion)?;
                validation::in_range("core_proportion", *core_proportion, 0.0, 1.0)?;
            }
            BrushKind::Chartlet { images, .. } => {
                if images.is_empty() {
                    return Err(ValidationError::Empty("images"));
                }
            }
        }
        Ok(())
    }
}
