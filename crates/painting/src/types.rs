use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::texture::TextureId;

/// Blend modes for stamping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Erase = 1,
}

/// Straight (non-premultiplied) RGBA color, components in 0.0-1.0.
///
/// Serializes as a `#RRGGBBAA` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid color string: {0}")]
pub struct ColorParseError(String);

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Format as `#RRGGBBAA`
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(ColorParseError(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorParseError(hex.to_string()))
        };
        let a = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

/// Phase of a raw input sample within a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPhase {
    Begin,
    Move,
    End,
    Cancelled,
}

/// A raw pointer/stylus sample delivered by the gesture layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSample {
    pub position: Vec2,
    /// Normalized pressure 0.0-1.0
    pub pressure: f32,
    pub phase: InputPhase,
}

impl InputSample {
    pub fn new(position: Vec2, pressure: f32, phase: InputPhase) -> Self {
        Self {
            position,
            pressure: pressure.clamp(0.0, 1.0),
            phase,
        }
    }
}

/// One straight piece of a stroke: the persisted unit of a strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub begin: Vec2,
    pub end: Vec2,
    /// Stamp diameter along this segment
    pub diameter: f32,
    /// Distance between consecutive stamps
    pub step: f32,
    /// Overrides the owning strip's color when set
    pub color: Option<Color>,
}

impl LineSegment {
    pub fn new(begin: Vec2, end: Vec2, diameter: f32, step: f32) -> Self {
        Self {
            begin,
            end,
            diameter,
            step,
            color: None,
        }
    }

    pub fn length(&self) -> f32 {
        self.begin.distance(self.end)
    }

    /// Direction of travel in radians, 0 for zero-length segments
    pub fn angle(&self) -> f32 {
        let d = self.end - self.begin;
        if d == Vec2::ZERO { 0.0 } else { d.y.atan2(d.x) }
    }
}

/// A single point-sprite draw instruction for the rasterizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    /// Center in document (or view, after [`Viewport::apply`]) coordinates
    pub position: Vec2,
    /// Diameter of the sprite
    pub diameter: f32,
    /// Height / width of the sprite, 1.0 for round brush tips
    pub aspect_ratio: f32,
    /// Rotation in radians
    pub angle: f32,
    pub color: Color,
    /// Source texture, `None` for the built-in round tip
    pub texture: Option<TextureId>,
    pub blend: BlendMode,
}

impl Stamp {
    /// GPU vertex for this stamp. Texture and blend mode are batch state.
    pub fn vertex(&self) -> StampVertex {
        StampVertex {
            position: self.position.to_array(),
            diameter: self.diameter,
            aspect_ratio: self.aspect_ratio,
            color: self.color.to_array(),
            angle: self.angle,
            _padding: 0.0,
        }
    }
}

/// Point-sprite vertex layout
///
/// This struct is designed for GPU compatibility with bytemuck.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct StampVertex {
    pub position: [f32; 2],
    pub diameter: f32,
    pub aspect_ratio: f32,
    pub color: [f32; 4],
    pub angle: f32,
    pub _padding: f32,
}

/// View transform supplied by the host at draw time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Pixels per view point (display scale factor)
    pub scale: f32,
    /// Canvas zoom
    pub zoom: f32,
    /// Content offset in zoomed document points
    pub offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zoom: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    /// Map a document point into view pixels
    pub fn to_view(&self, point: Vec2) -> Vec2 {
        (point * self.zoom - self.offset) * self.scale
    }

    /// Map a stamp from document space into view pixels
    pub fn apply(&self, stamp: Stamp) -> Stamp {
        Stamp {
            position: self.to_view(stamp.position),
            diameter: stamp.diameter * self.zoom * self.scale,
            ..stamp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let color = Color::rgba(1.0, 0.0, 0.2, 0.6);
        let hex = color.to_hex();
        assert_eq!(hex, "#FF003399");
        let parsed = Color::from_hex(&hex).unwrap();
        assert!((parsed.b - 0.2).abs() < 0.01);
        assert!((parsed.a - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_color_hex_without_alpha() {
        let parsed = Color::from_hex("00ff00").unwrap();
        assert_eq!(parsed, Color::rgba(0.0, 1.0, 0.0, 1.0));
        assert!(Color::from_hex("#12").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn test_input_sample_clamps_pressure() {
        let sample = InputSample::new(Vec2::ZERO, 3.0, InputPhase::Move);
        assert_eq!(sample.pressure, 1.0);
    }

    #[test]
    fn test_viewport_apply() {
        let viewport = Viewport {
            scale: 2.0,
            zoom: 1.5,
            offset: Vec2::new(10.0, 0.0),
        };
        let stamp = Stamp {
            position: Vec2::new(10.0, 4.0),
            diameter: 4.0,
            aspect_ratio: 1.0,
            angle: 0.0,
            color: Color::BLACK,
            texture: None,
            blend: BlendMode::Normal,
        };
        let view = viewport.apply(stamp);
        assert!((view.position.x - 10.0).abs() < 0.001);
        assert!((view.position.y - 12.0).abs() < 0.001);
        assert!((view.diameter - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_stamp_vertex_layout() {
        assert_eq!(std::mem::size_of::<StampVertex>(), 40);
    }
}
