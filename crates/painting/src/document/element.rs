//! Document element types.

use glam::Vec2;

use crate::texture::TextureId;
use crate::types::{Color, LineSegment};

/// Position of an element in the document's draw order
pub type ElementIndex = u64;

/// Kind tag of an [`Element`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Strip,
    Chartlet,
    Group,
    Clear,
}

/// The segments of one stroke, drawn with a brush referenced by name
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    /// Zero until the strip is closed
    pub index: ElementIndex,
    pub brush: String,
    /// Default color for segments without their own
    pub color: Color,
    pub segments: Vec<LineSegment>,
}

impl Strip {
    pub fn new(brush: impl Into<String>, color: Color) -> Self {
        Self {
            index: 0,
            brush: brush.into(),
            color,
            segments: Vec::new(),
        }
    }
}

/// A single stamped image
#[derive(Debug, Clone, PartialEq)]
pub struct Chartlet {
    /// Zero until the chartlet is closed
    pub index: ElementIndex,
    pub center: Vec2,
    /// Width and height in document points
    pub size: Vec2,
    /// Rotation in radians
    pub angle: f32,
    pub texture: TextureId,
}

impl Chartlet {
    pub fn new(center: Vec2, size: Vec2, angle: f32, texture: TextureId) -> Self {
        Self {
            index: 0,
            center,
            size,
            angle,
            texture,
        }
    }
}

/// Members of a group; one kind per group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItems {
    /// Drawing never groups strips; these only come from archives whose
    /// strip records share an index
    Strips(Vec<Strip>),
    Chartlets(Vec<Chartlet>),
}

impl GroupItems {
    pub fn len(&self) -> usize {
        match self {
            Self::Strips(strips) => strips.len(),
            Self::Chartlets(chartlets) => chartlets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Several same-kind elements undone and redone as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct ElementGroup {
    pub index: ElementIndex,
    pub items: GroupItems,
}

/// Marker for "erase everything before this"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearAction {
    pub index: ElementIndex,
}

/// Any unit of the document log
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Strip(Strip),
    Chartlet(Chartlet),
    Group(ElementGroup),
    Clear(ClearAction),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Strip(_) => ElementKind::Strip,
            Self::Chartlet(_) => ElementKind::Chartlet,
            Self::Group(_) => ElementKind::Group,
            Self::Clear(_) => ElementKind::Clear,
        }
    }

    pub fn index(&self) -> ElementIndex {
        match self {
            Self::Strip(strip) => strip.index,
            Self::Chartlet(chartlet) => chartlet.index,
            Self::Group(group) => group.index,
            Self::Clear(clear) => clear.index,
        }
    }

    /// Assign the index; group members share their group's index
    pub fn set_index(&mut self, index: ElementIndex) {
        match self {
            Self::Strip(strip) => strip.index = index,
            Self::Chartlet(chartlet) => chartlet.index = index,
            Self::Group(group) => {
                group.index = index;
                match &mut group.items {
                    GroupItems::Strips(strips) => strips.iter_mut().for_each(|s| s.index = index),
                    GroupItems::Chartlets(chartlets) => {
                        chartlets.iter_mut().for_each(|c| c.index = index)
                    }
                }
            }
            Self::Clear(clear) => clear.index = index,
        }
    }
}

/// Elements that were active when a clear happened
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedSnapshot {
    pub action: ClearAction,
    pub elements: Vec<Element>,
}
