//! Replay of the document into stamps

use crate::brush::StampEngine;
use crate::document::{Chartlet, Element, GroupItems, Strip};
use crate::types::{BlendMode, Color, Stamp, Viewport};

use super::Canvas;

/// The single stamp that draws a chartlet
pub fn chartlet_stamp(chartlet: &Chartlet) -> Stamp {
    let aspect_ratio = if chartlet.size.x > 0.0 {
        chartlet.size.y / chartlet.size.x
    } else {
        1.0
    };
    Stamp {
        position: chartlet.center,
        diameter: chartlet.size.x,
        aspect_ratio,
        angle: chartlet.angle,
        color: Color::WHITE,
        texture: Some(chartlet.texture),
        blend: BlendMode::Normal,
    }
}

impl Canvas {
    /// Stamps for the whole visible document, mapped through `viewport`.
    ///
    /// Closed elements come first in index order, then the open element.
    /// Strips referencing an unknown brush draw with the default brush.
    pub fn render(&self, viewport: &Viewport) -> Vec<Stamp> {
        let mut stamps = Vec::new();
        for element in self.document.elements() {
            self.render_element(element, true, &mut stamps);
        }
        if let Some(current) = self.document.current_element() {
            self.render_element(current, false, &mut stamps);
        }
        stamps.into_iter().map(|stamp| viewport.apply(stamp)).collect()
    }

    fn render_element(&self, element: &Element, closed: bool, out: &mut Vec<Stamp>) {
        match element {
            Element::Strip(strip) => self.render_strip(strip, closed, out),
            Element::Chartlet(chartlet) => out.push(chartlet_stamp(chartlet)),
            Element::Group(group) => match &group.items {
                GroupItems::Strips(strips) => {
                    for strip in strips {
                        self.render_strip(strip, closed, out);
                    }
                }
                GroupItems::Chartlets(chartlets) => {
                    out.extend(chartlets.iter().map(chartlet_stamp))
                }
            },
            Element::Clear(_) => {}
        }
    }

    /// An open strip keeps its glow core held back, as it was while drawing
    fn render_strip(&self, strip: &Strip, closed: bool, out: &mut Vec<Stamp>) {
        let mut engine = StampEngine::new(self.brushes.resolve(&strip.brush));
        for segment in &strip.segments {
            out.extend(engine.tessellate(segment, strip.color));
        }
        if closed {
            out.extend(engine.finish_stroke());
        }
    }
}
