//! Stroke handling for the canvas

use glam::Vec2;
use tracing::debug;

use crate::brush::{Brush, StampEngine};
use crate::constants::MIN_SEGMENT_LENGTH;
use crate::types::{InputPhase, InputSample, LineSegment, Stamp};

use super::Canvas;

/// State of the stroke being drawn
#[derive(Debug)]
pub(super) struct ActiveStroke {
    engine: StampEngine,
    /// First raw point, for taps
    first: Vec2,
    /// Last raw point and its pressure
    last: Vec2,
    last_pressure: f32,
    /// End of the last emitted segment
    anchor: Vec2,
    /// Filtered pressure at `anchor`
    anchor_pressure: f32,
    segment_count: usize,
}

impl ActiveStroke {
    fn new(engine: StampEngine, position: Vec2, pressure: f32) -> Self {
        Self {
            engine,
            first: position,
            last: position,
            last_pressure: pressure,
            anchor: position,
            anchor_pressure: pressure,
            segment_count: 0,
        }
    }

    /// Cut smoothed points into segments.
    ///
    /// Spaced brushes only emit a segment once the point is a full step from
    /// the anchor; with `flush`, the final point is emitted regardless so the
    /// strip ends on the last raw point.
    fn segments_to(&mut self, points: &[Vec2], pressure: f32, flush: bool) -> Vec<LineSegment> {
        let brush = self.engine.brush().clone();
        let mut segments = Vec::new();
        let last = points.len().saturating_sub(1);

        for (i, &point) in points.iter().enumerate() {
            let distance = self.anchor.distance(point);
            if distance < MIN_SEGMENT_LENGTH {
                continue;
            }
            if !brush.is_dense() && distance < brush.step && !(flush && i == last) {
                continue;
            }
            segments.push(brush.make_segment(self.anchor, point, self.anchor_pressure, pressure));
            self.anchor_pressure = Brush::filtered_pressure(self.anchor_pressure, pressure);
            self.anchor = point;
        }

        self.segment_count += segments.len();
        segments
    }
}

impl Canvas {
    /// Feed one input sample through the pipeline.
    ///
    /// Returns the stamps to draw for it, in document coordinates.
    pub fn handle_input(&mut self, sample: InputSample) -> Vec<Stamp> {
        match sample.phase {
            InputPhase::Begin => self.begin_stroke(sample.position, sample.pressure),
            InputPhase::Move => self.stroke_to(sample.position, sample.pressure),
            InputPhase::End => self.end_stroke(sample.position, sample.pressure),
            InputPhase::Cancelled => {
                self.cancel_stroke();
                Vec::new()
            }
        }
    }

    /// Begin a stroke with the current brush.
    ///
    /// A stroke still in progress is ended first; its closing stamps are
    /// returned.
    pub fn begin_stroke(&mut self, position: Vec2, pressure: f32) -> Vec<Stamp> {
        let mut stamps = Vec::new();
        if let Some(stroke) = &self.stroke {
            debug!("begin_stroke: ending stroke still in progress");
            let (last, last_pressure) = (stroke.last, stroke.last_pressure);
            stamps = self.end_stroke(last, last_pressure);
        }

        let mut engine = StampEngine::new(self.current_brush.clone());
        engine.begin_stroke();
        self.smoother.begin(position);
        self.stroke = Some(ActiveStroke::new(engine, position, pressure));
        debug!(
            "begin_stroke: brush {:?} at ({:.1}, {:.1})",
            self.current_brush.name, position.x, position.y
        );
        stamps
    }

    /// Continue the stroke with a new raw point
    pub fn stroke_to(&mut self, position: Vec2, pressure: f32) -> Vec<Stamp> {
        let Some(stroke) = self.stroke.as_mut() else {
            debug!("stroke_to: no active stroke, ignoring");
            return Vec::new();
        };
        stroke.last = position;
        stroke.last_pressure = pressure;

        let points = self.smoother.push_point(position);
        let segments = stroke.segments_to(&points, pressure, false);
        self.commit_segments(segments)
    }

    /// End the stroke at `position`.
    ///
    /// Flushes the smoothed tail, or records a tap when no segment was drawn,
    /// then releases any held-back stamps and closes the strip.
    pub fn end_stroke(&mut self, position: Vec2, pressure: f32) -> Vec<Stamp> {
        if self.stroke.is_none() {
            debug!("end_stroke: no active stroke, ignoring");
            return Vec::new();
        }
        let mut stamps = self.stroke_to(position, pressure);

        let Some(mut stroke) = self.stroke.take() else {
            return stamps;
        };
        let tail = self.smoother.finish();
        let mut segments = stroke.segments_to(&tail, stroke.last_pressure, true);
        if stroke.segment_count == 0 {
            let brush = stroke.engine.brush().clone();
            let pressure = brush.force_on_tap.unwrap_or(stroke.last_pressure);
            debug!("end_stroke: tap with pressure {:.2}", pressure);
            segments.push(brush.make_segment(stroke.first, stroke.last, pressure, pressure));
        }

        stamps.extend(self.tessellate_and_record(&mut stroke.engine, segments));
        stamps.extend(stroke.engine.finish_stroke());
        self.document.finish_current_element();
        debug!(
            "end_stroke: {} segments, {} stamps in final batch",
            stroke.segment_count.max(1),
            stamps.len()
        );
        stamps
    }

    /// Abort the stroke and drop whatever it recorded
    pub fn cancel_stroke(&mut self) {
        if self.stroke.take().is_some() {
            self.smoother.finish();
            self.document.discard_current_element();
            debug!("cancel_stroke: stroke discarded");
        }
    }

    /// Forget stroke state without touching the document
    pub(crate) fn drop_stroke_state(&mut self) {
        if self.stroke.take().is_some() {
            self.smoother.finish();
        }
    }

    fn commit_segments(&mut self, segments: Vec<LineSegment>) -> Vec<Stamp> {
        let Some(mut stroke) = self.stroke.take() else {
            return Vec::new();
        };
        let stamps = self.tessellate_and_record(&mut stroke.engine, segments);
        self.stroke = Some(stroke);
        stamps
    }

    fn tessellate_and_record(
        &mut self,
        engine: &mut StampEngine,
        segments: Vec<LineSegment>,
    ) -> Vec<Stamp> {
        if segments.is_empty() {
            return Vec::new();
        }
        let brush = engine.brush().clone();
        let stamps: Vec<Stamp> = segments
            .iter()
            .flat_map(|segment| engine.tessellate(segment, brush.color))
            .collect();
        self.document
            .append_segments(segments, &brush.name, brush.color);
        stamps
    }
}
