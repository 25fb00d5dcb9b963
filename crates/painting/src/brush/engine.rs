//! Segment tessellation into stamps.

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::constants::{MAX_STAMPS_PER_SEGMENT, MIN_SEGMENT_LENGTH};
use crate::types::{Color, LineSegment, Stamp};

use super::{Brush, BrushKind, ChartletOrder, Rotation};

/// Number of stamps `segment` tessellates into: `max(1, floor(length / step))`.
///
/// Zero-length segments (taps) and non-positive steps give exactly one stamp.
/// The count never exceeds [`MAX_STAMPS_PER_SEGMENT`].
pub fn stamp_count(segment: &LineSegment) -> usize {
    let length = segment.length();
    if length < MIN_SEGMENT_LENGTH || segment.step <= 0.0 {
        return 1;
    }
    let count = (length / segment.step).floor();
    if count.is_nan() {
        return 1;
    }
    (count.min(MAX_STAMPS_PER_SEGMENT as f32) as usize).clamp(1, MAX_STAMPS_PER_SEGMENT)
}

/// A core stamp waiting for the outer stream to get far enough ahead
#[derive(Debug, Clone, Copy)]
struct PendingCore {
    /// Stroke distance at which the stamp was generated
    at: f32,
    /// Distance the outer stream must lead by before the stamp is released
    lag: f32,
    stamp: Stamp,
}

/// Per-stroke stamp generator for one brush
///
/// Holds the state that spans segments of a stroke: the chartlet image
/// cursor, the distance travelled and the core stamps still held back by a
/// glow brush. Use one engine per strip, from `begin_stroke` to
/// `finish_stroke`.
#[derive(Debug)]
pub struct StampEngine {
    brush: Arc<Brush>,
    /// Next image for cycling chartlet brushes
    image_cursor: usize,
    /// Length of all segments tessellated this stroke
    travelled: f32,
    pending_core: VecDeque<PendingCore>,
}

impl StampEngine {
    pub fn new(brush: Arc<Brush>) -> Self {
        Self {
            brush,
            image_cursor: 0,
            travelled: 0.0,
            pending_core: VecDeque::new(),
        }
    }

    pub fn brush(&self) -> &Arc<Brush> {
        &self.brush
    }

    /// Start a new stroke, dropping anything still pending
    pub fn begin_stroke(&mut self) {
        self.image_cursor = 0;
        self.travelled = 0.0;
        self.pending_core.clear();
    }

    /// Core stamps not yet released
    pub fn pending_core_count(&self) -> usize {
        self.pending_core.len()
    }

    /// Tessellate one segment. `strip_color` is used unless the segment has its own.
    pub fn tessellate(&mut self, segment: &LineSegment, strip_color: Color) -> Vec<Stamp> {
        let count = stamp_count(segment);
        let length = segment.length();
        let base = segment.color.unwrap_or(strip_color);
        let color = base.with_alpha(base.a * self.brush.opacity);
        let mut rng = StdRng::seed_from_u64(segment_seed(segment));
        let mut stamps = Vec::with_capacity(count);

        for i in 0..count {
            let t = i as f32 / count as f32;
            let position = segment.begin.lerp(segment.end, t);
            let angle = match self.brush.rotation {
                Rotation::Fixed(angle) => angle,
                Rotation::Random => rng.random::<f32>() * TAU,
                Rotation::Ahead => segment.angle(),
            };
            let texture = match &self.brush.kind {
                BrushKind::Chartlet { images, order } if !images.is_empty() => {
                    let index = match order {
                        ChartletOrder::Cycle => {
                            let index = self.image_cursor % images.len();
                            self.image_cursor += 1;
                            index
                        }
                        ChartletOrder::Random => rng.random_range(0..images.len()),
                    };
                    Some(images[index])
                }
                _ => self.brush.texture,
            };

            let stamp = Stamp {
                position,
                diameter: segment.diameter,
                aspect_ratio: 1.0,
                angle,
                color,
                texture,
                blend: self.brush.blend,
            };
            stamps.push(stamp);

            if let BrushKind::Glow {
                core_proportion,
                core_color,
            } = self.brush.kind
            {
                self.pending_core.push_back(PendingCore {
                    at: self.travelled + t * length,
                    lag: segment.diameter * (1.0 - core_proportion) / 2.0,
                    stamp: Stamp {
                        diameter: segment.diameter * core_proportion,
                        color: core_color.with_alpha(core_color.a * self.brush.opacity),
                        ..stamp
                    },
                });
            }
        }

        self.travelled += length;
        let released = self.release_core(false);
        if !released.is_empty() {
            debug!(
                "StampEngine::tessellate: released {} core stamps, {} pending",
                released.len(),
                self.pending_core.len()
            );
        }
        stamps.extend(released);
        stamps
    }

    /// End the stroke, releasing every core stamp still held back
    pub fn finish_stroke(&mut self) -> Vec<Stamp> {
        let released = self.release_core(true);
        self.begin_stroke();
        released
    }

    fn release_core(&mut self, all: bool) -> Vec<Stamp> {
        let mut released = Vec::new();
        while let Some(front) = self.pending_core.front() {
            if !all && front.at + front.lag > self.travelled {
                break;
            }
            if let Some(pending) = self.pending_core.pop_front() {
                released.push(pending.stamp);
            }
        }
        released
    }
}

/// Seed derived from the segment geometry so replays draw identical stamps
fn segment_seed(segment: &LineSegment) -> u64 {
    [segment.begin.x, segment.begin.y, segment.end.x, segment.end.y]
        .iter()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, v| {
            (hash ^ u64::from(v.to_bits())).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureId;
    use crate::types::BlendMode;
    use glam::Vec2;

    fn engine(brush: Brush) -> StampEngine {
        StampEngine::new(Arc::new(brush))
    }

    #[test]
    fn test_even_spacing() {
        let segment = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), 4.0, 2.0);
        let stamps = engine(Brush::new("pen", 4.0, 2.0)).tessellate(&segment, Color::BLACK);

        assert_eq!(stamps.len(), 10);
        for (i, stamp) in stamps.iter().enumerate() {
            assert!((stamp.position.x - 2.0 * i as f32).abs() < 0.001);
            assert!(stamp.position.y.abs() < 0.001);
            assert!((stamp.diameter - 4.0).abs() < 0.001);
        }
        assert!((stamps[9].position.x - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_stamp_count_is_bounded() {
        let tiny_step = LineSegment::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 3.0, 1e-30);
        assert_eq!(stamp_count(&tiny_step), MAX_STAMPS_PER_SEGMENT);
        let stamps = engine(Brush::new("pen", 3.0, 1.0)).tessellate(&tiny_step, Color::BLACK);
        assert_eq!(stamps.len(), MAX_STAMPS_PER_SEGMENT);

        let huge = LineSegment::new(Vec2::ZERO, Vec2::new(2.0e8, 0.0), 3.0, 0.1);
        assert_eq!(stamp_count(&huge), MAX_STAMPS_PER_SEGMENT);
    }

    #[test]
    fn test_coverage_count() {
        let cases = [(20.0, 2.0, 10), (7.0, 3.0, 2), (1.5, 4.0, 1), (0.0, 2.0, 1)];
        for (length, step, expected) in cases {
            let segment = LineSegment::new(Vec2::ZERO, Vec2::new(length, 0.0), 3.0, step);
            assert_eq!(stamp_count(&segment), expected, "L={length} S={step}");
            let stamps = engine(Brush::new("pen", 3.0, step)).tessellate(&segment, Color::BLACK);
            assert_eq!(stamps.len(), expected);
        }
    }

    #[test]
    fn test_tap_emits_single_stamp() {
        let point = Vec2::new(5.0, 5.0);
        let segment = LineSegment::new(point, point, 6.0, 2.0);
        let stamps = engine(Brush::new("pen", 6.0, 2.0)).tessellate(&segment, Color::BLACK);
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0].position, point);
    }

    #[test]
    fn test_color_and_opacity() {
        let brush = Brush {
            opacity: 0.5,
            blend: BlendMode::Erase,
            ..Brush::new("pen", 4.0, 2.0)
        };
        let mut segment = LineSegment::new(Vec2::ZERO, Vec2::new(4.0, 0.0), 4.0, 2.0);
        let stamps = engine(brush.clone()).tessellate(&segment, Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(stamps[0].color, Color::rgba(1.0, 0.0, 0.0, 0.5));
        assert_eq!(stamps[0].blend, BlendMode::Erase);

        segment.color = Some(Color::rgba(0.0, 0.0, 1.0, 0.8));
        let stamps = engine(brush).tessellate(&segment, Color::BLACK);
        assert_eq!(stamps[0].color, Color::rgba(0.0, 0.0, 1.0, 0.4));
    }

    #[test]
    fn test_rotation_ahead_follows_direction() {
        let brush = Brush {
            rotation: Rotation::Ahead,
            ..Brush::new("pen", 4.0, 2.0)
        };
        let segment = LineSegment::new(Vec2::ZERO, Vec2::new(0.0, 10.0), 4.0, 2.0);
        let stamps = engine(brush).tessellate(&segment, Color::BLACK);
        assert!(stamps
            .iter()
            .all(|s| (s.angle - std::f32::consts::FRAC_PI_2).abs() < 0.001));
    }

    #[test]
    fn test_random_rotation_is_reproducible() {
        let brush = Brush {
            rotation: Rotation::Random,
            ..Brush::new("pen", 4.0, 2.0)
        };
        let segment = LineSegment::new(Vec2::new(1.0, 2.0), Vec2::new(30.0, 9.0), 4.0, 2.0);
        let a = engine(brush.clone()).tessellate(&segment, Color::BLACK);
        let b = engine(brush).tessellate(&segment, Color::BLACK);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| (0.0..TAU).contains(&s.angle)));
        assert!(a.iter().any(|s| s.angle != a[0].angle));
    }

    #[test]
    fn test_chartlet_brush_cycles_images() {
        let images = vec![TextureId::new(), TextureId::new(), TextureId::new()];
        let brush = Brush::chartlet("stickers", 8.0, 8.0, images.clone(), ChartletOrder::Cycle);
        let mut engine = engine(brush);

        let first = LineSegment::new(Vec2::ZERO, Vec2::new(16.0, 0.0), 8.0, 8.0);
        let second = LineSegment::new(Vec2::new(16.0, 0.0), Vec2::new(32.0, 0.0), 8.0, 8.0);
        let mut stamps = engine.tessellate(&first, Color::BLACK);
        stamps.extend(engine.tessellate(&second, Color::BLACK));

        let used: Vec<_> = stamps.iter().map(|s| s.texture.unwrap()).collect();
        assert_eq!(used, vec![images[0], images[1], images[2], images[0]]);
    }

    #[test]
    fn test_chartlet_brush_random_images_come_from_list() {
        let images = vec![TextureId::new(), TextureId::new()];
        let brush = Brush::chartlet("confetti", 4.0, 4.0, images.clone(), ChartletOrder::Random);
        let segment = LineSegment::new(Vec2::ZERO, Vec2::new(80.0, 0.0), 4.0, 4.0);
        let stamps = engine(brush).tessellate(&segment, Color::BLACK);
        assert_eq!(stamps.len(), 20);
        assert!(stamps.iter().all(|s| images.contains(&s.texture.unwrap())));
    }

    #[test]
    fn test_glow_core_lags_behind_outer() {
        // lag = 10 * (1 - 0.4) / 2 = 3
        let brush = Brush::glow("neon", 10.0, 2.0, 0.4, Color::WHITE);
        let mut engine = engine(brush);

        let first = LineSegment::new(Vec2::ZERO, Vec2::new(4.0, 0.0), 10.0, 2.0);
        let stamps = engine.tessellate(&first, Color::BLACK);
        // two outer stamps (x=0, x=2); only the core at x=0 is 3 behind x=4
        let cores: Vec<_> = stamps.iter().filter(|s| s.color == Color::WHITE).collect();
        assert_eq!(stamps.len(), 3);
        assert_eq!(cores.len(), 1);
        assert!((cores[0].diameter - 4.0).abs() < 0.001);
        assert_eq!(engine.pending_core_count(), 1);

        let second = LineSegment::new(Vec2::new(4.0, 0.0), Vec2::new(8.0, 0.0), 10.0, 2.0);
        let stamps = engine.tessellate(&second, Color::BLACK);
        // outer at 4, 6; cores at 2 and 4 released (travelled 8)
        assert_eq!(stamps.len(), 4);
        assert_eq!(engine.pending_core_count(), 1);

        let tail = engine.finish_stroke();
        assert_eq!(tail.len(), 1);
        assert!((tail[0].position.x - 6.0).abs() < 0.001);
        assert_eq!(engine.pending_core_count(), 0);
    }

    #[test]
    fn test_glow_tap_flushes_on_finish() {
        let brush = Brush::glow("neon", 10.0, 2.0, 0.5, Color::WHITE);
        let mut engine = engine(brush);
        let point = Vec2::new(3.0, 3.0);
        let stamps = engine.tessellate(&LineSegment::new(point, point, 10.0, 2.0), Color::BLACK);
        assert_eq!(stamps.len(), 1);
        let tail = engine.finish_stroke();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].position, point);
    }
}
