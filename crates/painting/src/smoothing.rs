//! Incremental quadratic-midpoint curve smoothing
//!
//! Raw input points are sparse and jittery. [`CurveSmoother`] keeps the last
//! three raw points and, for every new point, emits samples along the
//! quadratic curve that starts at the midpoint of the previous pair, uses the
//! middle point as its control point, and ends at the midpoint of the newest
//! pair. Consecutive curves share their midpoints, so the output is a
//! continuous polyline that only ever grows: each call returns the points
//! produced by that call and nothing else.

use glam::Vec2;
use tracing::debug;

use inkline_config::{DEFAULT_SMOOTHING_SAMPLES, MAX_SMOOTHING_SAMPLES, MIN_SMOOTHING_SAMPLES};

/// Pull-based quadratic smoother driven once per raw input point
#[derive(Debug, Clone)]
pub struct CurveSmoother {
    /// Samples emitted per curve
    samples: usize,
    /// Up to the last three raw points, oldest first
    window: Vec<Vec2>,
    /// End of the last emitted curve (None until the first curve)
    tail: Option<Vec2>,
    /// Raw points accepted since `begin`
    raw_count: usize,
}

impl Default for CurveSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_SAMPLES)
    }
}

impl CurveSmoother {
    /// Create a smoother emitting `samples` points per raw point
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.clamp(MIN_SMOOTHING_SAMPLES, MAX_SMOOTHING_SAMPLES),
            window: Vec::with_capacity(3),
            tail: None,
            raw_count: 0,
        }
    }

    /// Samples emitted per curve
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Number of raw points accepted since the last `begin`
    pub fn raw_count(&self) -> usize {
        self.raw_count
    }

    /// Start a new curve at `point`. Produces no output.
    pub fn begin(&mut self, point: Vec2) {
        self.window.clear();
        self.window.push(point);
        self.tail = None;
        self.raw_count = 1;
    }

    /// Accept the next raw point and return the newly smoothed points.
    ///
    /// Returns nothing until three raw points have been seen. A point equal to
    /// the previous raw point is ignored.
    pub fn push_point(&mut self, point: Vec2) -> Vec<Vec2> {
        if self.window.is_empty() {
            self.begin(point);
            return Vec::new();
        }
        if self.window.last() == Some(&point) {
            return Vec::new();
        }

        self.raw_count += 1;
        if self.window.len() == 3 {
            self.window.remove(0);
        }
        self.window.push(point);
        if self.window.len() < 3 {
            return Vec::new();
        }

        let (p0, p1, p2) = (self.window[0], self.window[1], self.window[2]);
        let end = (p1 + p2) * 0.5;
        let mut out = Vec::with_capacity(self.samples + 1);
        let begin = match self.tail {
            Some(tail) => tail,
            None => {
                // First curve starts at the first raw point itself
                out.push(p0);
                p0
            }
        };

        for i in 1..=self.samples {
            if i == self.samples {
                out.push(end);
            } else {
                let t = i as f32 / self.samples as f32;
                out.push(quadratic(begin, p1, end, t));
            }
        }

        self.tail = Some(end);
        out
    }

    /// Flush the pending tail so the curve ends exactly on the last raw point.
    ///
    /// Returns nothing when fewer than three raw points were seen; callers
    /// render those strokes as taps.
    pub fn finish(&mut self) -> Vec<Vec2> {
        let mut out = Vec::new();
        if let (Some(tail), Some(&last)) = (self.tail, self.window.last()) {
            for i in 1..=self.samples {
                if i == self.samples {
                    out.push(last);
                } else {
                    out.push(tail.lerp(last, i as f32 / self.samples as f32));
                }
            }
            debug!(
                "CurveSmoother::finish: {} raw points, tail of {} samples",
                self.raw_count,
                out.len()
            );
        }
        self.window.clear();
        self.tail = None;
        out
    }
}

/// Point on the quadratic Bezier `begin -> control -> end` at `t`
fn quadratic(begin: Vec2, control: Vec2, end: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    begin * (u * u) + control * (2.0 * u * t) + end * (t * t)
}
