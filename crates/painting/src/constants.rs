/// Persisted coordinates and sizes are stored as value * FIXED_POINT_SCALE.
pub const FIXED_POINT_SCALE: f32 = 10.0;

/// Weight of the previous pressure in the two-point pressure low-pass.
pub const PRESSURE_CARRY: f32 = 0.95;

/// Brushes with a stamp step at or below this are in dense mode.
pub const DENSE_STEP: f32 = 1.0;

/// Name of the brush every registry starts with.
pub const DEFAULT_BRUSH_NAME: &str = "default";

/// Segments shorter than this are treated as zero-length (taps).
pub const MIN_SEGMENT_LENGTH: f32 = 0.001;

/// Smallest non-zero stamp step that survives the fixed-point round trip.
pub const MIN_STEP: f32 = 1.0 / FIXED_POINT_SCALE;

/// Upper bound on the stamps one segment tessellates into.
pub const MAX_STAMPS_PER_SEGMENT: usize = 16_384;
