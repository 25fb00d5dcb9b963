use crate::constants::{FIXED_POINT_SCALE, MIN_STEP};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must lie in {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{field} is below the stored resolution {min}, got {value}")]
    BelowResolution {
        field: &'static str,
        value: f32,
        min: f32,
    },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Require a finite value strictly greater than zero
pub fn positive(field: &'static str, value: f32) -> Result<f32, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

/// Require a finite value greater than or equal to zero
pub fn non_negative(field: &'static str, value: f32) -> Result<f32, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

/// Require a finite value within `min..=max`
pub fn in_range(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<f32, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Require a stamp step that is zero or at least [`MIN_STEP`]
pub fn step(field: &'static str, value: f32) -> Result<f32, ValidationError> {
    non_negative(field, value)?;
    if value > 0.0 && value < MIN_STEP {
        return Err(ValidationError::BelowResolution {
            field,
            value,
            min: MIN_STEP,
        });
    }
    Ok(value)
}

/// Convert document units to fixed-point (multiply by FIXED_POINT_SCALE, rounded)
pub fn to_fixed_point(value: f32) -> i32 {
    (value * FIXED_POINT_SCALE).round() as i32
}

/// Convert fixed-point back to document units (divide by FIXED_POINT_SCALE)
pub fn from_fixed_point(fixed: i32) -> f32 {
    fixed as f32 / FIXED_POINT_SCALE
}
