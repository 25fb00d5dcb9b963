//! Document persistence for inkline
//!
//! An archive is a directory holding:
//! - `info` - format version, app/library identity and element counts (JSON)
//! - `content` - canvas size, line strips and chartlets (JSON, fixed-point geometry)
//! - `textures/<id>` - PNG images for every texture a chartlet references
//!
//! [`export`] and [`import`] run the file work on a blocking tokio worker and
//! report progress from 0.0 to 1.0. An import is only installed on a canvas by
//! [`ImportedDocument::install`], so a failed import never touches the canvas.

mod export;
mod import;
pub mod records;

use std::path::PathBuf;

use inkline_painting::TextureId;
use thiserror::Error;

pub use export::{DocumentSnapshot, export, write_archive};
pub use import::{ImportedDocument, InstallReport, import, read_archive};

/// Archive format version written to and required in `info`
pub const FORMAT_VERSION: &str = "1";

pub const INFO_FILE: &str = "info";
pub const CONTENT_FILE: &str = "content";
pub const TEXTURES_DIR: &str = "textures";

/// Progress after the `info` record is written or read
pub const INFO_PROGRESS: f32 = 0.02;
/// Progress after the `content` record is written or read
pub const CONTENT_PROGRESS: f32 = 0.1;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Target directory is not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    #[error("File damaged: {0}")]
    FileDamaged(String),

    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(String),

    #[error("Chartlet references unregistered texture {0}")]
    MissingTexture(TextureId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive worker failed: {0}")]
    Worker(String),
}

/// Progress callback type, called with values increasing from 0.0 to 1.0
pub type ProgressCallback = Box<dyn Fn(f32) + Send + Sync>;

/// Progress after `done` of `total` textures
pub(crate) fn texture_progress(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    (CONTENT_PROGRESS + (1.0 - CONTENT_PROGRESS) * done as f32 / total as f32).min(1.0)
}

pub(crate) fn report(on_progress: Option<&ProgressCallback>, progress: f32) {
    if let Some(callback) = on_progress {
        callback(progress);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use glam::Vec2;
    use image::{Rgba, RgbaImage};
    use inkline_painting::{Brush, Canvas, Color, LineSegment, TextureId};

    pub fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("inkline-archive-{}", uuid::Uuid::new_v4()))
    }

    pub fn texture(canvas: &Canvas, rgba: [u8; 4]) -> TextureId {
        let id = TextureId::new();
        canvas
            .textures()
            .register(id, RgbaImage::from_pixel(3, 2, Rgba(rgba)))
            .unwrap();
        id
    }

    fn strip(canvas: &mut Canvas, brush: &str, y: f32) {
        let segments = [
            LineSegment::new(Vec2::new(0.0, y), Vec2::new(4.5, y), 4.0, 2.0),
            LineSegment {
                color: Some(Color::WHITE),
                ..LineSegment::new(Vec2::new(4.5, y), Vec2::new(9.0, y + 1.5), 3.5, 2.0)
            },
        ];
        let document = canvas.document_mut();
        document.append_segments(segments, brush, Color::BLACK);
        document.finish_current_element();
    }

    /// A canvas with two strips, a lone chartlet, a chartlet group and one
    /// registered texture nothing references
    pub fn sample_canvas() -> (Canvas, Vec<TextureId>) {
        let mut canvas = Canvas::default();
        canvas.register_brush(Brush::new("pen", 4.0, 2.0)).unwrap();
        let red = texture(&canvas, [255, 0, 0, 255]);
        let blue = texture(&canvas, [0, 0, 255, 128]);
        let unused = texture(&canvas, [0, 255, 0, 255]);

        strip(&mut canvas, "pen", 0.0);
        canvas
            .paste_chartlet(Vec2::new(20.0, 20.0), Vec2::new(8.0, 4.0), red, 0.0, false)
            .unwrap();
        canvas
            .paste_chartlet(Vec2::new(30.0, 10.0), Vec2::new(6.0, 6.0), blue, 0.0, true)
            .unwrap();
        canvas
            .paste_chartlet(Vec2::new(40.5, 10.0), Vec2::new(6.0, 6.0), red, 0.0, true)
            .unwrap();
        canvas.document_mut().finish_current_element();
        strip(&mut canvas, "default", 12.0);

        (canvas, vec![red, blue, unused])
    }
}
