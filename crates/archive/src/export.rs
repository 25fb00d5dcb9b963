//! Writing a document to an archive directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use image::ImageFormat;
use tracing::{debug, info};

use inkline_config::AppIdentity;
use inkline_painting::{Canvas, Element, GroupItems, TextureId, TextureRegistry};

use crate::records::{
    ChartletRecord, ContentRecord, Identity, InfoRecord, StripRecord, encode_point,
};
use crate::{
    ArchiveError, CONTENT_FILE, CONTENT_PROGRESS, FORMAT_VERSION, INFO_FILE, INFO_PROGRESS,
    ProgressCallback, TEXTURES_DIR, report, texture_progress,
};

/// Everything an export needs, detached from the canvas.
///
/// The texture registry is a shared handle, so drawing can continue while the
/// snapshot is written.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub size: Vec2,
    /// Closed elements in index order
    pub elements: Vec<Element>,
    pub textures: TextureRegistry,
    pub app: AppIdentity,
    pub identifier: Option<String>,
}

impl DocumentSnapshot {
    /// Snapshot the closed elements of `canvas`. An element still open is not included.
    pub fn from_canvas(canvas: &Canvas) -> Self {
        Self {
            size: canvas.canvas_size(),
            elements: canvas.document().elements().to_vec(),
            textures: canvas.textures().clone(),
            app: canvas.config().app.clone(),
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// The `content` record and the textures its chartlets reference
    fn content(&self) -> (ContentRecord, BTreeSet<TextureId>) {
        let mut content = ContentRecord {
            size: encode_point(self.size),
            ..Default::default()
        };
        for element in &self.elements {
            match element {
                Element::Strip(strip) => content
                    .line_strips
                    .push(StripRecord::from_strip(strip, false)),
                Element::Chartlet(chartlet) => content
                    .chartlets
                    .push(ChartletRecord::from_chartlet(chartlet, false)),
                Element::Group(group) => match &group.items {
                    GroupItems::Strips(strips) => content
                        .line_strips
                        .extend(strips.iter().map(|s| StripRecord::from_strip(s, true))),
                    GroupItems::Chartlets(chartlets) => content
                        .chartlets
                        .extend(chartlets.iter().map(|c| ChartletRecord::from_chartlet(c, true))),
                },
                Element::Clear(_) => {}
            }
        }
        let textures = content.chartlets.iter().map(|c| c.texture).collect();
        (content, textures)
    }
}

/// Write `snapshot` into `dir`, which must be missing or empty.
///
/// Only textures referenced by chartlets are written. Returns the `info`
/// record that was written.
pub fn write_archive(
    snapshot: &DocumentSnapshot,
    dir: &Path,
    on_progress: Option<&ProgressCallback>,
) -> Result<InfoRecord, ArchiveError> {
    if dir.exists() && fs::read_dir(dir)?.next().is_some() {
        return Err(ArchiveError::DirectoryNotEmpty(dir.to_path_buf()));
    }

    let (content, texture_ids) = snapshot.content();
    let mut textures = Vec::with_capacity(texture_ids.len());
    for id in texture_ids {
        let texture = snapshot
            .textures
            .get(id)
            .ok_or(ArchiveError::MissingTexture(id))?;
        textures.push(texture);
    }

    let info = InfoRecord {
        version: FORMAT_VERSION.to_string(),
        app: Identity::from(&snapshot.app),
        library: Identity::library(),
        lines: content.line_strips.len(),
        chartlets: content.chartlets.len(),
        textures: textures.len(),
        identifier: snapshot.identifier.clone(),
    };

    fs::create_dir_all(dir)?;
    fs::write(dir.join(INFO_FILE), serde_json::to_vec_pretty(&info)?)?;
    report(on_progress, INFO_PROGRESS);

    fs::write(dir.join(CONTENT_FILE), serde_json::to_vec(&content)?)?;
    report(on_progress, CONTENT_PROGRESS);

    if !textures.is_empty() {
        let textures_dir = dir.join(TEXTURES_DIR);
        fs::create_dir_all(&textures_dir)?;
        for (done, texture) in textures.iter().enumerate() {
            texture
                .image
                .save_with_format(textures_dir.join(texture.id.to_string()), ImageFormat::Png)?;
            debug!("write_archive: texture {} written", texture.id);
            report(on_progress, texture_progress(done + 1, textures.len()));
        }
    }
    report(on_progress, 1.0);

    info!(
        "Exported {} strips, {} chartlets, {} textures to {}",
        info.lines,
        info.chartlets,
        info.textures,
        dir.display()
    );
    Ok(info)
}

/// Export `snapshot` to `dir` on a blocking worker
pub async fn export(
    snapshot: DocumentSnapshot,
    dir: impl Into<PathBuf>,
    on_progress: Option<ProgressCallback>,
) -> Result<InfoRecord, ArchiveError> {
    let dir = dir.into();
    tokio::task::spawn_blocking(move || write_archive(&snapshot, &dir, on_progress.as_ref()))
        .await
        .map_err(|e| ArchiveError::Worker(e.to_string()))?
}
