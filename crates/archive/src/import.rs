//! Reading an archive directory back into document elements.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glam::Vec2;
use image::RgbaImage;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use inkline_painting::{Canvas, Element, ElementGroup, ElementIndex, GroupItems, TextureId};

use crate::records::{ContentRecord, InfoRecord, decode_point};
use crate::{
    ArchiveError, CONTENT_FILE, CONTENT_PROGRESS, FORMAT_VERSION, INFO_FILE, INFO_PROGRESS,
    ProgressCallback, TEXTURES_DIR, report, texture_progress,
};

/// A fully decoded archive, not yet installed on any canvas
#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub info: InfoRecord,
    /// Canvas size in document points
    pub size: Vec2,
    /// Elements ordered by index
    pub elements: Vec<Element>,
    pub textures: Vec<(TextureId, RgbaImage)>,
}

/// What [`ImportedDocument::install`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub elements: usize,
    pub textures_added: usize,
    /// Textures whose id was already registered; the registered image is kept
    pub textures_kept: usize,
    /// Brush names no registered brush matched; those strips draw with the default brush
    pub fallback_brushes: Vec<String>,
}

impl ImportedDocument {
    /// Install on `canvas`, replacing its document.
    ///
    /// Strips keep their brush name. Names the canvas does not know are
    /// reported and drawn with the default brush until such a brush is
    /// registered.
    pub fn install(self, canvas: &mut Canvas) -> InstallReport {
        let mut report = InstallReport {
            elements: self.elements.len(),
            ..Default::default()
        };

        for (id, image) in self.textures {
            if canvas.textures().insert_if_absent(id, image) {
                report.textures_added += 1;
            } else {
                report.textures_kept += 1;
            }
        }

        let mut unknown = BTreeSet::new();
        for element in &self.elements {
            let strips = match element {
                Element::Strip(strip) => std::slice::from_ref(strip),
                Element::Group(ElementGroup {
                    items: GroupItems::Strips(strips),
                    ..
                }) => strips.as_slice(),
                _ => &[],
            };
            for strip in strips {
                if canvas.brushes().find(&strip.brush).is_none() {
                    unknown.insert(strip.brush.clone());
                }
            }
        }
        for name in &unknown {
            warn!("Import: brush {:?} not registered, using default brush", name);
        }
        report.fallback_brushes = unknown.into_iter().collect();

        canvas.set_canvas_size([
            self.size.x.round().max(0.0) as u32,
            self.size.y.round().max(0.0) as u32,
        ]);
        canvas.load_elements(self.elements);

        info!(
            "Import installed: {} elements, {} textures added, {} brush fallbacks",
            report.elements,
            report.textures_added,
            report.fallback_brushes.len()
        );
        report
    }
}

fn read_record<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T, ArchiveError> {
    let bytes = fs::read(dir.join(name))
        .map_err(|e| ArchiveError::FileDamaged(format!("{name} record unreadable: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ArchiveError::FileDamaged(format!("{name} record invalid: {e}")))
}

/// Rebuild elements from the records; grouped records sharing an index form one group
fn build_elements(content: &ContentRecord) -> Result<Vec<Element>, ArchiveError> {
    let mut elements = Vec::new();
    let mut groups: BTreeMap<ElementIndex, GroupItems> = BTreeMap::new();

    for record in &content.line_strips {
        let strip = record.to_strip();
        if !record.grouped {
            elements.push(Element::Strip(strip));
            continue;
        }
        match groups
            .entry(record.index)
            .or_insert_with(|| GroupItems::Strips(Vec::new()))
        {
            GroupItems::Strips(strips) => strips.push(strip),
            GroupItems::Chartlets(_) => {
                return Err(ArchiveError::FileDamaged(format!(
                    "group {} mixes strips and chartlets",
                    record.index
                )));
            }
        }
    }

    for record in &content.chartlets {
        let chartlet = record.to_chartlet();
        if !record.grouped {
            elements.push(Element::Chartlet(chartlet));
            continue;
        }
        match groups
            .entry(record.index)
            .or_insert_with(|| GroupItems::Chartlets(Vec::new()))
        {
            GroupItems::Chartlets(chartlets) => chartlets.push(chartlet),
            GroupItems::Strips(_) => {
                return Err(ArchiveError::FileDamaged(format!(
                    "group {} mixes strips and chartlets",
                    record.index
                )));
            }
        }
    }

    elements.extend(
        groups
            .into_iter()
            .map(|(index, items)| Element::Group(ElementGroup { index, items })),
    );
    elements.sort_by_key(Element::index);

    if let Some(pair) = elements.windows(2).find(|w| w[0].index() == w[1].index()) {
        return Err(ArchiveError::FileDamaged(format!(
            "duplicate element index {}",
            pair[0].index()
        )));
    }
    Ok(elements)
}

/// Read and decode the archive in `dir`. Nothing is installed.
pub fn read_archive(
    dir: &Path,
    on_progress: Option<&ProgressCallback>,
) -> Result<ImportedDocument, ArchiveError> {
    let info: InfoRecord = read_record(dir, INFO_FILE)?;
    if info.version != FORMAT_VERSION {
        return Err(ArchiveError::UnsupportedVersion(info.version));
    }
    report(on_progress, INFO_PROGRESS);

    let content: ContentRecord = read_record(dir, CONTENT_FILE)?;
    report(on_progress, CONTENT_PROGRESS);

    let elements = build_elements(&content)?;
    let texture_ids: BTreeSet<TextureId> = content.chartlets.iter().map(|c| c.texture).collect();

    let mut textures = Vec::with_capacity(texture_ids.len());
    if !content.chartlets.is_empty() {
        let textures_dir = dir.join(TEXTURES_DIR);
        if !textures_dir.is_dir() {
            return Err(ArchiveError::FileDamaged(format!(
                "missing {TEXTURES_DIR} directory"
            )));
        }
        for (done, id) in texture_ids.iter().enumerate() {
            let bytes = fs::read(textures_dir.join(id.to_string())).map_err(|e| match e.kind() {
                ErrorKind::NotFound => ArchiveError::FileDamaged(format!("missing texture {id}")),
                _ => ArchiveError::Io(e),
            })?;
            let image = image::load_from_memory(&bytes)?.to_rgba8();
            debug!("read_archive: texture {} ({}x{})", id, image.width(), image.height());
            textures.push((*id, image));
            report(on_progress, texture_progress(done + 1, texture_ids.len()));
        }
    }
    report(on_progress, 1.0);

    info!(
        "Read archive {}: {} elements, {} textures",
        dir.display(),
        elements.len(),
        textures.len()
    );
    Ok(ImportedDocument {
        info,
        size: decode_point(content.size),
        elements,
        textures,
    })
}

/// Read the archive in `dir` on a blocking worker
pub async fn import(
    dir: impl Into<PathBuf>,
    on_progress: Option<ProgressCallback>,
) -> Result<ImportedDocument, ArchiveError> {
    let dir = dir.into();
    tokio::task::spawn_blocking(move || read_archive(&dir, on_progress.as_ref()))
        .await
        .map_err(|e| ArchiveError::Worker(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::export::{DocumentSnapshot, write_archive};
    use crate::test_support::{sample_canvas, scratch_dir};
    use crate::records::{ChartletRecord, SegmentRecord, StripRecord};
    use inkline_painting::{Brush, Chartlet, Color, Viewport};

    fn exported() -> (Canvas, Vec<TextureId>, PathBuf) {
        let (canvas, ids) = sample_canvas();
        let dir = scratch_dir();
        write_archive(&DocumentSnapshot::from_canvas(&canvas), &dir, None).unwrap();
        (canvas, ids, dir)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (source, ids, dir) = exported();

        let imported = import(&dir, None).await.unwrap();
        assert_eq!(imported.info.lines, 2);
        assert_eq!(imported.textures.len(), 2);
        assert_eq!(imported.elements, source.document().elements());

        let mut target = Canvas::default();
        target.register_brush(Brush::new("pen", 4.0, 2.0)).unwrap();
        let report = imported.install(&mut target);
        assert_eq!(report.elements, 4);
        assert_eq!(report.textures_added, 2);
        assert!(report.fallback_brushes.is_empty());

        assert_eq!(target.document().elements(), source.document().elements());
        assert_eq!(target.document().last_index(), source.document().last_index());
        assert_eq!(target.canvas_size(), source.canvas_size());
        assert!(target.textures().contains(ids[0]));
        assert!(!target.textures().contains(ids[2]));
        assert_eq!(
            target.textures().get(ids[1]).unwrap().image,
            source.textures().get(ids[1]).unwrap().image
        );
        assert_eq!(
            target.render(&Viewport::default()),
            source.render(&Viewport::default())
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_groups_are_rebuilt() {
        let (_, _, dir) = exported();
        let imported = read_archive(&dir, None).unwrap();

        let groups: Vec<_> = imported
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Group(group) => Some(group),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_brush_falls_back() {
        let (_, _, dir) = exported();
        let imported = read_archive(&dir, None).unwrap();

        let mut target = Canvas::default();
        let report = imported.install(&mut target);
        assert_eq!(report.fallback_brushes, vec!["pen".to_string()]);
        assert_eq!(target.document().elements().len(), 4);
        assert!(!target.render(&Viewport::default()).is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_info_is_damaged() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        let err = read_archive(&dir, None).unwrap_err();
        assert!(matches!(err, ArchiveError::FileDamaged(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unparsable_content_is_damaged() {
        let (_, _, dir) = exported();
        fs::write(dir.join(CONTENT_FILE), b"{ not json").unwrap();
        let err = read_archive(&dir, None).unwrap_err();
        assert!(matches!(err, ArchiveError::FileDamaged(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_texture_directory_is_damaged() {
        let (_, _, dir) = exported();
        fs::remove_dir_all(dir.join(TEXTURES_DIR)).unwrap();
        let err = read_archive(&dir, None).unwrap_err();
        assert!(matches!(err, ArchiveError::FileDamaged(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unsupported_version() {
        let (_, _, dir) = exported();
        let mut info: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.join(INFO_FILE)).unwrap()).unwrap();
        info["version"] = serde_json::json!("9");
        fs::write(dir.join(INFO_FILE), serde_json::to_vec(&info).unwrap()).unwrap();

        let err = read_archive(&dir, None).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedVersion(v) if v == "9"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_failed_import_leaves_canvas_untouched() {
        let (canvas, _, dir) = exported();
        fs::remove_file(dir.join(INFO_FILE)).unwrap();
        let before = canvas.document().elements().to_vec();

        assert!(import(&dir, None).await.is_err());
        assert_eq!(canvas.document().elements(), before.as_slice());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_elements_ordered_by_index() {
        let dir = scratch_dir();
        let (canvas, _) = sample_canvas();
        write_archive(&DocumentSnapshot::from_canvas(&canvas), &dir, None).unwrap();

        let imported = read_archive(&dir, None).unwrap();
        let indices: Vec<_> = imported.elements.iter().map(Element::index).collect();
        // strips and chartlets are stored in separate lists but interleave by index
        assert_eq!(indices, vec![1, 2, 3, 4]);

        let _ = fs::remove_dir_all(&dir);
    }

    fn grouped_strip(index: ElementIndex, y: i32) -> StripRecord {
        StripRecord {
            index,
            brush: "pen".to_string(),
            color: Color::BLACK,
            grouped: true,
            segments: vec![SegmentRecord {
                begin: [0, y],
                end: [50, y],
                diameter: 40,
                step: 20,
                color: None,
            }],
        }
    }

    #[test]
    fn test_grouped_strip_records_form_strip_group() {
        let content = ContentRecord {
            size: [1000, 1000],
            line_strips: vec![grouped_strip(2, 0), grouped_strip(2, 30)],
            chartlets: Vec::new(),
        };
        let elements = build_elements(&content).unwrap();
        assert_eq!(elements.len(), 1);
        let Element::Group(group) = &elements[0] else {
            panic!("expected group");
        };
        assert_eq!(group.index, 2);
        assert!(matches!(&group.items, GroupItems::Strips(strips) if strips.len() == 2));
    }

    #[test]
    fn test_group_mixing_kinds_is_damaged() {
        let chartlet = Chartlet::new(
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
            0.0,
            TextureId::new(),
        );
        let mut chartlet = ChartletRecord::from_chartlet(&chartlet, true);
        chartlet.index = 2;
        let content = ContentRecord {
            size: [1000, 1000],
            line_strips: vec![grouped_strip(2, 0)],
            chartlets: vec![chartlet],
        };
        assert!(matches!(
            build_elements(&content),
            Err(ArchiveError::FileDamaged(_))
        ));
    }

    #[test]
    fn test_import_progress() {
        let (_, _, dir) = exported();
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);
        let callback: ProgressCallback = Box::new(move |p: f32| sink.lock().unwrap().push(p));

        read_archive(&dir, Some(&callback)).unwrap();
        let values = values.lock().unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(values[..2], [INFO_PROGRESS, CONTENT_PROGRESS]);
        assert!((values[2] - 0.55).abs() < 0.001);
        assert_eq!(values.last().copied(), Some(1.0));
        assert!(values.windows(2).all(|w| w[0] <= w[1]));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_existing_texture_is_kept() {
        let (source, ids, dir) = exported();
        let imported = read_archive(&dir, None).unwrap();

        let mut target = Canvas::default();
        target
            .textures()
            .register(ids[0], source.textures().get(ids[1]).unwrap().image.clone())
            .unwrap();
        let report = imported.install(&mut target);
        assert_eq!(report.textures_added, 1);
        assert_eq!(report.textures_kept, 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
