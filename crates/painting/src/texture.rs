//! Append-only texture registry shared between capture and background export.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Error type for texture registration.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Texture {0} is already registered")]
    Duplicate(TextureId),
}

/// Stable texture identifier. Ids are never reassigned within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureId(Uuid);

impl TextureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for TextureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A decoded RGBA texture
#[derive(Debug)]
pub struct Texture {
    pub id: TextureId,
    pub image: RgbaImage,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Thread-safe, append-only registry of textures keyed by [`TextureId`].
///
/// Cloning the registry clones the handle, not the textures. Entries are only
/// ever added, so a background export can read while capture keeps adding.
#[derive(Clone, Default)]
pub struct TextureRegistry {
    textures: Arc<RwLock<HashMap<TextureId, Arc<Texture>>>>,
}

impl fmt::Debug for TextureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureRegistry")
            .field("texture_count", &self.len())
            .finish()
    }
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) and register them under a new id
    pub fn make_texture(&self, bytes: &[u8]) -> Result<TextureId, TextureError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        let id = TextureId::new();
        self.register(id, image)?;
        Ok(id)
    }

    /// Read and decode an image file, registering it under a new id
    pub fn make_texture_from_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<TextureId, TextureError> {
        let bytes = std::fs::read(path)?;
        self.make_texture(&bytes)
    }

    /// Register an already decoded image under `id`
    pub fn register(&self, id: TextureId, image: RgbaImage) -> Result<Arc<Texture>, TextureError> {
        let mut textures = self.textures.write().expect("TextureRegistry lock poisoned");
        if textures.contains_key(&id) {
            return Err(TextureError::Duplicate(id));
        }
        debug!(
            "TextureRegistry: registered {} ({}x{})",
            id,
            image.width(),
            image.height()
        );
        let texture = Arc::new(Texture { id, image });
        textures.insert(id, Arc::clone(&texture));
        Ok(texture)
    }

    /// Register `image` unless `id` is already present, in which case the existing
    /// texture wins. Returns whether the image was inserted.
    pub fn insert_if_absent(&self, id: TextureId, image: RgbaImage) -> bool {
        match self.register(id, image) {
            Ok(_) => true,
            Err(_) => {
                warn!("TextureRegistry: {} already registered, keeping existing", id);
                false
            }
        }
    }

    pub fn get(&self, id: TextureId) -> Option<Arc<Texture>> {
        let textures = self.textures.read().expect("TextureRegistry lock poisoned");
        textures.get(&id).cloned()
    }

    pub fn contains(&self, id: TextureId) -> bool {
        let textures = self.textures.read().expect("TextureRegistry lock poisoned");
        textures.contains_key(&id)
    }

    /// All registered ids, sorted for stable iteration
    pub fn ids(&self) -> Vec<TextureId> {
        let textures = self.textures.read().expect("TextureRegistry lock poisoned");
        let mut ids: Vec<_> = textures.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.textures.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_texture_from_png() {
        let registry = TextureRegistry::new();
        let id = registry.make_texture(&png_bytes(4, 2, [255, 0, 0, 255])).unwrap();

        let texture = registry.get(id).unwrap();
        assert_eq!(texture.width(), 4);
        assert_eq!(texture.height(), 2);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_make_texture_rejects_garbage() {
        let registry = TextureRegistry::new();
        let result = registry.make_texture(b"definitely not an image");
        assert!(matches!(result, Err(TextureError::Decode(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let registry = TextureRegistry::new();
        let result = registry.make_texture_from_path("/nonexistent/brush-tip.png");
        assert!(matches!(result, Err(TextureError::Io(_))));
    }

    #[test]
    fn test_ids_are_never_replaced() {
        let registry = TextureRegistry::new();
        let id = TextureId::new();
        registry.register(id, RgbaImage::new(1, 1)).unwrap();

        assert!(matches!(
            registry.register(id, RgbaImage::new(8, 8)),
            Err(TextureError::Duplicate(_))
        ));
        assert!(!registry.insert_if_absent(id, RgbaImage::new(8, 8)));
        assert_eq!(registry.get(id).unwrap().width(), 1);
    }

    #[test]
    fn test_clone_shares_storage() {
        let registry = TextureRegistry::new();
        let handle = registry.clone();
        let id = registry.make_texture(&png_bytes(1, 1, [0, 0, 0, 255])).unwrap();
        assert!(handle.contains(id));
    }

    #[test]
    fn test_texture_id_display_parses_back() {
        let id = TextureId::new();
        assert_eq!(TextureId::parse(&id.to_string()), Some(id));
        assert_eq!(TextureId::parse("nope"), None);
    }
}
