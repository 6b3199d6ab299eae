//! Asset service boundary and path-driven texture slots.
//!
//! The asset service owns every texture loaded by path. Materials keep a
//! [`TextureSlot`] per texture field: the configured path plus the handle
//! currently bound, which may or may not have come from that path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GraphicsError;
use crate::texture::{Texture, TextureDescriptor, TextureKind};

/// Loads and releases textures by asset path.
///
/// Loads are reference counted per path: every successful
/// [`load_texture`](Self::load_texture) is paired with exactly one
/// [`unload`](Self::unload).
pub trait AssetService: Send + Sync {
    /// Load (or add a reference to) the texture stored at `path`.
    fn load_texture(&self, path: &str, kind: TextureKind) -> Result<Arc<Texture>, GraphicsError>;

    /// Release one reference to the asset at `path`.
    fn unload(&self, path: &str);
}

/// A material texture field: configured asset path plus bound texture.
///
/// The path and the bound texture are independent. Assigning a texture
/// directly leaves the path untouched, and assigning a path does not
/// replace a texture that was not loaded through the asset service.
#[derive(Debug, Clone)]
pub struct TextureSlot {
    name: &'static str,
    kind: TextureKind,
    path: Option<String>,
    texture: Option<Arc<Texture>>,
}

impl TextureSlot {
    /// Create an empty slot.
    pub fn new(name: &'static str, kind: TextureKind) -> Self {
        Self {
            name,
            kind,
            path: None,
            texture: None,
        }
    }

    /// Configure the asset path without touching the asset service.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Bind a texture directly.
    #[must_use]
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// The configured asset path, exactly as it was set.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The currently bound texture.
    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.texture.is_some()
    }

    /// Store a new path and, once an asset service is available, swap the
    /// path-owned texture for the one at the new path.
    pub fn set_path(
        &mut self,
        path: impl Into<String>,
        assets: Option<&dyn AssetService>,
    ) -> Result<(), GraphicsError> {
        self.path = Some(path.into());
        match assets {
            Some(assets) => self.refresh(assets),
            None => Ok(()),
        }
    }

    /// Bind a texture directly, bypassing path ownership.
    pub fn set_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.texture = texture;
    }

    /// Bind a texture directly, rejecting `None`.
    pub fn set_required_texture(&mut self, texture: Option<Arc<Texture>>) -> Result<(), GraphicsError> {
        let texture = texture.ok_or(GraphicsError::NullTexture(self.name))?;
        self.texture = Some(texture);
        Ok(())
    }

    /// Load the configured path unless a texture is already bound.
    pub fn load(&mut self, assets: &dyn AssetService) -> Result<(), GraphicsError> {
        if self.texture.is_some() {
            return Ok(());
        }

        let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(());
        };

        let texture = assets.load_texture(path, self.kind)?;
        log::trace!("TextureSlot {}: loaded {}", self.name, path);
        self.texture = Some(texture);
        Ok(())
    }

    /// Release the bound texture if it is owned through an asset path.
    pub fn unload(&mut self, assets: &dyn AssetService) {
        let Some(path) = self.texture.as_ref().and_then(|t| t.asset_path()) else {
            return;
        };

        log::trace!("TextureSlot {}: unloading {}", self.name, path);
        assets.unload(path);
        self.texture = None;
    }

    /// Unload the path-owned texture, then load the configured path.
    pub fn refresh(&mut self, assets: &dyn AssetService) -> Result<(), GraphicsError> {
        self.unload(assets);
        self.load(assets)
    }
}

#[derive(Debug)]
struct MemoryEntry {
    kind: TextureKind,
    texture: Option<Arc<Texture>>,
    refs: u32,
    loads: u32,
    unloads: u32,
}

/// In-memory asset service for tests and embedded assets.
///
/// Paths must be registered with [`insert`](Self::insert) before they can be
/// loaded. One texture instance is shared per path while it has live
/// references.
///
/// ```ignore
/// let assets = MemoryAssets::new();
/// assets.insert("textures/brick.png", TextureKind::Texture2D);
/// material.initialize(Arc::new(assets.clone()))?;
/// assert_eq!(assets.ref_count("textures/brick.png"), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryAssets {
    /// Create an empty asset store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture asset at `path`.
    pub fn insert(&self, path: impl Into<String>, kind: TextureKind) {
        self.entries.write().insert(
            path.into(),
            MemoryEntry {
                kind,
                texture: None,
                refs: 0,
                loads: 0,
                unloads: 0,
            },
        );
    }

    /// Number of live references to `path`.
    pub fn ref_count(&self, path: &str) -> u32 {
        self.entries.read().get(path).map_or(0, |e| e.refs)
    }

    /// Total successful loads of `path`.
    pub fn load_count(&self, path: &str) -> u32 {
        self.entries.read().get(path).map_or(0, |e| e.loads)
    }

    /// Total unloads of `path`.
    pub fn unload_count(&self, path: &str) -> u32 {
        self.entries.read().get(path).map_or(0, |e| e.unloads)
    }
}

impl AssetService for MemoryAssets {
    fn load_texture(&self, path: &str, kind: TextureKind) -> Result<Arc<Texture>, GraphicsError> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(path)
            .ok_or_else(|| GraphicsError::AssetLoadFailed {
                path: path.to_string(),
                reason: "not found".to_string(),
            })?;

        if entry.kind != kind {
            return Err(GraphicsError::AssetLoadFailed {
                path: path.to_string(),
                reason: format!("expected {kind:?}, found {:?}", entry.kind),
            });
        }

        let texture = entry
            .texture
            .get_or_insert_with(|| {
                Texture::new(TextureDescriptor::from_asset(kind, path).with_label(path))
            })
            .clone();
        entry.refs += 1;
        entry.loads += 1;
        Ok(texture)
    }

    fn unload(&self, path: &str) {
        let mut entries = self.entries.write();
        match entries.get_mut(path) {
            Some(entry) if entry.refs > 0 => {
                entry.refs -= 1;
                entry.unloads += 1;
                if entry.refs == 0 {
                    entry.texture = None;
                }
            }
            _ => log::warn!("MemoryAssets: unload of {path} without a live reference"),
        }
    }
}
