//! Texture handles shared between the asset service and materials.

use std::sync::Arc;

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    /// Regular 2D texture.
    #[default]
    Texture2D,
    /// Six-faced cube map.
    Cube,
}

/// Describes a texture handed out by an asset service or a render target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextureDescriptor {
    /// Texture dimensionality.
    pub kind: TextureKind,
    /// Asset path the texture was loaded from, if it came from the asset service.
    pub asset_path: Option<String>,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl TextureDescriptor {
    /// Descriptor for a texture that is not owned by the asset service.
    pub fn new(kind: TextureKind) -> Self {
        Self {
            kind,
            asset_path: None,
            label: None,
        }
    }

    /// Descriptor for a texture loaded from `path`.
    pub fn from_asset(kind: TextureKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            asset_path: Some(path.into()),
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A texture resource.
///
/// Materials only ever hold `Arc<Texture>`; the asset service or the render
/// target owner decides when the underlying resource goes away.
#[derive(Debug)]
pub struct Texture {
    descriptor: TextureDescriptor,
}

impl Texture {
    /// Create a new shared texture.
    pub fn new(descriptor: TextureDescriptor) -> Arc<Self> {
        Arc::new(Self { descriptor })
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the texture kind.
    pub fn kind(&self) -> TextureKind {
        self.descriptor.kind
    }

    /// Asset path, if the texture is owned through the asset service.
    ///
    /// Empty paths are reported as `None`.
    pub fn asset_path(&self) -> Option<&str> {
        self.descriptor.asset_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_asset_path_is_not_owned() {
        let texture = Texture::new(TextureDescriptor::from_asset(TextureKind::Texture2D, ""));
        assert_eq!(texture.asset_path(), None);
    }

    #[test]
    fn test_descriptor_accessors() {
        let texture = Texture::new(
            TextureDescriptor::from_asset(TextureKind::Cube, "sky/day.dds").with_label("sky"),
        );
        assert_eq!(texture.kind(), TextureKind::Cube);
        assert_eq!(texture.asset_path(), Some("sky/day.dds"));
        assert_eq!(texture.label(), Some("sky"));
    }
}
