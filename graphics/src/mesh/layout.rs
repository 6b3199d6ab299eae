//! Interleaved vertex layouts.
//!
//! A technique row names the vertex format its vertex stage reads. Each
//! format resolves to one static [`VertexLayout`], so rows compare layouts by
//! reference and meshes are checked against them with
//! [`VertexLayout::is_satisfied_by`].
//!
//! ```ignore
//! let layout = VertexLayout::new(20)
//!     .with_attribute(VertexAttribute::position(0))
//!     .with_attribute(VertexAttribute::texcoord0(12))
//!     .with_label("VertexPositionTexture");
//! ```

/// What a vertex attribute feeds in the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexAttributeSemantic {
    /// Vertex position (float3).
    Position,
    /// Vertex normal (float3).
    Normal,
    /// Vertex binormal (float3), used by normal mapping.
    Binormal,
    /// Vertex tangent (float3).
    Tangent,
    /// Vertex color (unorm4).
    Color,
    /// Texture coordinates set 0 (float2).
    TexCoord0,
    /// Texture coordinates set 1 (float2), used by lightmaps and dual textures.
    TexCoord1,
}

/// Storage format of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Four 8-bit unsigned integers (normalized to 0.0-1.0).
    Unorm8x4,
}

impl VertexAttributeFormat {
    /// Size in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::Unorm8x4 => 4,
        }
    }
}

/// One attribute at a byte offset inside the vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub semantic: VertexAttributeSemantic,
    pub format: VertexAttributeFormat,
    pub offset: u32,
}

impl VertexAttribute {
    pub fn new(semantic: VertexAttributeSemantic, format: VertexAttributeFormat, offset: u32) -> Self {
        Self {
            semantic,
            format,
            offset,
        }
    }

    /// Position attribute (float3).
    pub fn position(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::Position, VertexAttributeFormat::Float3, offset)
    }

    /// Normal attribute (float3).
    pub fn normal(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::Normal, VertexAttributeFormat::Float3, offset)
    }

    /// Binormal attribute (float3).
    pub fn binormal(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::Binormal, VertexAttributeFormat::Float3, offset)
    }

    /// Tangent attribute (float3).
    pub fn tangent(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::Tangent, VertexAttributeFormat::Float3, offset)
    }

    /// Packed color attribute (unorm8x4).
    pub fn color(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::Color, VertexAttributeFormat::Unorm8x4, offset)
    }

    /// First texture coordinate set (float2).
    pub fn texcoord0(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::TexCoord0, VertexAttributeFormat::Float2, offset)
    }

    /// Second texture coordinate set (float2).
    pub fn texcoord1(offset: u32) -> Self {
        Self::new(VertexAttributeSemantic::TexCoord1, VertexAttributeFormat::Float2, offset)
    }

    /// First byte past the end of this attribute.
    pub fn end(&self) -> u32 {
        self.offset + self.format.size()
    }
}

/// Interleaved single-buffer vertex layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u32,
    /// Attributes in declaration order.
    pub attributes: Vec<VertexAttribute>,
    /// Vertex format name, for diagnostics.
    pub label: Option<String>,
}

impl VertexLayout {
    /// Create an empty layout with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
            label: None,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether any attribute carries `semantic`.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes.iter().any(|attr| attr.semantic == semantic)
    }

    pub fn attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|attr| attr.semantic == semantic)
    }

    /// Iterate the semantics of this layout in declaration order.
    pub fn semantics(&self) -> impl Iterator<Item = VertexAttributeSemantic> + '_ {
        self.attributes.iter().map(|attr| attr.semantic)
    }

    /// Whether a mesh with `provided` layout carries every attribute this
    /// layout reads.
    pub fn is_satisfied_by(&self, provided: &VertexLayout) -> bool {
        self.semantics().all(|s| provided.has_semantic(s))
    }

    /// All attributes fit inside the stride without overlapping.
    pub fn validate(&self) -> bool {
        let mut spans: Vec<(u32, u32)> = self
            .attributes
            .iter()
            .map(|attr| (attr.offset, attr.end()))
            .collect();
        spans.sort_unstable();

        spans.iter().all(|&(_, end)| end <= self.stride)
            && spans.windows(2).all(|pair| pair[0].1 <= pair[1].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sizes() {
        assert_eq!(VertexAttributeFormat::Float2.size(), 8);
        assert_eq!(VertexAttributeFormat::Float3.size(), 12);
        assert_eq!(VertexAttributeFormat::Float4.size(), 16);
        assert_eq!(VertexAttributeFormat::Unorm8x4.size(), 4);
    }

    #[test]
    fn test_semantic_lookup() {
        let layout = VertexLayout::new(24)
            .with_attribute(VertexAttribute::position(0))
            .with_attribute(VertexAttribute::normal(12));

        assert!(layout.has_semantic(VertexAttributeSemantic::Normal));
        assert!(!layout.has_semantic(VertexAttributeSemantic::Color));
        assert_eq!(
            layout.attribute(VertexAttributeSemantic::Normal).map(|a| a.offset),
            Some(12)
        );
    }

    #[test]
    fn test_is_satisfied_by_superset() {
        let needs = VertexLayout::new(12).with_attribute(VertexAttribute::position(0));
        let mesh = VertexLayout::new(20)
            .with_attribute(VertexAttribute::position(0))
            .with_attribute(VertexAttribute::texcoord0(12));

        assert!(needs.is_satisfied_by(&mesh));
        assert!(!mesh.is_satisfied_by(&needs));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let layout = VertexLayout::new(24)
            .with_attribute(VertexAttribute::position(0))
            .with_attribute(VertexAttribute::normal(8));
        assert!(!layout.validate());
    }

    #[test]
    fn test_validate_rejects_overflowing_stride() {
        let layout = VertexLayout::new(16)
            .with_attribute(VertexAttribute::position(0))
            .with_attribute(VertexAttribute::texcoord0(12));
        assert!(!layout.validate());
    }

    #[test]
    fn test_validate_allows_gaps() {
        let layout = VertexLayout::new(32)
            .with_attribute(VertexAttribute::position(0))
            .with_attribute(VertexAttribute::texcoord0(16))
            .with_attribute(VertexAttribute::texcoord1(24));
        assert!(layout.validate());
    }
}
