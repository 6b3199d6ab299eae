//! Well-known vertex formats consumed by the material techniques.
//!
//! Each [`VertexFormat`] maps to one shared, lazily built [`VertexLayout`].
//! The three formats without a standard counterpart also have a `Pod`
//! vertex struct whose memory layout matches the declared attributes.

use std::sync::OnceLock;

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use super::layout::{VertexAttribute, VertexLayout};

/// Named vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Position,
    PositionColor,
    PositionTexture,
    PositionColorTexture,
    PositionNormal,
    PositionNormalColor,
    PositionNormalTexture,
    PositionNormalColorTexture,
    PositionNormalTangentTexture,
    PositionDualTexture,
    NormalMapping,
    NormalMappingLightmap,
}

impl VertexFormat {
    /// Every format, in discriminant order.
    pub const ALL: [VertexFormat; 12] = [
        Self::Position,
        Self::PositionColor,
        Self::PositionTexture,
        Self::PositionColorTexture,
        Self::PositionNormal,
        Self::PositionNormalColor,
        Self::PositionNormalTexture,
        Self::PositionNormalColorTexture,
        Self::PositionNormalTangentTexture,
        Self::PositionDualTexture,
        Self::NormalMapping,
        Self::NormalMappingLightmap,
    ];

    /// Display name of the format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "VertexPosition",
            Self::PositionColor => "VertexPositionColor",
            Self::PositionTexture => "VertexPositionTexture",
            Self::PositionColorTexture => "VertexPositionColorTexture",
            Self::PositionNormal => "VertexPositionNormal",
            Self::PositionNormalColor => "VertexPositionNormalColor",
            Self::PositionNormalTexture => "VertexPositionNormalTexture",
            Self::PositionNormalColorTexture => "VertexPositionNormalColorTexture",
            Self::PositionNormalTangentTexture => "VertexPositionNormalTangentTexture",
            Self::PositionDualTexture => "VertexPositionDualTexture",
            Self::NormalMapping => "VertexNormalMapping",
            Self::NormalMappingLightmap => "VertexNormalMappingLightMap",
        }
    }

    /// The shared layout for this format.
    pub fn layout(self) -> &'static VertexLayout {
        static LAYOUTS: OnceLock<Vec<VertexLayout>> = OnceLock::new();
        let layouts = LAYOUTS.get_or_init(|| Self::ALL.iter().map(|f| f.build()).collect());
        &layouts[self as usize]
    }

    fn build(self) -> VertexLayout {
        let layout = match self {
            Self::Position => VertexLayout::new(12).with_attribute(VertexAttribute::position(0)),
            Self::PositionColor => VertexLayout::new(16)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::color(12)),
            Self::PositionTexture => VertexLayout::new(20)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::texcoord0(12)),
            Self::PositionColorTexture => VertexLayout::new(24)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::color(12))
                .with_attribute(VertexAttribute::texcoord0(16)),
            Self::PositionNormal => VertexLayout::new(24)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12)),
            Self::PositionNormalColor => VertexLayout::new(28)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::color(24)),
            Self::PositionNormalTexture => VertexLayout::new(32)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::texcoord0(24)),
            Self::PositionNormalColorTexture => VertexLayout::new(36)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::color(24))
                .with_attribute(VertexAttribute::texcoord0(28)),
            Self::PositionNormalTangentTexture => VertexLayout::new(44)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::tangent(24))
                .with_attribute(VertexAttribute::texcoord0(36)),
            Self::PositionDualTexture => VertexLayout::new(32)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::texcoord0(16))
                .with_attribute(VertexAttribute::texcoord1(24)),
            Self::NormalMapping => VertexLayout::new(56)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::binormal(24))
                .with_attribute(VertexAttribute::tangent(36))
                .with_attribute(VertexAttribute::texcoord0(48)),
            Self::NormalMappingLightmap => VertexLayout::new(64)
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::binormal(24))
                .with_attribute(VertexAttribute::tangent(36))
                .with_attribute(VertexAttribute::texcoord0(48))
                .with_attribute(VertexAttribute::texcoord1(56)),
        };
        layout.with_label(self.name())
    }
}

/// Position with two texture coordinate sets.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexPositionDualTexture {
    pub position: [f32; 3],
    pub _padding: f32,
    pub texcoord: [f32; 2],
    pub texcoord2: [f32; 2],
}

impl VertexPositionDualTexture {
    pub fn new(position: [f32; 3], texcoord: [f32; 2], texcoord2: [f32; 2]) -> Self {
        Self {
            position,
            _padding: 0.0,
            texcoord,
            texcoord2,
        }
    }
}

/// Vertex with a full tangent frame for normal mapping.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexNormalMapping {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub binormal: [f32; 3],
    pub tangent: [f32; 3],
    pub texcoord: [f32; 2],
}

/// Normal-mapped vertex with a second texture coordinate set for a lightmap.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexNormalMappingLightmap {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub binormal: [f32; 3],
    pub tangent: [f32; 3],
    pub texcoord: [f32; 2],
    pub texcoord2: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<VertexPositionDualTexture>(), 32);
const_assert_eq!(std::mem::offset_of!(VertexPositionDualTexture, texcoord), 16);
const_assert_eq!(std::mem::offset_of!(VertexPositionDualTexture, texcoord2), 24);
const_assert_eq!(std::mem::size_of::<VertexNormalMapping>(), 56);
const_assert_eq!(std::mem::offset_of!(VertexNormalMapping, tangent), 36);
const_assert_eq!(std::mem::size_of::<VertexNormalMappingLightmap>(), 64);
const_assert_eq!(std::mem::offset_of!(VertexNormalMappingLightmap, texcoord2), 56);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexAttributeSemantic;

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (i, format) in VertexFormat::ALL.iter().enumerate() {
            assert_eq!(*format as usize, i);
        }
    }

    #[test]
    fn test_every_layout_is_valid_and_labeled() {
        for format in VertexFormat::ALL {
            let layout = format.layout();
            assert!(layout.validate(), "{} overlaps or overflows", format.name());
            assert_eq!(layout.label.as_deref(), Some(format.name()));
            assert!(layout.has_semantic(VertexAttributeSemantic::Position));
        }
    }

    #[test]
    fn test_layout_is_shared() {
        let a = VertexFormat::PositionNormal.layout();
        let b = VertexFormat::PositionNormal.layout();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_pod_structs_match_layout_strides() {
        assert_eq!(
            VertexFormat::PositionDualTexture.layout().stride as usize,
            std::mem::size_of::<VertexPositionDualTexture>()
        );
        assert_eq!(
            VertexFormat::NormalMapping.layout().stride as usize,
            std::mem::size_of::<VertexNormalMapping>()
        );
        assert_eq!(
            VertexFormat::NormalMappingLightmap.layout().stride as usize,
            std::mem::size_of::<VertexNormalMappingLightmap>()
        );
    }

    #[test]
    fn test_dual_texture_vertex_bytes() {
        let v = VertexPositionDualTexture::new([1.0, 2.0, 3.0], [0.5, 0.5], [0.25, 0.75]);
        let bytes = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[16..20], &0.5f32.to_ne_bytes());
        assert_eq!(&bytes[28..32], &0.75f32.to_ne_bytes());
    }
}
