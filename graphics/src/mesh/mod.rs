//! Vertex layouts and the well-known vertex formats.

mod formats;
mod layout;

pub use formats::{
    VertexFormat, VertexNormalMapping, VertexNormalMappingLightmap, VertexPositionDualTexture,
};
pub use layout::{VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexLayout};
