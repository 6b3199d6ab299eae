//! # Verdant Graphics
//!
//! Shader variant selection and parameter blocks for the Verdant materials.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`TechniqueTable`] - Per-material table of shader variants keyed by feature flags,
//!   compiled lazily on first use
//! - [`Material`] - The five materials: [`StandardMaterial`], [`ForwardMaterial`],
//!   [`DualMaterial`], [`EnvironmentMaterial`] and [`SkyboxMaterial`]
//! - [`AssetService`] / [`TextureSlot`] - Path-driven texture loading
//! - [`GraphicsDevice`] / [`ShaderCompiler`] - Seams to the renderer, with dummy
//!   implementations for testing
//!
//! ## Example
//!
//! ```ignore
//! use verdant_graphics::{CameraState, DrawContext, Material, StandardMaterial};
//!
//! let mut material = StandardMaterial::new(&compiler)?
//!     .with_paths(Some("textures/brick.png"), None, None, None, None);
//! material.initialize(assets.clone())?;
//!
//! let ctx = DrawContext::new(&device, &compiler, &camera);
//! let technique = material.current_technique(&ctx)?;
//! material.set_parameters(&ctx, false);
//! ```

pub mod assets;
pub mod device;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod profiling;
pub mod shader;
pub mod technique;
pub mod texture;

// Re-export main types for convenience
pub use assets::{AssetService, MemoryAssets, TextureSlot};
#[cfg(feature = "dummy")]
pub use device::{DummyDevice, TextureBinding};
pub use device::{GraphicsDevice, RenderTargetCapabilities};
pub use error::GraphicsError;
pub use materials::{
    CameraState, DrawContext, DualFeatures, DualMaterial, DualTextureMode, EnvironmentFeatures,
    EnvironmentMaterial, ForwardFeatures, ForwardMaterial, Material, SkyboxKey, SkyboxMaterial,
    StandardFeatures, StandardMaterial,
};
pub use mesh::{VertexFormat, VertexLayout};
pub use shader::{ShaderEntry, ShaderStage};
#[cfg(feature = "dummy")]
pub use technique::DummyShaderCompiler;
pub use technique::{
    CompileRequest, CompiledProgram, MissPolicy, ParameterLayout, RenderPass, ShaderCompiler,
    TechniqueConfig, TechniqueDescriptor, TechniqueKey, TechniqueRow, TechniqueTable,
};
pub use texture::{Texture, TextureDescriptor, TextureKind};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the graphics version once at startup.
pub fn init() {
    verdant_core::init();
    log::info!("Verdant Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_shared_tables_build() {
        assert_eq!(StandardMaterial::techniques().unwrap().name(), "StandardMaterial");
        assert_eq!(ForwardMaterial::techniques().unwrap().len(), 60);
        assert_eq!(DualMaterial::techniques().unwrap().default_row().name(), "None");
        assert_eq!(EnvironmentMaterial::techniques().unwrap().default_row().name(), "Simple");
        assert_eq!(SkyboxMaterial::techniques().unwrap().len(), 1);
    }
}
