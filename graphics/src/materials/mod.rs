//! Materials and their shader variant selection.
//!
//! Every material type owns a process-wide technique table. Per draw the
//! renderer asks the material for its current technique, then lets it push
//! its parameter block and bind its textures:
//!
//! ```ignore
//! let technique = material.current_technique(&ctx)?;
//! material.set_parameters(&ctx, cached);
//! renderer.draw(technique, material.parameters());
//! ```
//!
//! - [`StandardMaterial`] - light pre-pass material with forward and G-buffer variants
//! - [`ForwardMaterial`] - single-light forward material
//! - [`DualMaterial`] - two textures combined by a [`DualTextureMode`]
//! - [`EnvironmentMaterial`] - cube map reflections with optional Fresnel term
//! - [`SkyboxMaterial`] - cube map background

use std::sync::Arc;

use crate::assets::AssetService;
use crate::error::GraphicsError;
use crate::mesh::VertexFormat;
use crate::shader::ShaderEntry;
use crate::technique::{RenderPass, TechniqueRow};

/// Accessors for a [`TextureSlot`](crate::assets::TextureSlot) field.
///
/// The `required` form rejects `None` in the texture setter.
macro_rules! texture_slot_accessors {
    ($field:ident, $path:ident, $set_path:ident, $set:ident) => {
        pub fn $field(&self) -> Option<&Arc<Texture>> {
            self.$field.texture()
        }

        pub fn $path(&self) -> Option<&str> {
            self.$field.path()
        }

        /// Set the asset path. Loads immediately once the material is initialized.
        pub fn $set_path(&mut self, path: impl Into<String>) -> Result<(), GraphicsError> {
            self.$field.set_path(path, self.assets.as_deref())
        }

        pub fn $set(&mut self, texture: Option<Arc<Texture>>) {
            self.$field.set_texture(texture);
        }
    };
    (required $field:ident, $path:ident, $set_path:ident, $set:ident) => {
        pub fn $field(&self) -> Option<&Arc<Texture>> {
            self.$field.texture()
        }

        pub fn $path(&self) -> Option<&str> {
            self.$field.path()
        }

        /// Set the asset path. Loads immediately once the material is initialized.
        pub fn $set_path(&mut self, path: impl Into<String>) -> Result<(), GraphicsError> {
            self.$field.set_path(path, self.assets.as_deref())
        }

        /// Bind a texture directly. `None` is rejected.
        pub fn $set(&mut self, texture: Option<Arc<Texture>>) -> Result<(), GraphicsError> {
            self.$field.set_required_texture(texture)
        }
    };
}

mod context;
mod dual;
mod environment;
mod forward;
pub mod params;
mod skybox;
mod standard;

pub use context::{CameraState, DrawContext};
pub use dual::{DualFeatures, DualMaterial, DualTextureMode};
pub use environment::{EnvironmentFeatures, EnvironmentMaterial};
pub use forward::{ForwardFeatures, ForwardMaterial};
pub use skybox::{SkyboxKey, SkyboxMaterial};
pub use standard::{StandardFeatures, StandardMaterial};

/// Common interface of all materials.
pub trait Material: Send + Sync {
    /// Name of the material type, also the name of its technique table.
    fn name(&self) -> &'static str;

    /// Resolve configured texture paths through `assets`.
    ///
    /// The service is kept so later path changes load immediately.
    fn initialize(&mut self, assets: Arc<dyn AssetService>) -> Result<(), GraphicsError>;

    /// Select the technique matching the current state and draw, compiling
    /// it on first use. Returns the technique's display name.
    fn current_technique(&self, ctx: &DrawContext<'_>) -> Result<&'static str, GraphicsError>;

    /// Fill the parameter block for `ctx.pass` and bind textures.
    ///
    /// `cached` is set when the renderer already issued this material's
    /// binds for the previous draw.
    fn set_parameters(&mut self, ctx: &DrawContext<'_>, cached: bool);

    /// Bytes of the block filled by the last [`set_parameters`](Self::set_parameters).
    fn parameters(&self) -> &[u8];

    /// Whether this material must be drawn in `pass`.
    fn requires_deferred_pass(&self, pass: RenderPass) -> bool;
}

const GBUFFER_VS: ShaderEntry = ShaderEntry::new("LPPGBuffer", "vsGBuffer");
const GBUFFER_PS: ShaderEntry = ShaderEntry::new("LPPGBuffer", "psGBuffer");

/// The six G-buffer rows shared by every deferred-capable material.
pub(crate) fn gbuffer_rows() -> Vec<TechniqueRow> {
    let row = |name: &'static str, target: Option<&'static str>| {
        let normal = name.ends_with('N');
        let format = if normal {
            VertexFormat::PositionNormalTangentTexture
        } else {
            VertexFormat::PositionNormal
        };
        let vertex_defines: &[&'static str] = if normal { &["NORMAL"] } else { &[] };
        let fragment_defines = vertex_defines.iter().copied().chain(target);

        TechniqueRow::new(name, GBUFFER_VS, GBUFFER_PS, format)
            .with_vertex_defines(vertex_defines.iter().copied())
            .with_fragment_defines(fragment_defines)
            .with_parameters(params::GBUFFER_LAYOUT)
    };

    vec![
        row("G", None),
        row("GN", None),
        row("GD", Some("DEPTH")),
        row("GDN", Some("DEPTH")),
        row("GR", Some("MRT")),
        row("GRN", Some("MRT")),
    ]
}

/// Which G-buffer target variant the device supports.
///
/// Depth-as-texture wins over MRT when both are available.
pub(crate) fn gbuffer_target(ctx: &DrawContext<'_>) -> (bool, bool) {
    let caps = ctx.device.capabilities();
    let depth = caps.depth_as_texture;
    (depth, !depth && caps.multiple_render_targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbuffer_rows() {
        let rows = gbuffer_rows();
        let names: Vec<&str> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, ["G", "GN", "GD", "GDN", "GR", "GRN"]);

        let gdn = &rows[3];
        assert_eq!(gdn.vertex_format, VertexFormat::PositionNormalTangentTexture);
        assert_eq!(gdn.vertex_defines, ["NORMAL"]);
        assert_eq!(gdn.fragment_defines, ["NORMAL", "DEPTH"]);

        let gr = &rows[4];
        assert_eq!(gr.vertex_format, VertexFormat::PositionNormal);
        assert!(gr.vertex_defines.is_empty());
        assert_eq!(gr.fragment_defines, ["MRT"]);
    }
}
