//! Cube map background.

use std::sync::Arc;

use crate::assets::{AssetService, TextureSlot};
use crate::error::GraphicsError;
use crate::mesh::VertexFormat;
use crate::shader::ShaderEntry;
use crate::technique::{
    RenderPass, ShaderCompiler, TechniqueKey, TechniqueRegistry, TechniqueRow, TechniqueTable,
};
use crate::texture::{Texture, TextureKind};

use super::{DrawContext, Material};

/// The only key of the skybox table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SkyboxKey;

impl TechniqueKey for SkyboxKey {
    fn canonical_name(&self) -> String {
        "Skybox".to_string()
    }

    fn parse(name: &str) -> Option<Self> {
        (name == "Skybox").then_some(SkyboxKey)
    }

    fn is_subset_of(&self, _other: &Self) -> bool {
        true
    }

    fn feature_count(&self) -> u32 {
        0
    }
}

static TECHNIQUES: TechniqueRegistry<SkyboxKey> =
    TechniqueRegistry::new("SkyboxMaterial", SkyboxMaterial::technique_rows);

/// Draws an environment cube map behind the scene.
///
/// Binds the map to slot 0 in the forward pass and never takes part in the
/// G-buffer pass.
pub struct SkyboxMaterial {
    techniques: &'static TechniqueTable<SkyboxKey>,
    assets: Option<Arc<dyn AssetService>>,
    environment_map: TextureSlot,
}

impl SkyboxMaterial {
    /// Skybox loading its cube map from `path` on [`Material::initialize`].
    pub fn from_path(
        path: impl Into<String>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        let mut material = Self::with_table(Self::techniques()?, compiler)?;
        material.environment_map = material.environment_map.with_path(path);
        Ok(material)
    }

    /// Skybox drawing an already loaded cube map.
    pub fn from_texture(
        environment_map: Arc<Texture>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        let mut material = Self::with_table(Self::techniques()?, compiler)?;
        material.environment_map = material.environment_map.with_texture(environment_map);
        Ok(material)
    }

    pub fn with_table(
        techniques: &'static TechniqueTable<SkyboxKey>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        techniques.prepare_default(compiler)?;

        Ok(Self {
            techniques,
            assets: None,
            environment_map: TextureSlot::new("environment_map", TextureKind::Cube),
        })
    }

    pub fn techniques() -> Result<&'static TechniqueTable<SkyboxKey>, GraphicsError> {
        TECHNIQUES.table()
    }

    pub fn technique_rows() -> Vec<TechniqueRow> {
        vec![TechniqueRow::new(
            "Skybox",
            ShaderEntry::new("SkyboxEffect", "vsSkybox"),
            ShaderEntry::new("SkyboxEffect", "psSkybox"),
            VertexFormat::PositionTexture,
        )]
    }

    pub fn environment_map(&self) -> Option<&Arc<Texture>> {
        self.environment_map.texture()
    }

    pub fn environment_map_path(&self) -> Option<&str> {
        self.environment_map.path()
    }

    /// Release the cube map if it was loaded by path.
    ///
    /// A directly assigned map is kept.
    pub fn unload(&mut self) -> Result<(), GraphicsError> {
        let assets = self
            .assets
            .as_deref()
            .ok_or(GraphicsError::NotInitialized("SkyboxMaterial"))?;
        self.environment_map.unload(assets);
        Ok(())
    }
}

impl Material for SkyboxMaterial {
    fn name(&self) -> &'static str {
        self.techniques.name()
    }

    fn initialize(&mut self, assets: Arc<dyn AssetService>) -> Result<(), GraphicsError> {
        self.environment_map.load(assets.as_ref())?;
        self.assets = Some(assets);
        Ok(())
    }

    fn current_technique(&self, ctx: &DrawContext<'_>) -> Result<&'static str, GraphicsError> {
        let techniques = self.techniques;
        Ok(techniques.select(SkyboxKey, ctx.compiler)?.name())
    }

    fn set_parameters(&mut self, ctx: &DrawContext<'_>, cached: bool) {
        if cached {
            return;
        }
        if let Some(texture) = self.environment_map.texture() {
            ctx.device.set_texture(texture, 0);
        }
    }

    fn parameters(&self) -> &[u8] {
        &[]
    }

    fn requires_deferred_pass(&self, pass: RenderPass) -> bool {
        pass == RenderPass::Forward
    }
}

impl std::fmt::Debug for SkyboxMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyboxMaterial")
            .field("environment_map", &self.environment_map)
            .field("initialized", &self.assets.is_some())
            .finish_non_exhaustive()
    }
}
