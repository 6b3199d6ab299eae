//! Two-texture material.
//!
//! Samples a first and a second texture with independent texture
//! coordinates and combines them according to a [`DualTextureMode`].

use std::sync::Arc;

use bitflags::bitflags;
use static_assertions::assert_impl_all;
use verdant_core::Color;
use verdant_core::math::{Vec2, vec2_to_array};

use crate::assets::{AssetService, TextureSlot};
use crate::error::GraphicsError;
use crate::mesh::VertexFormat;
use crate::shader::ShaderEntry;
use crate::technique::key::{flags_count, flags_name, flags_parse};
use crate::technique::{
    RenderPass, ShaderCompiler, TechniqueKey, TechniqueRegistry, TechniqueRow, TechniqueTable,
};
use crate::texture::{Texture, TextureKind};

use super::params::{DUAL_LAYOUT, DualParameters, GBufferParameters};
use super::{DrawContext, Material, gbuffer_rows, gbuffer_target};

/// How the two textures of a [`DualMaterial`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DualTextureMode {
    /// The second texture is a lightmap for the first.
    Lightmap,
    /// Texels are multiplied.
    #[default]
    Multiplicative,
    /// Texels are added.
    Additive,
    /// The second texture's alpha masks the first.
    Mask,
}

impl DualTextureMode {
    fn feature(self) -> DualFeatures {
        match self {
            Self::Multiplicative => DualFeatures::MULTIPLICATIVE,
            Self::Additive => DualFeatures::ADDITIVE,
            Self::Mask => DualFeatures::MASK,
            Self::Lightmap => DualFeatures::LIGHTMAP,
        }
    }
}

bitflags! {
    /// Features selecting a [`DualMaterial`] technique.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DualFeatures: u16 {
        const LIGHTING = 1 << 0;
        const FIRST = 1 << 1;
        const SECOND = 1 << 2;
        const MULTIPLICATIVE = 1 << 3;
        const ADDITIVE = 1 << 4;
        const MASK = 1 << 5;
        const LIGHTMAP = 1 << 6;
        const GBUFFER = 1 << 7;
        const DEPTH = 1 << 8;
        const MRT = 1 << 9;
        const NORMAL = 1 << 10;
    }
}

const TOKENS: &[(DualFeatures, &str)] = &[
    (DualFeatures::LIGHTING, "L"),
    (DualFeatures::FIRST, "F"),
    (DualFeatures::SECOND, "S"),
    (DualFeatures::MULTIPLICATIVE, "M"),
    (DualFeatures::ADDITIVE, "A"),
    (DualFeatures::MASK, "K"),
    (DualFeatures::LIGHTMAP, "I"),
    (DualFeatures::GBUFFER, "G"),
    (DualFeatures::DEPTH, "D"),
    (DualFeatures::MRT, "R"),
    (DualFeatures::NORMAL, "N"),
];

const MODE_FEATURES: DualFeatures = DualFeatures::MULTIPLICATIVE
    .union(DualFeatures::ADDITIVE)
    .union(DualFeatures::MASK)
    .union(DualFeatures::LIGHTMAP);

const GBUFFER_FEATURES: DualFeatures = DualFeatures::GBUFFER
    .union(DualFeatures::DEPTH)
    .union(DualFeatures::MRT)
    .union(DualFeatures::NORMAL);

impl TechniqueKey for DualFeatures {
    fn canonical_name(&self) -> String {
        flags_name(*self, TOKENS, "None")
    }

    fn parse(name: &str) -> Option<Self> {
        flags_parse(name, TOKENS, "None")
    }

    fn is_subset_of(&self, other: &Self) -> bool {
        other.contains(*self)
    }

    fn feature_count(&self) -> u32 {
        flags_count(*self, TOKENS)
    }

    fn is_well_formed(&self) -> bool {
        if self.contains(Self::GBUFFER) {
            return GBUFFER_FEATURES.contains(*self) && !self.contains(Self::DEPTH | Self::MRT);
        }
        if self.intersects(GBUFFER_FEATURES) {
            return false;
        }

        let modes = self.intersection(MODE_FEATURES).bits().count_ones();
        let both = self.contains(Self::FIRST | Self::SECOND);
        if both { modes == 1 } else { modes == 0 }
    }
}

const FORWARD_KEYS: &[&str] = &[
    "None", "F", "S", "FSM", "FSA", "FSK", "FSI", "L", "LF", "LS", "LFSM", "LFSA", "LFSK", "LFSI",
];

const FRAGMENT_DEFINES: &[(DualFeatures, &str)] = &[
    (DualFeatures::LIGHTING, "LIT"),
    (DualFeatures::FIRST, "FIRST"),
    (DualFeatures::SECOND, "SECON"),
    (DualFeatures::MULTIPLICATIVE, "MUL"),
    (DualFeatures::ADDITIVE, "ADD"),
    (DualFeatures::MASK, "MSK"),
    (DualFeatures::LIGHTMAP, "LMAP"),
];

const VS: ShaderEntry = ShaderEntry::new("DualMaterial", "vsDualMaterial");
const PS: ShaderEntry = ShaderEntry::new("DualMaterial", "psDualMaterial");

fn forward_row(name: &'static str) -> TechniqueRow {
    let features = DualFeatures::parse(name).unwrap_or(DualFeatures::empty());

    TechniqueRow::new(name, VS, PS, VertexFormat::PositionDualTexture)
        .with_fragment_defines(
            FRAGMENT_DEFINES
                .iter()
                .filter(|(flag, _)| features.contains(*flag))
                .map(|(_, define)| *define),
        )
        .with_parameters(DUAL_LAYOUT)
}

static TECHNIQUES: TechniqueRegistry<DualFeatures> =
    TechniqueRegistry::new("DualMaterial", DualMaterial::technique_rows);

assert_impl_all!(TechniqueTable<DualFeatures>: Send, Sync);

/// Material blending two textures.
///
/// Defaults: multiplicative mode, white diffuse (opaque), black ambient,
/// specular power 64, lighting enabled.
///
/// Forward pass binds texture1 to slot 0, texture2 to slot 1 and the camera
/// lighting target to slot 2. The G-buffer pass binds the normal map to
/// slot 0 and uses the first texture offset.
pub struct DualMaterial {
    techniques: &'static TechniqueTable<DualFeatures>,
    assets: Option<Arc<dyn AssetService>>,

    pub mode: DualTextureMode,
    pub diffuse_color: Color,
    pub ambient_color: Color,
    pub specular_power: f32,
    pub lighting_enabled: bool,
    pub texture_offset1: Vec2,
    pub texture_offset2: Vec2,

    texture1: TextureSlot,
    texture2: TextureSlot,
    normal: TextureSlot,
    lighting_texture: Option<Arc<Texture>>,

    pass: RenderPass,
    forward: DualParameters,
    gbuffer: GBufferParameters,
}

impl DualMaterial {
    pub fn new(compiler: &dyn ShaderCompiler) -> Result<Self, GraphicsError> {
        Self::with_table(Self::techniques()?, compiler)
    }

    pub fn with_table(
        techniques: &'static TechniqueTable<DualFeatures>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        techniques.prepare_default(compiler)?;

        Ok(Self {
            techniques,
            assets: None,
            mode: DualTextureMode::Multiplicative,
            diffuse_color: Color::WHITE,
            ambient_color: Color::BLACK,
            specular_power: 64.0,
            lighting_enabled: true,
            texture_offset1: Vec2::zeros(),
            texture_offset2: Vec2::zeros(),
            texture1: TextureSlot::new("texture1", TextureKind::Texture2D),
            texture2: TextureSlot::new("texture2", TextureKind::Texture2D),
            normal: TextureSlot::new("normal", TextureKind::Texture2D),
            lighting_texture: None,
            pass: RenderPass::Forward,
            forward: DualParameters::default(),
            gbuffer: GBufferParameters::default(),
        })
    }

    pub fn techniques() -> Result<&'static TechniqueTable<DualFeatures>, GraphicsError> {
        TECHNIQUES.table()
    }

    pub fn technique_rows() -> Vec<TechniqueRow> {
        FORWARD_KEYS
            .iter()
            .map(|name| forward_row(name))
            .chain(gbuffer_rows())
            .collect()
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DualTextureMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_paths(
        mut self,
        texture1: Option<&str>,
        texture2: Option<&str>,
        normal: Option<&str>,
    ) -> Self {
        if let Some(path) = texture1 {
            self.texture1 = self.texture1.with_path(path);
        }
        if let Some(path) = texture2 {
            self.texture2 = self.texture2.with_path(path);
        }
        if let Some(path) = normal {
            self.normal = self.normal.with_path(path);
        }
        self
    }

    texture_slot_accessors!(required texture1, texture1_path, set_texture1_path, set_texture1);
    texture_slot_accessors!(required texture2, texture2_path, set_texture2_path, set_texture2);
    texture_slot_accessors!(required normal, normal_path, set_normal_path, set_normal);

    pub fn lighting_texture(&self) -> Option<&Arc<Texture>> {
        self.lighting_texture.as_ref()
    }

    /// Feature set for the current state and draw.
    pub fn features(&self, ctx: &DrawContext<'_>) -> DualFeatures {
        let mut features = DualFeatures::empty();

        match ctx.pass {
            RenderPass::GBuffer => {
                let (depth, mrt) = gbuffer_target(ctx);
                features |= DualFeatures::GBUFFER;
                features.set(DualFeatures::DEPTH, depth);
                features.set(DualFeatures::MRT, mrt);
                features.set(DualFeatures::NORMAL, self.normal.is_bound());
            }
            RenderPass::Forward => {
                let first = self.texture1.is_bound();
                let second = self.texture2.is_bound();
                features.set(DualFeatures::LIGHTING, self.lighting_enabled);
                features.set(DualFeatures::FIRST, first);
                features.set(DualFeatures::SECOND, second);
                if first && second {
                    features |= self.mode.feature();
                }
            }
        }

        features
    }
}

impl Material for DualMaterial {
    fn name(&self) -> &'static str {
        self.techniques.name()
    }

    fn initialize(&mut self, assets: Arc<dyn AssetService>) -> Result<(), GraphicsError> {
        self.texture1.load(assets.as_ref())?;
        self.texture2.load(assets.as_ref())?;
        self.normal.load(assets.as_ref())?;
        self.assets = Some(assets);
        Ok(())
    }

    fn current_technique(&self, ctx: &DrawContext<'_>) -> Result<&'static str, GraphicsError> {
        let techniques = self.techniques;
        Ok(techniques.select(self.features(ctx), ctx.compiler)?.name())
    }

    fn set_parameters(&mut self, ctx: &DrawContext<'_>, _cached: bool) {
        self.pass = ctx.pass;
        let device = ctx.device;

        match ctx.pass {
            RenderPass::Forward => {
                self.forward.diffuse_color = self.diffuse_color.to_array4();
                self.forward.ambient_color = self.ambient_color.to_array3();
                self.forward.tex_coord_fix = ctx.tex_coord_fix();
                self.forward.texture_offset1 = vec2_to_array(self.texture_offset1);
                self.forward.texture_offset2 = vec2_to_array(self.texture_offset2);

                self.lighting_texture = ctx.camera.lighting_target.clone();
                if let Some(texture) = &self.lighting_texture {
                    device.set_texture(texture, 2);
                }
                if let Some(texture) = self.texture1.texture() {
                    device.set_texture(texture, 0);
                }
                if let Some(texture) = self.texture2.texture() {
                    device.set_texture(texture, 1);
                }
            }
            RenderPass::GBuffer => {
                self.gbuffer.specular_power = self.specular_power;
                self.gbuffer.texture_offset = vec2_to_array(self.texture_offset1);

                if let Some(texture) = self.normal.texture() {
                    device.set_texture(texture, 0);
                }
            }
        }

        log::trace!("DualMaterial: {:?} parameters set", ctx.pass);
    }

    fn parameters(&self) -> &[u8] {
        match self.pass {
            RenderPass::Forward => bytemuck::bytes_of(&self.forward),
            RenderPass::GBuffer => bytemuck::bytes_of(&self.gbuffer),
        }
    }

    fn requires_deferred_pass(&self, pass: RenderPass) -> bool {
        match pass {
            RenderPass::GBuffer => self.lighting_enabled,
            RenderPass::Forward => true,
        }
    }
}

impl std::fmt::Debug for DualMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualMaterial")
            .field("mode", &self.mode)
            .field("lighting_enabled", &self.lighting_enabled)
            .field("texture1", &self.texture1)
            .field("texture2", &self.texture2)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::device::DummyDevice;
    use crate::materials::CameraState;
    use crate::technique::{DummyShaderCompiler, TechniqueConfig};
    use crate::texture::TextureDescriptor;

    fn table() -> &'static TechniqueTable<DualFeatures> {
        let table = TechniqueTable::build(
            "DualMaterial",
            DualMaterial::technique_rows(),
            TechniqueConfig::default(),
        )
        .unwrap();
        Box::leak(Box::new(table))
    }

    fn texture() -> Arc<Texture> {
        Texture::new(TextureDescriptor::new(TextureKind::Texture2D))
    }

    #[test]
    fn test_table_is_valid() {
        let table = table();
        assert_eq!(table.len(), 20);
        assert_eq!(table.default_row().name(), "None");
        assert_eq!(
            table.by_name("LFSI").unwrap().fragment_defines(),
            ["LIT", "FIRST", "SECON", "LMAP"]
        );
    }

    #[test]
    fn test_mode_token_requires_both_textures() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera);
        let mut material = DualMaterial::with_table(table(), &compiler)
            .unwrap()
            .with_mode(DualTextureMode::Mask);
        material.lighting_enabled = false;

        assert_eq!(material.current_technique(&ctx).unwrap(), "None");

        material.set_texture1(Some(texture())).unwrap();
        assert_eq!(material.current_technique(&ctx).unwrap(), "F");

        material.set_texture2(Some(texture())).unwrap();
        assert_eq!(material.current_technique(&ctx).unwrap(), "FSK");

        material.mode = DualTextureMode::Lightmap;
        material.lighting_enabled = true;
        assert_eq!(material.current_technique(&ctx).unwrap(), "LFSI");
    }

    #[test]
    fn test_required_textures_reject_none() {
        let compiler = DummyShaderCompiler::new();
        let mut material = DualMaterial::with_table(table(), &compiler).unwrap();
        material.set_texture1(Some(texture())).unwrap();

        assert_eq!(
            material.set_texture1(None),
            Err(GraphicsError::NullTexture("texture1"))
        );
        assert!(material.texture1().is_some());
        assert!(material.set_texture2(None).is_err());
        assert!(material.set_normal(None).is_err());
    }

    #[test]
    fn test_forward_slots_and_parameters() {
        let device = DummyDevice::new();
        device.set_render_target_active(true);
        let compiler = DummyShaderCompiler::new();
        let lighting = texture();
        let camera = CameraState::default().with_lighting_target(lighting.clone());
        let ctx = DrawContext::new(&device, &compiler, &camera);

        let mut material = DualMaterial::with_table(table(), &compiler).unwrap();
        let first = texture();
        let second = texture();
        material.set_texture1(Some(first.clone())).unwrap();
        material.set_texture2(Some(second.clone())).unwrap();
        material.diffuse_color = Color::new(1.0, 0.5, 0.25, 0.5);
        material.texture_offset2 = Vec2::new(0.0, 1.0);
        material.set_parameters(&ctx, false);

        assert!(Arc::ptr_eq(&device.bound_at(0).unwrap(), &first));
        assert!(Arc::ptr_eq(&device.bound_at(1).unwrap(), &second));
        assert!(Arc::ptr_eq(&device.bound_at(2).unwrap(), &lighting));

        let params: DualParameters = bytemuck::pod_read_unaligned(material.parameters());
        assert_eq!(params.diffuse_color, [1.0, 0.5, 0.25, 0.5]);
        assert_eq!(params.tex_coord_fix, 1.0);
        assert_eq!(params.texture_offset2, [0.0, 1.0]);
    }

    #[test]
    fn test_gbuffer_uses_first_offset() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera).with_pass(RenderPass::GBuffer);

        let mut material = DualMaterial::with_table(table(), &compiler).unwrap();
        material.texture_offset1 = Vec2::new(0.25, 0.75);
        material.set_parameters(&ctx, false);

        let params: GBufferParameters = bytemuck::pod_read_unaligned(material.parameters());
        assert_eq!(params.specular_power, 64.0);
        assert_eq!(params.texture_offset, [0.25, 0.75]);
        assert_eq!(material.current_technique(&ctx).unwrap(), "G");
    }

    #[test]
    fn test_requires_deferred_pass() {
        let compiler = DummyShaderCompiler::new();
        let mut material = DualMaterial::with_table(table(), &compiler).unwrap();
        assert!(material.requires_deferred_pass(RenderPass::GBuffer));
        material.lighting_enabled = false;
        assert!(!material.requires_deferred_pass(RenderPass::GBuffer));
        assert!(material.requires_deferred_pass(RenderPass::Forward));
    }
}
