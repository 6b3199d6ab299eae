//! Light pre-pass material.
//!
//! Drawn twice per frame: once into the G-buffer (normals, specular power)
//! and once in the forward pass, where it combines the accumulated lighting
//! with its own diffuse, emissive, specular and ambient terms.

use std::sync::Arc;

use bitflags::bitflags;
use static_assertions::assert_impl_all;
use verdant_core::Color;
use verdant_core::math::{Vec2, vec2_to_array, vec3_to_array};

use crate::assets::{AssetService, TextureSlot};
use crate::error::GraphicsError;
use crate::mesh::VertexFormat;
use crate::shader::ShaderEntry;
use crate::technique::key::{flags_count, flags_name, flags_parse};
use crate::technique::{
    RenderPass, ShaderCompiler, TechniqueKey, TechniqueRegistry, TechniqueRow, TechniqueTable,
};
use crate::texture::{Texture, TextureKind};

use super::params::{GBufferParameters, STANDARD_LAYOUT, StandardParameters};
use super::{DrawContext, Material, gbuffer_rows, gbuffer_target};

bitflags! {
    /// Features selecting a [`StandardMaterial`] technique.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StandardFeatures: u16 {
        const LIGHTING = 1 << 0;
        const AMBIENT = 1 << 1;
        const EMISSIVE = 1 << 2;
        const SPECULAR = 1 << 3;
        const DIFFUSE = 1 << 4;
        const VERTEX_COLOR = 1 << 5;
        const ALPHA_TEST = 1 << 6;
        const GBUFFER = 1 << 7;
        const DEPTH = 1 << 8;
        const MRT = 1 << 9;
        const NORMAL = 1 << 10;
    }
}

const TOKENS: &[(StandardFeatures, &str)] = &[
    (StandardFeatures::LIGHTING, "L"),
    (StandardFeatures::AMBIENT, "A"),
    (StandardFeatures::EMISSIVE, "E"),
    (StandardFeatures::SPECULAR, "S"),
    (StandardFeatures::DIFFUSE, "D"),
    (StandardFeatures::VERTEX_COLOR, "V"),
    (StandardFeatures::ALPHA_TEST, "T"),
    (StandardFeatures::GBUFFER, "G"),
    (StandardFeatures::DEPTH, "D"),
    (StandardFeatures::MRT, "R"),
    (StandardFeatures::NORMAL, "N"),
];

const GBUFFER_FEATURES: StandardFeatures = StandardFeatures::GBUFFER
    .union(StandardFeatures::DEPTH)
    .union(StandardFeatures::MRT)
    .union(StandardFeatures::NORMAL);

impl TechniqueKey for StandardFeatures {
    fn canonical_name(&self) -> String {
        flags_name(*self, TOKENS, "Simple")
    }

    fn parse(name: &str) -> Option<Self> {
        flags_parse(name, TOKENS, "Simple")
    }

    fn is_subset_of(&self, other: &Self) -> bool {
        other.contains(*self)
    }

    fn feature_count(&self) -> u32 {
        flags_count(*self, TOKENS)
    }

    fn is_well_formed(&self) -> bool {
        if self.contains(Self::GBUFFER) {
            GBUFFER_FEATURES.contains(*self) && !self.contains(Self::DEPTH | Self::MRT)
        } else {
            !self.intersects(GBUFFER_FEATURES)
        }
    }
}

/// Forward rows in declaration order.
const FORWARD_KEYS: &[&str] = &[
    "Simple", "L", "LA", "LAE", "LAES", "LAESD", "LAESDV", "LAESDVT", "LAS", "LASD", "LASDV",
    "LASDVT", "LAD", "LADV", "LADVT", "LAV", "LAVT", "LAT", "LE", "LES", "LESD", "LESDV", "LESDVT",
    "LED", "LEDV", "LEDVT", "LEV", "LEVT", "LET", "LS", "LSD", "LSDV", "LSDVT", "LSV", "LSVT",
    "LST", "LD", "LDV", "LDVT", "LDT", "LV", "LVT", "LT", "A", "AE", "AES", "AESD", "AESDV",
    "AESDVT", "AS", "ASD", "ASDV", "ASDVT", "AD", "ADV", "ADVT", "AV", "AVT", "AT", "E", "ES",
    "ESD", "ESDV", "ESDVT", "ED", "EDV", "EDVT", "EV", "EVT", "ET", "S", "SD", "SDV", "SDVT", "SV",
    "SVT", "ST", "D", "DV", "DVT", "DT", "V", "VT", "T",
];

/// Fragment define of each forward feature, in define order.
const FRAGMENT_DEFINES: &[(StandardFeatures, &str)] = &[
    (StandardFeatures::LIGHTING, "LIT"),
    (StandardFeatures::AMBIENT, "AMBI"),
    (StandardFeatures::EMISSIVE, "EMIS"),
    (StandardFeatures::SPECULAR, "SPEC"),
    (StandardFeatures::DIFFUSE, "DIFF"),
    (StandardFeatures::VERTEX_COLOR, "VCOLOR"),
    (StandardFeatures::ALPHA_TEST, "ATEST"),
];

const VS: ShaderEntry = ShaderEntry::new("StandardMaterial", "vsStandardMaterial");
const PS: ShaderEntry = ShaderEntry::new("StandardMaterial", "psStandardMaterial");

fn forward_row(name: &'static str) -> TechniqueRow {
    let features = StandardFeatures::parse(name).unwrap_or(StandardFeatures::empty());
    let vertex_color = features.contains(StandardFeatures::VERTEX_COLOR);
    let format = if vertex_color {
        VertexFormat::PositionColorTexture
    } else {
        VertexFormat::PositionTexture
    };

    TechniqueRow::new(name, VS, PS, format)
        .with_vertex_defines(vertex_color.then_some("VCOLOR"))
        .with_fragment_defines(
            FRAGMENT_DEFINES
                .iter()
                .filter(|(flag, _)| features.contains(*flag))
                .map(|(_, define)| *define),
        )
        .with_parameters(STANDARD_LAYOUT)
}

static TECHNIQUES: TechniqueRegistry<StandardFeatures> =
    TechniqueRegistry::new("StandardMaterial", StandardMaterial::technique_rows);

assert_impl_all!(TechniqueTable<StandardFeatures>: Send, Sync);

/// Light pre-pass material.
///
/// # Defaults
///
/// Alpha 1, reference alpha 0 (alpha test off), specular power 64, white
/// diffuse and emissive colors, black ambient color, lighting enabled.
///
/// # Texture slots
///
/// | Pass | Slot | Texture |
/// |---|---|---|
/// | Forward | 0 | diffuse |
/// | Forward | 1 | emissive |
/// | Forward | 2 | specular |
/// | Forward | 3 | ambient cube map |
/// | Forward | 4 | camera lighting target |
/// | Forward | 5 | camera G-buffer target 0 (with an ambient map only) |
/// | G-buffer | 0 | normal map |
pub struct StandardMaterial {
    techniques: &'static TechniqueTable<StandardFeatures>,
    assets: Option<Arc<dyn AssetService>>,

    pub alpha: f32,
    /// Alpha test threshold; values above zero enable alpha testing.
    pub reference_alpha: f32,
    pub specular_power: f32,
    pub diffuse_color: Color,
    pub emissive_color: Color,
    pub ambient_color: Color,
    pub lighting_enabled: bool,
    pub vertex_color_enabled: bool,
    pub texture_offset: Vec2,

    diffuse: TextureSlot,
    emissive: TextureSlot,
    specular: TextureSlot,
    normal: TextureSlot,
    ambient: TextureSlot,
    lighting_texture: Option<Arc<Texture>>,

    pass: RenderPass,
    forward: StandardParameters,
    gbuffer: GBufferParameters,
}

impl StandardMaterial {
    /// Create a material using the shared technique table.
    ///
    /// Compiles the default technique if no instance has done so yet.
    pub fn new(compiler: &dyn ShaderCompiler) -> Result<Self, GraphicsError> {
        Self::with_table(Self::techniques()?, compiler)
    }

    /// Create a material backed by a specific technique table.
    pub fn with_table(
        techniques: &'static TechniqueTable<StandardFeatures>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        techniques.prepare_default(compiler)?;

        Ok(Self {
            techniques,
            assets: None,
            alpha: 1.0,
            reference_alpha: 0.0,
            specular_power: 64.0,
            diffuse_color: Color::WHITE,
            emissive_color: Color::WHITE,
            ambient_color: Color::BLACK,
            lighting_enabled: true,
            vertex_color_enabled: false,
            texture_offset: Vec2::zeros(),
            diffuse: TextureSlot::new("diffuse", TextureKind::Texture2D),
            emissive: TextureSlot::new("emissive", TextureKind::Texture2D),
            specular: TextureSlot::new("specular", TextureKind::Texture2D),
            normal: TextureSlot::new("normal", TextureKind::Texture2D),
            ambient: TextureSlot::new("ambient", TextureKind::Cube),
            lighting_texture: None,
            pass: RenderPass::Forward,
            forward: StandardParameters::default(),
            gbuffer: GBufferParameters::default(),
        })
    }

    /// The shared technique table of this material type.
    pub fn techniques() -> Result<&'static TechniqueTable<StandardFeatures>, GraphicsError> {
        TECHNIQUES.table()
    }

    /// Every technique row, forward rows first, then the G-buffer rows.
    pub fn technique_rows() -> Vec<TechniqueRow> {
        FORWARD_KEYS
            .iter()
            .map(|name| forward_row(name))
            .chain(gbuffer_rows())
            .collect()
    }

    #[must_use]
    pub fn with_diffuse_color(mut self, color: Color) -> Self {
        self.diffuse_color = color;
        self
    }

    /// Configure texture paths, resolved by [`Material::initialize`].
    /// `None` leaves a slot unconfigured.
    #[must_use]
    pub fn with_paths(
        mut self,
        diffuse: Option<&str>,
        normal: Option<&str>,
        specular: Option<&str>,
        ambient: Option<&str>,
        emissive: Option<&str>,
    ) -> Self {
        let slots = [
            (&mut self.diffuse, diffuse),
            (&mut self.normal, normal),
            (&mut self.specular, specular),
            (&mut self.ambient, ambient),
            (&mut self.emissive, emissive),
        ];
        for (slot, path) in slots {
            if let Some(path) = path {
                *slot = slot.clone().with_path(path);
            }
        }
        self
    }

    texture_slot_accessors!(diffuse, diffuse_path, set_diffuse_path, set_diffuse);
    texture_slot_accessors!(emissive, emissive_path, set_emissive_path, set_emissive);
    texture_slot_accessors!(specular, specular_path, set_specular_path, set_specular);
    texture_slot_accessors!(normal, normal_path, set_normal_path, set_normal);
    texture_slot_accessors!(ambient, ambient_path, set_ambient_path, set_ambient);

    /// Lighting target bound by the last forward pass.
    pub fn lighting_texture(&self) -> Option<&Arc<Texture>> {
        self.lighting_texture.as_ref()
    }

    /// Feature set for the current state and draw.
    pub fn features(&self, ctx: &DrawContext<'_>) -> StandardFeatures {
        let mut features = StandardFeatures::empty();

        match ctx.pass {
            RenderPass::GBuffer => {
                let (depth, mrt) = gbuffer_target(ctx);
                features |= StandardFeatures::GBUFFER;
                features.set(StandardFeatures::DEPTH, depth);
                features.set(StandardFeatures::MRT, mrt);
                features.set(StandardFeatures::NORMAL, self.normal.is_bound());
            }
            RenderPass::Forward => {
                features.set(StandardFeatures::LIGHTING, self.lighting_enabled);
                features.set(StandardFeatures::AMBIENT, self.ambient.is_bound());
                features.set(StandardFeatures::EMISSIVE, self.emissive.is_bound());
                features.set(StandardFeatures::SPECULAR, self.specular.is_bound());
                features.set(StandardFeatures::DIFFUSE, self.diffuse.is_bound());
                features.set(StandardFeatures::VERTEX_COLOR, self.vertex_color_enabled);
                features.set(StandardFeatures::ALPHA_TEST, self.reference_alpha > 0.0);
            }
        }

        features
    }
}

impl Material for StandardMaterial {
    fn name(&self) -> &'static str {
        self.techniques.name()
    }

    fn initialize(&mut self, assets: Arc<dyn AssetService>) -> Result<(), GraphicsError> {
        self.diffuse.load(assets.as_ref())?;
        self.emissive.load(assets.as_ref())?;
        self.normal.load(assets.as_ref())?;
        self.specular.load(assets.as_ref())?;
        self.ambient.refresh(assets.as_ref())?;
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
                let params = &mut self.forward;
                params.camera_position = vec3_to_array(ctx.camera.position);
                params.reference_alpha = self.reference_alpha;
                params.diffuse_color = self.diffuse_color.to_array3();
                params.emissive_color = self.emissive_color.to_array3();
                params.ambient_color = self.ambient_color.to_array3();
                params.alpha = self.alpha;
                params.texture_offset = vec2_to_array(self.texture_offset);
                params.tex_coord_fix = ctx.tex_coord_fix();

                if let Some(texture) = self.diffuse.texture() {
                    device.set_texture(texture, 0);
                }
                if let Some(texture) = self.emissive.texture() {
                    device.set_texture(texture, 1);
                }
                if let Some(texture) = self.specular.texture() {
                    device.set_texture(texture, 2);
                }
                if let Some(texture) = self.ambient.texture() {
                    device.set_texture(texture, 3);
                    if let Some(gbuffer) = &ctx.camera.gbuffer_target0 {
                        device.set_texture(gbuffer, 5);
                    }
                }

                self.lighting_texture = ctx.camera.lighting_target.clone();
                if let Some(texture) = &self.lighting_texture {
                    device.set_texture(texture, 4);
                }
            }
            RenderPass::GBuffer => {
                self.gbuffer.specular_power = self.specular_power;
                self.gbuffer.texture_offset = vec2_to_array(self.texture_offset);

                if let Some(texture) = self.normal.texture() {
                    device.set_texture(texture, 0);
                }
            }
        }

        log::trace!("StandardMaterial: {:?} parameters set", ctx.pass);
    }

    fn parameters(&self) -> &[u8] {
        match self.pass {
            RenderPass::Forward => bytemuck::bytes_of(&self.forward),
            RenderPass::GBuffer => bytemuck::bytes_of(&self.gbuffer),
        }
    }

    fn requires_deferred_pass(&self, pass: RenderPass) -> bool {
        match pass {
            RenderPass::GBuffer => self.lighting_enabled || self.ambient.is_bound(),
            RenderPass::Forward => true,
        }
    }
}

impl std::fmt::Debug for StandardMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardMaterial")
            .field("lighting_enabled", &self.lighting_enabled)
            .field("vertex_color_enabled", &self.vertex_color_enabled)
            .field("reference_alpha", &self.reference_alpha)
            .field("diffuse", &self.diffuse)
            .field("ambient", &self.ambient)
            .field("initialized", &self.assets.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::device::{DummyDevice, RenderTargetCapabilities};
    use crate::materials::CameraState;
    use crate::technique::{DummyShaderCompiler, TechniqueConfig};
    use crate::texture::TextureDescriptor;

    fn table() -> &'static TechniqueTable<StandardFeatures> {
        let table = TechniqueTable::build(
            "StandardMaterial",
            StandardMaterial::technique_rows(),
            TechniqueConfig::default(),
        )
        .unwrap();
        Box::leak(Box::new(table))
    }

    fn texture() -> Option<Arc<Texture>> {
        Some(Texture::new(TextureDescriptor::new(TextureKind::Texture2D)))
    }

    #[test]
    fn test_table_is_valid() {
        let table = table();
        assert_eq!(table.len(), FORWARD_KEYS.len() + 6);
        assert_eq!(table.default_row().name(), "Simple");
    }

    #[test]
    fn test_every_row_name_is_canonical() {
        for row in StandardMaterial::technique_rows() {
            let key = StandardFeatures::parse(row.name).unwrap();
            assert_eq!(key.canonical_name(), row.name);
            assert!(key.is_well_formed(), "{}", row.name);
        }
    }

    #[test]
    fn test_forward_row_defines() {
        let row = forward_row("LADVT");
        assert_eq!(row.vertex_format, VertexFormat::PositionColorTexture);
        assert_eq!(row.vertex_defines, ["VCOLOR"]);
        assert_eq!(row.fragment_defines, ["LIT", "AMBI", "DIFF", "VCOLOR", "ATEST"]);

        let row = forward_row("ES");
        assert_eq!(row.vertex_format, VertexFormat::PositionTexture);
        assert!(row.vertex_defines.is_empty());
        assert_eq!(row.fragment_defines, ["EMIS", "SPEC"]);
    }

    #[test]
    fn test_defaults() {
        let compiler = DummyShaderCompiler::new();
        let material = StandardMaterial::with_table(table(), &compiler).unwrap();

        assert_eq!(material.alpha, 1.0);
        assert_eq!(material.reference_alpha, 0.0);
        assert_eq!(material.specular_power, 64.0);
        assert_eq!(material.diffuse_color, Color::WHITE);
        assert_eq!(material.emissive_color, Color::WHITE);
        assert_eq!(material.ambient_color, Color::BLACK);
        assert!(material.lighting_enabled);
        assert_eq!(compiler.compiled_labels(), ["StandardMaterial/Simple"]);
    }

    #[test]
    fn test_forward_technique_names() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera);
        let mut material = StandardMaterial::with_table(table(), &compiler).unwrap();

        assert_eq!(material.current_technique(&ctx).unwrap(), "L");

        material.set_diffuse(texture());
        material.vertex_color_enabled = true;
        material.reference_alpha = 0.5;
        assert_eq!(material.current_technique(&ctx).unwrap(), "LDVT");

        material.lighting_enabled = false;
        material.set_ambient(Some(Texture::new(TextureDescriptor::new(TextureKind::Cube))));
        assert_eq!(material.current_technique(&ctx).unwrap(), "ADVT");
    }

    #[test]
    fn test_missing_combination_uses_nearest_subset() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera);
        let mut material = StandardMaterial::with_table(table(), &compiler).unwrap();

        material.set_emissive(texture());
        material.set_ambient(Some(Texture::new(TextureDescriptor::new(TextureKind::Cube))));
        material.reference_alpha = 0.1;

        let requested = material.features(&ctx);
        assert_eq!(requested.canonical_name(), "LAET");
        assert_eq!(material.current_technique(&ctx).unwrap(), "LAE");
    }

    #[test]
    fn test_gbuffer_technique_names() {
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let mut material = StandardMaterial::with_table(table(), &compiler).unwrap();

        let device = DummyDevice::new();
        let ctx = DrawContext::new(&device, &compiler, &camera).with_pass(RenderPass::GBuffer);
        assert_eq!(material.current_technique(&ctx).unwrap(), "G");

        let device =
            DummyDevice::new().with_capabilities(RenderTargetCapabilities::new(true, true));
        let ctx = DrawContext::new(&device, &compiler, &camera).with_pass(RenderPass::GBuffer);
        material.set_normal(texture());
        assert_eq!(material.current_technique(&ctx).unwrap(), "GDN");

        let device =
            DummyDevice::new().with_capabilities(RenderTargetCapabilities::new(false, true));
        let ctx = DrawContext::new(&device, &compiler, &camera).with_pass(RenderPass::GBuffer);
        assert_eq!(material.current_technique(&ctx).unwrap(), "GRN");
    }

    #[test]
    fn test_forward_parameters_and_slots() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let lighting = Texture::new(TextureDescriptor::new(TextureKind::Texture2D));
        let gbuffer = Texture::new(TextureDescriptor::new(TextureKind::Texture2D));
        let camera = CameraState::new(verdant_core::math::Vec3::new(1.0, 2.0, 3.0))
            .with_lighting_target(lighting.clone())
            .with_gbuffer_target0(gbuffer.clone());
        let ctx = DrawContext::new(&device, &compiler, &camera);

        let mut material = StandardMaterial::with_table(table(), &compiler).unwrap();
        let diffuse = texture().unwrap();
        let ambient = Texture::new(TextureDescriptor::new(TextureKind::Cube));
        material.set_diffuse(Some(diffuse.clone()));
        material.set_ambient(Some(ambient.clone()));
        material.alpha = 0.25;

        material.set_parameters(&ctx, false);

        assert!(Arc::ptr_eq(&device.bound_at(0).unwrap(), &diffuse));
        assert!(Arc::ptr_eq(&device.bound_at(3).unwrap(), &ambient));
        assert!(Arc::ptr_eq(&device.bound_at(4).unwrap(), &lighting));
        assert!(Arc::ptr_eq(&device.bound_at(5).unwrap(), &gbuffer));
        assert!(device.bound_at(1).is_none());

        let params: StandardParameters = bytemuck::pod_read_unaligned(material.parameters());
        assert_eq!(params.camera_position, [1.0, 2.0, 3.0]);
        assert_eq!(params.alpha, 0.25);
        assert_eq!(params.tex_coord_fix, -1.0);
        assert_eq!(material.parameters().len(), 80);
    }

    #[test]
    fn test_gbuffer_parameters() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera).with_pass(RenderPass::GBuffer);

        let mut material = StandardMaterial::with_table(table(), &compiler).unwrap();
        let normal = texture().unwrap();
        material.set_normal(Some(normal.clone()));
        material.specular_power = 16.0;
        material.texture_offset = Vec2::new(0.5, 0.25);

        material.set_parameters(&ctx, false);

        assert!(Arc::ptr_eq(&device.bound_at(0).unwrap(), &normal));
        let params: GBufferParameters = bytemuck::pod_read_unaligned(material.parameters());
        assert_eq!(params.specular_power, 16.0);
        assert_eq!(params.texture_offset, [0.5, 0.25]);
    }

    #[test]
    fn test_requires_deferred_pass() {
        let compiler = DummyShaderCompiler::new();
        let mut material = StandardMaterial::with_table(table(), &compiler).unwrap();
        assert!(material.requires_deferred_pass(RenderPass::GBuffer));

        material.lighting_enabled = false;
        assert!(!material.requires_deferred_pass(RenderPass::GBuffer));
        assert!(material.requires_deferred_pass(RenderPass::Forward));

        material.set_ambient(Some(Texture::new(TextureDescriptor::new(TextureKind::Cube))));
        assert!(material.requires_deferred_pass(RenderPass::GBuffer));
    }
}
