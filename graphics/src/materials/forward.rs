//! Single-light forward material.
//!
//! Shades with the one scene light contributing most to the drawn object,
//! picked per draw by [`find_nearby_light`].

use std::sync::Arc;

use bitflags::bitflags;
use static_assertions::assert_impl_all;
use verdant_core::math::{Vec2, vec2_to_array, vec3_to_array};
use verdant_core::{Color, Light, LightKind, find_nearby_light};

use crate::assets::{AssetService, TextureSlot};
use crate::error::GraphicsError;
use crate::mesh::VertexFormat;
use crate::shader::ShaderEntry;
use crate::technique::key::{flags_count, flags_name, flags_parse};
use crate::technique::{
    RenderPass, ShaderCompiler, TechniqueKey, TechniqueRegistry, TechniqueRow, TechniqueTable,
};
use crate::texture::{Texture, TextureKind};

use super::params::{FORWARD_LAYOUT, ForwardParameters, LightParameters};
use super::{DrawContext, Material};

bitflags! {
    /// Features selecting a [`ForwardMaterial`] technique.
    ///
    /// `POINT` and `SPOT` qualify `LIGHTING`; lighting without either means
    /// a directional light.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ForwardFeatures: u8 {
        const LIGHTING = 1 << 0;
        const POINT = 1 << 1;
        const SPOT = 1 << 2;
        const AMBIENT = 1 << 3;
        const DIFFUSE = 1 << 4;
        const VERTEX_COLOR = 1 << 5;
        const ALPHA_TEST = 1 << 6;
    }
}

const TOKENS: &[(ForwardFeatures, &str)] = &[
    (ForwardFeatures::LIGHTING, "L"),
    (ForwardFeatures::POINT, "P"),
    (ForwardFeatures::SPOT, "S"),
    (ForwardFeatures::AMBIENT, "A"),
    (ForwardFeatures::DIFFUSE, "D"),
    (ForwardFeatures::VERTEX_COLOR, "V"),
    (ForwardFeatures::ALPHA_TEST, "T"),
];

impl TechniqueKey for ForwardFeatures {
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
        let kind = Self::POINT | Self::SPOT;
        if self.intersects(kind) && !self.contains(Self::LIGHTING) {
            return false;
        }
        !self.contains(kind)
    }
}

const FORWARD_KEYS: &[&str] = &[
    "Simple", "A", "AD", "ADV", "ADVT", "AV", "AVT", "AT", "D", "DV", "DVT", "DT", "V", "VT", "T",
    "LP", "LPA", "LPAD", "LPADV", "LPADVT", "LPAV", "LPAVT", "LPAT", "LPD", "LPDV", "LPDVT", "LPDT",
    "LPV", "LPVT", "LPT", "L", "LA", "LAD", "LADV", "LADVT", "LAV", "LAVT", "LAT", "LD", "LDV",
    "LDVT", "LDT", "LV", "LVT", "LT", "LS", "LSA", "LSAD", "LSADV", "LSADVT", "LSAV", "LSAVT",
    "LSAT", "LSD", "LSDV", "LSDVT", "LSDT", "LSV", "LSVT", "LST",
];

const VS: ShaderEntry = ShaderEntry::new("ForwardMaterial", "vsForwardMaterial");
const PS: ShaderEntry = ShaderEntry::new("ForwardMaterial", "psForwardMaterial");

fn vertex_format(normal: bool, color: bool, texture: bool) -> VertexFormat {
    match (normal, color, texture) {
        (false, false, false) => VertexFormat::Position,
        (false, true, false) => VertexFormat::PositionColor,
        (false, false, true) => VertexFormat::PositionTexture,
        (false, true, true) => VertexFormat::PositionColorTexture,
        (true, false, false) => VertexFormat::PositionNormal,
        (true, true, false) => VertexFormat::PositionNormalColor,
        (true, false, true) => VertexFormat::PositionNormalTexture,
        (true, true, true) => VertexFormat::PositionNormalColorTexture,
    }
}

fn forward_row(name: &'static str) -> TechniqueRow {
    let f = ForwardFeatures::parse(name).unwrap_or(ForwardFeatures::empty());
    let lit = f.contains(ForwardFeatures::LIGHTING);
    let ambient = f.contains(ForwardFeatures::AMBIENT);
    let diffuse = f.contains(ForwardFeatures::DIFFUSE);
    let color = f.contains(ForwardFeatures::VERTEX_COLOR);

    let mut vertex_defines = Vec::new();
    let mut fragment_defines = Vec::new();
    if lit {
        vertex_defines.push("VLIT");
        fragment_defines.push("LIT");
        fragment_defines.push(if f.contains(ForwardFeatures::POINT) {
            "POINT"
        } else if f.contains(ForwardFeatures::SPOT) {
            "SPOT"
        } else {
            "DIRECTIONAL"
        });
    }
    if ambient {
        vertex_defines.push("AMBI");
        fragment_defines.push("AMBI");
    }
    if diffuse {
        vertex_defines.push("VTEX");
        fragment_defines.push("DIFF");
    }
    if color {
        vertex_defines.push("VCOLOR");
        fragment_defines.push("VCOLOR");
    }
    if f.contains(ForwardFeatures::ALPHA_TEST) {
        fragment_defines.push("ATEST");
    }

    TechniqueRow::new(name, VS, PS, vertex_format(lit || ambient, color, diffuse))
        .with_vertex_defines(vertex_defines)
        .with_fragment_defines(fragment_defines)
        .with_parameters(FORWARD_LAYOUT)
}

static TECHNIQUES: TechniqueRegistry<ForwardFeatures> =
    TechniqueRegistry::new("ForwardMaterial", ForwardMaterial::technique_rows);

assert_impl_all!(TechniqueTable<ForwardFeatures>: Send, Sync);

/// Forward material lit by at most one light.
///
/// Defaults: alpha 1, reference alpha 0, specular power 32, specular
/// intensity 1, white diffuse, black ambient, lighting disabled.
///
/// Binds the diffuse texture to slot 0 and the ambient cube map to slot 1.
pub struct ForwardMaterial {
    techniques: &'static TechniqueTable<ForwardFeatures>,
    assets: Option<Arc<dyn AssetService>>,

    pub alpha: f32,
    pub reference_alpha: f32,
    pub specular_power: f32,
    pub specular_intensity: f32,
    pub diffuse_color: Color,
    pub ambient_color: Color,
    pub lighting_enabled: bool,
    pub vertex_color_enabled: bool,
    pub texture_offset: Vec2,

    diffuse: TextureSlot,
    ambient: TextureSlot,

    params: ForwardParameters,
}

impl ForwardMaterial {
    pub fn new(compiler: &dyn ShaderCompiler) -> Result<Self, GraphicsError> {
        Self::with_table(Self::techniques()?, compiler)
    }

    pub fn with_table(
        techniques: &'static TechniqueTable<ForwardFeatures>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        techniques.prepare_default(compiler)?;

        Ok(Self {
            techniques,
            assets: None,
            alpha: 1.0,
            reference_alpha: 0.0,
            specular_power: 32.0,
            specular_intensity: 1.0,
            diffuse_color: Color::WHITE,
            ambient_color: Color::BLACK,
            lighting_enabled: false,
            vertex_color_enabled: false,
            texture_offset: Vec2::zeros(),
            diffuse: TextureSlot::new("diffuse", TextureKind::Texture2D),
            ambient: TextureSlot::new("ambient", TextureKind::Cube),
            params: ForwardParameters::default(),
        })
    }

    pub fn techniques() -> Result<&'static TechniqueTable<ForwardFeatures>, GraphicsError> {
        TECHNIQUES.table()
    }

    pub fn technique_rows() -> Vec<TechniqueRow> {
        FORWARD_KEYS.iter().map(|name| forward_row(name)).collect()
    }

    #[must_use]
    pub fn with_diffuse_color(mut self, color: Color) -> Self {
        self.diffuse_color = color;
        self
    }

    #[must_use]
    pub fn with_paths(mut self, diffuse: Option<&str>, ambient: Option<&str>) -> Self {
        if let Some(path) = diffuse {
            self.diffuse = self.diffuse.with_path(path);
        }
        if let Some(path) = ambient {
            self.ambient = self.ambient.with_path(path);
        }
        self
    }

    texture_slot_accessors!(diffuse, diffuse_path, set_diffuse_path, set_diffuse);
    texture_slot_accessors!(ambient, ambient_path, set_ambient_path, set_ambient);

    /// The light this material would be shaded with in `ctx`.
    pub fn nearby_light<'a>(&self, ctx: &DrawContext<'a>) -> Option<&'a Light> {
        if !self.lighting_enabled {
            return None;
        }
        find_nearby_light(ctx.lights, ctx.object_position())
    }

    /// Feature set for the current state and draw.
    pub fn features(&self, ctx: &DrawContext<'_>) -> ForwardFeatures {
        let mut features = ForwardFeatures::empty();

        if let Some(light) = self.nearby_light(ctx) {
            features |= ForwardFeatures::LIGHTING;
            match light.kind {
                LightKind::Point { .. } => features |= ForwardFeatures::POINT,
                LightKind::Spot { .. } => features |= ForwardFeatures::SPOT,
                LightKind::Directional { .. } => {}
            }
        }

        features.set(ForwardFeatures::AMBIENT, self.ambient.is_bound());
        features.set(ForwardFeatures::DIFFUSE, self.diffuse.is_bound());
        features.set(ForwardFeatures::VERTEX_COLOR, self.vertex_color_enabled);
        features.set(ForwardFeatures::ALPHA_TEST, self.reference_alpha > 0.0);
        features
    }
}

impl Material for ForwardMaterial {
    fn name(&self) -> &'static str {
        self.techniques.name()
    }

    fn initialize(&mut self, assets: Arc<dyn AssetService>) -> Result<(), GraphicsError> {
        self.diffuse.load(assets.as_ref())?;
        self.ambient.refresh(assets.as_ref())?;
        self.assets = Some(assets);
        Ok(())
    }

    fn current_technique(&self, ctx: &DrawContext<'_>) -> Result<&'static str, GraphicsError> {
        let techniques = self.techniques;
        Ok(techniques.select(self.features(ctx), ctx.compiler)?.name())
    }

    fn set_parameters(&mut self, ctx: &DrawContext<'_>, _cached: bool) {
        let nearby = self.nearby_light(ctx);

        let params = &mut self.params;
        params.camera_position = vec3_to_array(ctx.camera.position);
        params.reference_alpha = self.reference_alpha;
        params.diffuse_color = self.diffuse_color.to_array3();
        params.alpha = self.alpha;
        params.ambient_color = self.ambient_color.to_array3();
        params.specular_power = self.specular_power;
        params.specular_intensity = self.specular_intensity;
        params.texture_offset = vec2_to_array(self.texture_offset);

        match nearby {
            Some(light) => params.light.update(light),
            None => params.light = LightParameters::default(),
        }

        if let Some(texture) = self.diffuse.texture() {
            ctx.device.set_texture(texture, 0);
        }
        if let Some(texture) = self.ambient.texture() {
            ctx.device.set_texture(texture, 1);
        }

        log::trace!("ForwardMaterial: parameters set, nearby light {:?}", nearby.map(|l| l.kind));
    }

    fn parameters(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn requires_deferred_pass(&self, pass: RenderPass) -> bool {
        pass == RenderPass::Forward
    }
}

impl std::fmt::Debug for ForwardMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardMaterial")
            .field("lighting_enabled", &self.lighting_enabled)
            .field("diffuse", &self.diffuse)
            .field("ambient", &self.ambient)
            .finish_non_exhaustive()
    }
}
