//! Environment-mapped material.
//!
//! Reflects a cube map on top of an optional diffuse texture, optionally
//! weighted by a Fresnel term. When lighting is off a normal map can perturb
//! the reflection.

use std::sync::Arc;

use bitflags::bitflags;
use static_assertions::assert_impl_all;
use verdant_core::Color;
use verdant_core::math::vec3_to_array;

use crate::assets::{AssetService, TextureSlot};
use crate::error::GraphicsError;
use crate::mesh::VertexFormat;
use crate::shader::ShaderEntry;
use crate::technique::key::{flags_count, flags_name, flags_parse};
use crate::technique::{
    RenderPass, ShaderCompiler, TechniqueKey, TechniqueRegistry, TechniqueRow, TechniqueTable,
};
use crate::texture::{Texture, TextureKind};

use super::params::{ENVIRONMENT_LAYOUT, EnvironmentParameters, GBufferParameters};
use super::{DrawContext, Material, gbuffer_rows, gbuffer_target};

bitflags! {
    /// Features selecting an [`EnvironmentMaterial`] technique.
    ///
    /// `NORMAL` is shared by both passes: a normal-mapped reflection in the
    /// forward pass, a normal-mapped G-buffer write otherwise.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnvironmentFeatures: u8 {
        const LIGHTING = 1 << 0;
        const FRESNEL = 1 << 1;
        const DIFFUSE = 1 << 2;
        const ENVIRONMENT = 1 << 3;
        const GBUFFER = 1 << 4;
        const DEPTH = 1 << 5;
        const MRT = 1 << 6;
        const NORMAL = 1 << 7;
    }
}

const TOKENS: &[(EnvironmentFeatures, &str)] = &[
    (EnvironmentFeatures::LIGHTING, "L"),
    (EnvironmentFeatures::FRESNEL, "F"),
    (EnvironmentFeatures::DIFFUSE, "D"),
    (EnvironmentFeatures::ENVIRONMENT, "E"),
    (EnvironmentFeatures::GBUFFER, "G"),
    (EnvironmentFeatures::DEPTH, "D"),
    (EnvironmentFeatures::MRT, "R"),
    (EnvironmentFeatures::NORMAL, "N"),
];

const FORWARD_FEATURES: EnvironmentFeatures = EnvironmentFeatures::LIGHTING
    .union(EnvironmentFeatures::FRESNEL)
    .union(EnvironmentFeatures::DIFFUSE)
    .union(EnvironmentFeatures::ENVIRONMENT)
    .union(EnvironmentFeatures::NORMAL);

const GBUFFER_FEATURES: EnvironmentFeatures = EnvironmentFeatures::GBUFFER
    .union(EnvironmentFeatures::DEPTH)
    .union(EnvironmentFeatures::MRT)
    .union(EnvironmentFeatures::NORMAL);

impl TechniqueKey for EnvironmentFeatures {
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
            return GBUFFER_FEATURES.contains(*self) && !self.contains(Self::DEPTH | Self::MRT);
        }
        if !FORWARD_FEATURES.contains(*self) {
            return false;
        }

        let fresnel_ok = !self.contains(Self::FRESNEL)
            || self.contains(Self::DIFFUSE | Self::ENVIRONMENT);
        let normal_ok = !self.contains(Self::NORMAL)
            || (self.contains(Self::ENVIRONMENT) && !self.contains(Self::LIGHTING));
        fresnel_ok && normal_ok
    }
}

const VS: ShaderEntry = ShaderEntry::new("EnvironmentMaterial", "vsEnvironmentMaterial");
const PS: ShaderEntry = ShaderEntry::new("EnvironmentMaterial", "psEnvironmentMaterial");

type ForwardRow = (
    &'static str,
    VertexFormat,
    &'static [&'static str],
    &'static [&'static str],
);

/// Forward rows: name, vertex format, vertex defines, fragment defines.
///
/// Lit variants read their normal from the G-buffer, so their vertex
/// formats carry no normal.
const FORWARD_ROWS: &[ForwardRow] = &[
    ("Simple", VertexFormat::PositionNormal, &[], &[]),
    ("L", VertexFormat::Position, &["LIT"], &["LIT"]),
    ("LD", VertexFormat::PositionTexture, &["LIT", "DIFF"], &["LIT", "DIFF"]),
    ("D", VertexFormat::PositionNormalTexture, &["DIFF"], &["DIFF"]),
    ("E", VertexFormat::PositionNormal, &[], &["ENV"]),
    ("LE", VertexFormat::Position, &["LIT"], &["LIT", "ENV"]),
    (
        "LFDE",
        VertexFormat::PositionTexture,
        &["LIT", "DIFF"],
        &["LIT", "FRES", "DIFF", "ENV"],
    ),
    ("LDE", VertexFormat::PositionTexture, &["LIT", "DIFF"], &["LIT", "DIFF", "ENV"]),
    ("FDE", VertexFormat::PositionNormalTexture, &["DIFF"], &["FRES", "DIFF", "ENV"]),
    ("DE", VertexFormat::PositionNormalTexture, &["DIFF"], &["DIFF", "ENV"]),
    ("EN", VertexFormat::PositionNormalTangentTexture, &["NORMAL"], &["ENV", "NORMAL"]),
    (
        "FDEN",
        VertexFormat::PositionNormalTangentTexture,
        &["DIFF", "NORMAL"],
        &["FRES", "DIFF", "ENV", "NORMAL"],
    ),
    (
        "DEN",
        VertexFormat::PositionNormalTangentTexture,
        &["DIFF", "NORMAL"],
        &["DIFF", "ENV", "NORMAL"],
    ),
];

static TECHNIQUES: TechniqueRegistry<EnvironmentFeatures> =
    TechniqueRegistry::new("EnvironmentMaterial", EnvironmentMaterial::technique_rows);

assert_impl_all!(TechniqueTable<EnvironmentFeatures>: Send, Sync);

/// Cube map reflection material.
///
/// # Defaults
///
/// Environment amount 0.4, Fresnel factor 0 with the Fresnel term disabled,
/// white diffuse, black ambient, specular power 64, lighting enabled.
///
/// # Texture slots
///
/// | Pass | Slot | Texture |
/// |---|---|---|
/// | Forward | 0 | diffuse |
/// | Forward | 1 | environment cube map |
/// | Forward | 2 | camera lighting target |
/// | Forward | 3 | camera G-buffer target 0 |
/// | Forward | 4 | normal map |
/// | G-buffer | 0 | normal map |
pub struct EnvironmentMaterial {
    techniques: &'static TechniqueTable<EnvironmentFeatures>,
    assets: Option<Arc<dyn AssetService>>,

    /// Blend weight of the reflection.
    pub environment_amount: f32,
    pub fresnel_factor: f32,
    /// Only takes effect with both a diffuse texture and a cube map.
    pub fresnel_enabled: bool,
    pub diffuse_color: Color,
    pub ambient_color: Color,
    pub specular_power: f32,
    pub lighting_enabled: bool,

    diffuse: TextureSlot,
    environment: TextureSlot,
    normal: TextureSlot,
    lighting_texture: Option<Arc<Texture>>,
    gbuffer_texture: Option<Arc<Texture>>,

    pass: RenderPass,
    forward: EnvironmentParameters,
    gbuffer: GBufferParameters,
}

impl EnvironmentMaterial {
    pub fn new(compiler: &dyn ShaderCompiler) -> Result<Self, GraphicsError> {
        Self::with_table(Self::techniques()?, compiler)
    }

    pub fn with_table(
        techniques: &'static TechniqueTable<EnvironmentFeatures>,
        compiler: &dyn ShaderCompiler,
    ) -> Result<Self, GraphicsError> {
        techniques.prepare_default(compiler)?;

        Ok(Self {
            techniques,
            assets: None,
            environment_amount: 0.4,
            fresnel_factor: 0.0,
            fresnel_enabled: false,
            diffuse_color: Color::WHITE,
            ambient_color: Color::BLACK,
            specular_power: 64.0,
            lighting_enabled: true,
            diffuse: TextureSlot::new("diffuse", TextureKind::Texture2D),
            environment: TextureSlot::new("environment", TextureKind::Cube),
            normal: TextureSlot::new("normal", TextureKind::Texture2D),
            lighting_texture: None,
            gbuffer_texture: None,
            pass: RenderPass::Forward,
            forward: EnvironmentParameters::default(),
            gbuffer: GBufferParameters::default(),
        })
    }

    pub fn techniques() -> Result<&'static TechniqueTable<EnvironmentFeatures>, GraphicsError> {
        TECHNIQUES.table()
    }

    pub fn technique_rows() -> Vec<TechniqueRow> {
        FORWARD_ROWS
            .iter()
            .map(|&(name, format, vertex, fragment)| {
                TechniqueRow::new(name, VS, PS, format)
                    .with_vertex_defines(vertex.iter().copied())
                    .with_fragment_defines(fragment.iter().copied())
                    .with_parameters(ENVIRONMENT_LAYOUT)
            })
            .chain(gbuffer_rows())
            .collect()
    }

    /// Configure texture paths, resolved by [`Material::initialize`].
    #[must_use]
    pub fn with_paths(
        mut self,
        diffuse: Option<&str>,
        environment: Option<&str>,
        normal: Option<&str>,
    ) -> Self {
        if let Some(path) = diffuse {
            self.diffuse = self.diffuse.with_path(path);
        }
        if let Some(path) = environment {
            self.environment = self.environment.with_path(path);
        }
        if let Some(path) = normal {
            self.normal = self.normal.with_path(path);
        }
        self
    }

    texture_slot_accessors!(required diffuse, diffuse_path, set_diffuse_path, set_diffuse);
    texture_slot_accessors!(
        required environment,
        environment_path,
        set_environment_path,
        set_environment
    );
    texture_slot_accessors!(required normal, normal_path, set_normal_path, set_normal);

    pub fn lighting_texture(&self) -> Option<&Arc<Texture>> {
        self.lighting_texture.as_ref()
    }

    pub fn gbuffer_texture(&self) -> Option<&Arc<Texture>> {
        self.gbuffer_texture.as_ref()
    }

    /// Feature set for the current state and draw.
    pub fn features(&self, ctx: &DrawContext<'_>) -> EnvironmentFeatures {
        let mut features = EnvironmentFeatures::empty();

        match ctx.pass {
            RenderPass::GBuffer => {
                let (depth, mrt) = gbuffer_target(ctx);
                features |= EnvironmentFeatures::GBUFFER;
                features.set(EnvironmentFeatures::DEPTH, depth);
                features.set(EnvironmentFeatures::MRT, mrt);
                features.set(EnvironmentFeatures::NORMAL, self.normal.is_bound());
            }
            RenderPass::Forward => {
                let diffuse = self.diffuse.is_bound();
                let environment = self.environment.is_bound();
                features.set(EnvironmentFeatures::LIGHTING, self.lighting_enabled);
                features.set(
                    EnvironmentFeatures::FRESNEL,
                    self.fresnel_enabled && diffuse && environment,
                );
                features.set(EnvironmentFeatures::DIFFUSE, diffuse);
                features.set(EnvironmentFeatures::ENVIRONMENT, environment);
                features.set(
                    EnvironmentFeatures::NORMAL,
                    !self.lighting_enabled && self.normal.is_bound() && environment,
                );
            }
        }

        features
    }
}

impl Material for EnvironmentMaterial {
    fn name(&self) -> &'static str {
        self.techniques.name()
    }

    fn initialize(&mut self, assets: Arc<dyn AssetService>) -> Result<(), GraphicsError> {
        self.diffuse.load(assets.as_ref())?;
        self.normal.load(assets.as_ref())?;
        if self.environment.path().is_some_and(|path| !path.is_empty()) {
            self.environment.refresh(assets.as_ref())?;
        }
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
                params.fresnel_factor = self.fresnel_factor;
                params.diffuse_color = self.diffuse_color.to_array3();
                params.environment_amount = self.environment_amount;
                params.ambient_color = self.ambient_color.to_array3();
                params.tex_coord_fix = ctx.tex_coord_fix();

                if let Some(texture) = self.diffuse.texture() {
                    device.set_texture(texture, 0);
                }
                if let Some(texture) = self.environment.texture() {
                    device.set_texture(texture, 1);
                }

                self.lighting_texture = ctx.camera.lighting_target.clone();
                if let Some(texture) = &self.lighting_texture {
                    device.set_texture(texture, 2);
                }
                self.gbuffer_texture = ctx.camera.gbuffer_target0.clone();
                if let Some(texture) = &self.gbuffer_texture {
                    device.set_texture(texture, 3);
                }
                if let Some(texture) = self.normal.texture() {
                    device.set_texture(texture, 4);
                }
            }
            RenderPass::GBuffer => {
                self.gbuffer.specular_power = self.specular_power;

                if let Some(texture) = self.normal.texture() {
                    device.set_texture(texture, 0);
                }
            }
        }

        log::trace!("EnvironmentMaterial: {:?} parameters set", ctx.pass);
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

impl std::fmt::Debug for EnvironmentMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentMaterial")
            .field("environment_amount", &self.environment_amount)
            .field("fresnel_enabled", &self.fresnel_enabled)
            .field("lighting_enabled", &self.lighting_enabled)
            .field("diffuse", &self.diffuse)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
