//! Per-draw state handed to materials.

use std::sync::Arc;

use verdant_core::Light;
use verdant_core::math::{Mat4, Vec3, mat4_translation};

use crate::device::GraphicsDevice;
use crate::technique::{RenderPass, ShaderCompiler};
use crate::texture::Texture;

/// The camera currently drawing.
#[derive(Debug, Clone)]
pub struct CameraState {
    /// World-space camera position.
    pub position: Vec3,
    /// Accumulated light buffer produced by the deferred lighting pass.
    pub lighting_target: Option<Arc<Texture>>,
    /// First G-buffer render target.
    pub gbuffer_target0: Option<Arc<Texture>>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::zeros())
    }
}

impl CameraState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            lighting_target: None,
            gbuffer_target0: None,
        }
    }

    #[must_use]
    pub fn with_lighting_target(mut self, target: Arc<Texture>) -> Self {
        self.lighting_target = Some(target);
        self
    }

    #[must_use]
    pub fn with_gbuffer_target0(mut self, target: Arc<Texture>) -> Self {
        self.gbuffer_target0 = Some(target);
        self
    }
}

/// Everything a material reads while preparing one draw.
///
/// Built fresh for every draw call; materials never keep it.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub pass: RenderPass,
    pub camera: &'a CameraState,
    pub lights: &'a [Light],
    /// World transform of the drawn object.
    pub world: Mat4,
    pub device: &'a dyn GraphicsDevice,
    pub compiler: &'a dyn ShaderCompiler,
}

impl<'a> DrawContext<'a> {
    /// Forward pass draw at the origin with no lights.
    pub fn new(
        device: &'a dyn GraphicsDevice,
        compiler: &'a dyn ShaderCompiler,
        camera: &'a CameraState,
    ) -> Self {
        Self {
            pass: RenderPass::Forward,
            camera,
            lights: &[],
            world: Mat4::identity(),
            device,
            compiler,
        }
    }

    #[must_use]
    pub fn with_pass(mut self, pass: RenderPass) -> Self {
        self.pass = pass;
        self
    }

    #[must_use]
    pub fn with_lights(mut self, lights: &'a [Light]) -> Self {
        self.lights = lights;
        self
    }

    #[must_use]
    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    /// World-space position of the drawn object.
    pub fn object_position(&self) -> Vec3 {
        mat4_translation(&self.world)
    }

    /// Texture coordinate sign correction: `1.0` while an offscreen render
    /// target is bound, `-1.0` when drawing to the backbuffer.
    pub fn tex_coord_fix(&self) -> f32 {
        if self.device.render_target_active() {
            1.0
        } else {
            -1.0
        }
    }
}

impl std::fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("pass", &self.pass)
            .field("camera", &self.camera)
            .field("lights", &self.lights.len())
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::device::DummyDevice;
    use crate::technique::DummyShaderCompiler;
    use verdant_core::math::mat4_from_translation;

    #[test]
    fn test_tex_coord_fix_follows_render_target() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera);

        assert_eq!(ctx.tex_coord_fix(), -1.0);
        device.set_render_target_active(true);
        assert_eq!(ctx.tex_coord_fix(), 1.0);
        device.set_render_target_active(false);
        assert_eq!(ctx.tex_coord_fix(), -1.0);
    }

    #[test]
    fn test_object_position_from_world() {
        let device = DummyDevice::new();
        let compiler = DummyShaderCompiler::new();
        let camera = CameraState::default();
        let ctx = DrawContext::new(&device, &compiler, &camera)
            .with_world(mat4_from_translation(Vec3::new(1.0, 2.0, 3.0)));

        assert_eq!(ctx.object_position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
