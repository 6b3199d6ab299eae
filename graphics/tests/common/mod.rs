//! Shared fixtures for the material integration tests.
//!
//! Every test builds its own technique tables so compile counts observed
//! through [`DummyShaderCompiler`] are not affected by other tests.

#![allow(dead_code)]

use std::sync::Arc;

use verdant_graphics::{
    CameraState, DrawContext, DummyDevice, DummyShaderCompiler, MemoryAssets, RenderPass,
    RenderTargetCapabilities, TechniqueConfig, TechniqueKey, TechniqueRow, TechniqueTable,
    Texture, TextureDescriptor, TextureKind,
};

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a private technique table and leak it for `'static` use.
pub fn leak_table<K: TechniqueKey>(
    name: &'static str,
    rows: Vec<TechniqueRow>,
) -> &'static TechniqueTable<K> {
    let table = TechniqueTable::build(name, rows, TechniqueConfig::default())
        .unwrap_or_else(|e| panic!("technique table {name} is invalid: {e}"));
    Box::leak(Box::new(table))
}

/// A texture not owned by any asset path.
pub fn texture(kind: TextureKind) -> Arc<Texture> {
    Texture::new(TextureDescriptor::new(kind))
}

/// Device, compiler, assets and camera for one test.
pub struct TestContext {
    pub device: DummyDevice,
    pub compiler: DummyShaderCompiler,
    pub assets: MemoryAssets,
    pub camera: CameraState,
}

impl TestContext {
    pub fn new() -> Self {
        init_logging();

        let assets = MemoryAssets::new();
        for path in ["diffuse.png", "normal.png", "specular.png", "emissive.png", "detail.png"] {
            assets.insert(path, TextureKind::Texture2D);
        }
        for path in ["sky.dds", "ambient.dds"] {
            assets.insert(path, TextureKind::Cube);
        }

        Self {
            device: DummyDevice::new(),
            compiler: DummyShaderCompiler::new(),
            assets,
            camera: CameraState::default(),
        }
    }

    /// Same as [`new`](Self::new) with the given G-buffer capabilities.
    pub fn with_capabilities(depth_as_texture: bool, multiple_render_targets: bool) -> Self {
        let mut ctx = Self::new();
        ctx.device = DummyDevice::new().with_capabilities(RenderTargetCapabilities::new(
            depth_as_texture,
            multiple_render_targets,
        ));
        ctx
    }

    pub fn draw(&self, pass: RenderPass) -> DrawContext<'_> {
        DrawContext::new(&self.device, &self.compiler, &self.camera).with_pass(pass)
    }

    pub fn assets(&self) -> Arc<MemoryAssets> {
        Arc::new(self.assets.clone())
    }
}
