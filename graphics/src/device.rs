//! Graphics device boundary.
//!
//! Materials never talk to a GPU API directly. They query render target
//! capabilities and issue texture binds through [`GraphicsDevice`].

use std::sync::Arc;
#[cfg(feature = "dummy")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "dummy")]
use parking_lot::Mutex;

use crate::texture::Texture;

/// What the active render target setup can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderTargetCapabilities {
    /// Depth can be sampled as a texture in the G-buffer pass.
    pub depth_as_texture: bool,
    /// Multiple render targets can be written at once.
    pub multiple_render_targets: bool,
}

impl RenderTargetCapabilities {
    pub fn new(depth_as_texture: bool, multiple_render_targets: bool) -> Self {
        Self {
            depth_as_texture,
            multiple_render_targets,
        }
    }
}

/// Device services consumed by materials.
pub trait GraphicsDevice: Send + Sync {
    /// Render target capabilities of the device.
    fn capabilities(&self) -> RenderTargetCapabilities;

    /// Whether an offscreen render target is currently bound.
    fn render_target_active(&self) -> bool;

    /// Bind `texture` to sampler slot `slot` for the next draw.
    fn set_texture(&self, texture: &Arc<Texture>, slot: u32);
}

/// A texture bind recorded by [`DummyDevice`].
#[cfg(feature = "dummy")]
#[derive(Debug, Clone)]
pub struct TextureBinding {
    pub slot: u32,
    pub texture: Arc<Texture>,
}

/// Device that performs no GPU work and records every texture bind.
#[cfg(feature = "dummy")]
#[derive(Debug, Default)]
pub struct DummyDevice {
    capabilities: RenderTargetCapabilities,
    render_target_active: AtomicBool,
    bindings: Mutex<Vec<TextureBinding>>,
}

#[cfg(feature = "dummy")]
impl DummyDevice {
    /// Create a dummy device without depth-texture or MRT support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the device name.
    pub fn name(&self) -> &'static str {
        "Dummy Device"
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: RenderTargetCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn set_render_target_active(&self, active: bool) {
        self.render_target_active.store(active, Ordering::Release);
    }

    /// Snapshot of the binds recorded so far.
    pub fn bindings(&self) -> Vec<TextureBinding> {
        self.bindings.lock().clone()
    }

    /// Drain the recorded binds.
    pub fn take_bindings(&self) -> Vec<TextureBinding> {
        std::mem::take(&mut *self.bindings.lock())
    }

    /// The texture most recently bound to `slot`.
    pub fn bound_at(&self, slot: u32) -> Option<Arc<Texture>> {
        self.bindings
            .lock()
            .iter()
            .rev()
            .find(|b| b.slot == slot)
            .map(|b| b.texture.clone())
    }
}

#[cfg(feature = "dummy")]
impl GraphicsDevice for DummyDevice {
    fn capabilities(&self) -> RenderTargetCapabilities {
        self.capabilities
    }

    fn render_target_active(&self) -> bool {
        self.render_target_active.load(Ordering::Acquire)
    }

    fn set_texture(&self, texture: &Arc<Texture>, slot: u32) {
        log::trace!("DummyDevice: binding {:?} to slot {}", texture.label(), slot);
        self.bindings.lock().push(TextureBinding {
            slot,
            texture: texture.clone(),
        });
    }
}
