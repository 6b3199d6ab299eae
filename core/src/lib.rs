//! # Verdant Core
//!
//! Math aliases, colors, scene lights and profiling macros shared by the
//! Verdant material system.

pub mod color;
pub mod light;
pub mod math;
pub mod profiling;

pub use color::Color;
pub use light::{Light, LightKind, find_nearby_light};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core version once at startup.
pub fn init() {
    log::info!("Verdant Core v{} initialized", VERSION);
}
