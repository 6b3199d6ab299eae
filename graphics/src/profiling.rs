//! Profiling support via Tracy.
//!
//! Re-exports the CPU profiling macros of [`verdant_core::profiling`]. Enable
//! the `profiling` feature of this crate to turn them on:
//!
//! ```toml
//! [dependencies]
//! verdant-graphics = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! Technique selection is instrumented with a function span, and every
//! compiled variant sends a message to the Tracy log.

pub use verdant_core::profiling::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        profile_scope!("test_scope");
        profile_function!();
        profile_message!("test message");
    }
}
