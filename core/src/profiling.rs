//! Profiling support via Tracy.
//!
//! Instrumentation is compiled in only with the `profiling` Cargo feature.
//! Without it every macro expands to nothing.
//!
//! ```toml
//! [dependencies]
//! verdant-core = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! use verdant_core::{profile_function, profile_scope};
//!
//! fn select_technique() {
//!     profile_function!();
//!
//!     {
//!         profile_scope!("compile_variant");
//!         // ...
//!     }
//! }
//! ```

#[cfg(feature = "profiling")]
pub use tracy_client::{self, Client, span};

/// Create a profiling span for the current scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Create a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Create a profiling span covering the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Create a function span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Send a message to Tracy's message log.
///
/// Used for rare events such as a shader variant being compiled.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_message {
    ($msg:expr) => {
        if let Some(client) = $crate::profiling::Client::running() {
            client.message($msg, 0);
        }
    };
}

/// Send a message (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_message {
    ($msg:expr) => {
        let _ = $msg;
    };
}

pub use profile_function;
pub use profile_message;
pub use profile_scope;
