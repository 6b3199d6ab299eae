//! Shader technique selection.
//!
//! Every material type owns one [`TechniqueTable`]: an ordered list of shader
//! variants keyed by a feature set. Per draw the material extracts its
//! current feature set and asks the table for the matching row, which is
//! compiled the first time it is selected.
//!
//! ```text
//! material state ──extract──▶ feature key ──resolve──▶ row ──ensure_compiled──▶ program
//! ```
//!
//! - [`TechniqueKey`] - feature sets with canonical token names
//! - [`TechniqueRow`] / [`TechniqueDescriptor`] - declared variant plus compiled state
//! - [`TechniqueTable`] - validated lookup with a configurable [`MissPolicy`]
//! - [`TechniqueRegistry`] - process-wide table per material type
//! - [`ShaderCompiler`] - compiler boundary

mod compiler;
mod config;
mod descriptor;
pub mod key;
mod registry;
mod table;

#[cfg(feature = "dummy")]
pub use compiler::DummyShaderCompiler;
pub use compiler::{CompileRequest, CompiledProgram, ParameterLayout, ShaderCompiler};
pub use config::{MissPolicy, TechniqueConfig};
pub use descriptor::{RenderPass, TechniqueDescriptor, TechniqueRow};
pub use key::TechniqueKey;
pub use registry::TechniqueRegistry;
pub use table::{Resolution, TechniqueTable};
