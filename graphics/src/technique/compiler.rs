//! Shader compiler boundary.
//!
//! Turning a technique row into a GPU program is delegated to a
//! [`ShaderCompiler`]. The technique table only guarantees it asks for each
//! row at most once.

#[cfg(feature = "dummy")]
use std::collections::HashSet;
#[cfg(feature = "dummy")]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "dummy")]
use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::mesh::VertexLayout;
use crate::shader::ShaderEntry;

/// Size and name of the constant buffer a technique reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterLayout {
    pub name: &'static str,
    pub size: usize,
}

impl ParameterLayout {
    /// Layout of the `Pod` block `T`.
    pub const fn of<T>(name: &'static str) -> Self {
        Self {
            name,
            size: std::mem::size_of::<T>(),
        }
    }
}

/// Everything a compiler needs to build one technique row.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    /// Name of the owning technique table.
    pub table: &'static str,
    /// Row name, e.g. "LADVT".
    pub technique: &'static str,
    pub vertex: ShaderEntry,
    pub fragment: ShaderEntry,
    pub vertex_layout: &'a VertexLayout,
    /// Vertex stage defines including the stage define.
    pub vertex_defines: Vec<(String, String)>,
    /// Fragment stage defines including the stage define.
    pub fragment_defines: Vec<(String, String)>,
    /// Constant buffer bound while the row is compiled, if any.
    pub parameters: Option<ParameterLayout>,
}

impl CompileRequest<'_> {
    /// `Table/Technique` label used in logs.
    pub fn label(&self) -> String {
        format!("{}/{}", self.table, self.technique)
    }
}

/// Opaque handle to a compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledProgram {
    pub id: u64,
    pub label: String,
}

/// Compiles technique rows into programs.
pub trait ShaderCompiler: Send + Sync {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompiledProgram, GraphicsError>;
}

/// Compiler that produces placeholder programs and counts invocations.
#[cfg(feature = "dummy")]
#[derive(Debug, Default)]
pub struct DummyShaderCompiler {
    next_id: AtomicU64,
    compiled: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

#[cfg(feature = "dummy")]
impl DummyShaderCompiler {
    /// Create a new dummy compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every compilation of `table/technique` fail.
    #[must_use]
    pub fn with_failure(self, label: impl Into<String>) -> Self {
        self.failing.lock().insert(label.into());
        self
    }

    /// Number of successful compilations.
    pub fn compile_count(&self) -> usize {
        self.compiled.lock().len()
    }

    /// Labels of compiled rows in compilation order.
    pub fn compiled_labels(&self) -> Vec<String> {
        self.compiled.lock().clone()
    }
}

#[cfg(feature = "dummy")]
impl ShaderCompiler for DummyShaderCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompiledProgram, GraphicsError> {
        let label = request.label();
        if self.failing.lock().contains(&label) {
            return Err(GraphicsError::ShaderCompilationFailed(label));
        }

        log::trace!(
            "DummyShaderCompiler: compiling {} ({} vertex defines, {} fragment defines)",
            label,
            request.vertex_defines.len(),
            request.fragment_defines.len()
        );

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.compiled.lock().push(label.clone());
        Ok(CompiledProgram { id, label })
    }
}
