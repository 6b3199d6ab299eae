//! Technique rows and their lazily compiled descriptors.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::mesh::{VertexFormat, VertexLayout};
use crate::shader::{ShaderEntry, ShaderStage, build_defines};

use super::compiler::{CompileRequest, CompiledProgram, ParameterLayout, ShaderCompiler};
use super::key::TechniqueKey;

/// Rendering pass a material is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderPass {
    /// Final lit color is computed directly.
    #[default]
    Forward,
    /// Surface attributes are written for deferred lighting.
    GBuffer,
}

/// Static declaration of one shader variant.
///
/// Rows are declared by canonical name; the owning table parses the name
/// into the material's feature key.
#[derive(Debug, Clone)]
pub struct TechniqueRow {
    pub name: &'static str,
    pub vertex: ShaderEntry,
    pub fragment: ShaderEntry,
    pub vertex_format: VertexFormat,
    pub vertex_defines: Vec<&'static str>,
    pub fragment_defines: Vec<&'static str>,
    pub parameters: Option<ParameterLayout>,
}

impl TechniqueRow {
    /// Row without defines or parameter block.
    pub fn new(
        name: &'static str,
        vertex: ShaderEntry,
        fragment: ShaderEntry,
        vertex_format: VertexFormat,
    ) -> Self {
        Self {
            name,
            vertex,
            fragment,
            vertex_format,
            vertex_defines: Vec::new(),
            fragment_defines: Vec::new(),
            parameters: None,
        }
    }

    #[must_use]
    pub fn with_vertex_defines(mut self, defines: impl IntoIterator<Item = &'static str>) -> Self {
        self.vertex_defines = defines.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_fragment_defines(
        mut self,
        defines: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        self.fragment_defines = defines.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterLayout) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A row of a technique table together with its compiled program.
///
/// Everything except the compiled program is immutable. The program slot
/// moves from empty to filled once and never back.
#[derive(Debug)]
pub struct TechniqueDescriptor<K> {
    key: K,
    row: TechniqueRow,
    compiled: OnceLock<CompiledProgram>,
    compile_lock: Mutex<()>,
}

impl<K: TechniqueKey> TechniqueDescriptor<K> {
    pub(crate) fn new(key: K, row: TechniqueRow) -> Self {
        Self {
            key,
            row,
            compiled: OnceLock::new(),
            compile_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> K {
        self.key
    }

    /// Display name, e.g. "LADVT".
    pub fn name(&self) -> &'static str {
        self.row.name
    }

    pub fn vertex(&self) -> ShaderEntry {
        self.row.vertex
    }

    pub fn fragment(&self) -> ShaderEntry {
        self.row.fragment
    }

    pub fn vertex_format(&self) -> VertexFormat {
        self.row.vertex_format
    }

    pub fn vertex_layout(&self) -> &'static VertexLayout {
        self.row.vertex_format.layout()
    }

    pub fn vertex_defines(&self) -> &[&'static str] {
        &self.row.vertex_defines
    }

    pub fn fragment_defines(&self) -> &[&'static str] {
        &self.row.fragment_defines
    }

    pub fn parameters(&self) -> Option<ParameterLayout> {
        self.row.parameters
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// The compiled program, if this row has been selected before.
    pub fn program(&self) -> Option<&CompiledProgram> {
        self.compiled.get()
    }

    /// Compile this row unless it already is.
    ///
    /// Concurrent callers block on the first compilation and then observe
    /// its result. A failed compilation leaves the row uncompiled.
    pub fn ensure_compiled(
        &self,
        table: &'static str,
        compiler: &dyn ShaderCompiler,
    ) -> Result<&CompiledProgram, GraphicsError> {
        if let Some(program) = self.compiled.get() {
            return Ok(program);
        }

        let _guard = self.compile_lock.lock();
        if let Some(program) = self.compiled.get() {
            return Ok(program);
        }

        let request = CompileRequest {
            table,
            technique: self.row.name,
            vertex: self.row.vertex,
            fragment: self.row.fragment,
            vertex_layout: self.vertex_layout(),
            vertex_defines: build_defines(ShaderStage::Vertex, &self.row.vertex_defines),
            fragment_defines: build_defines(ShaderStage::Fragment, &self.row.fragment_defines),
            parameters: self.row.parameters,
        };

        let program = compiler.compile(&request)?;
        log::debug!("Compiled technique {} (program {})", request.label(), program.id);
        verdant_core::profile_message!("technique compiled");

        Ok(self.compiled.get_or_init(|| program))
    }
}
