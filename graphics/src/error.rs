//! Graphics error types.

use std::fmt;

/// Errors raised while building technique tables, selecting variants and
/// managing material textures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// A technique table declares no rows.
    EmptyTechniqueTable(&'static str),
    /// Two rows of one technique table share a feature key.
    DuplicateTechniqueKey { table: &'static str, key: String },
    /// A declared row name does not parse into the table's feature tokens.
    InvalidTechniqueKey { table: &'static str, key: String },
    /// No row matches a key and the miss policy is strict.
    TechniqueNotFound { table: &'static str, key: String },
    /// The shader compiler rejected a variant.
    ShaderCompilationFailed(String),
    /// An empty texture was assigned to a slot that requires one.
    NullTexture(&'static str),
    /// The asset service could not load a path.
    AssetLoadFailed { path: String, reason: String },
    /// A path-driven operation ran before the material was initialized.
    NotInitialized(&'static str),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTechniqueTable(table) => write!(f, "technique table {table} has no rows"),
            Self::DuplicateTechniqueKey { table, key } => {
                write!(f, "technique table {table} declares key {key} twice")
            }
            Self::InvalidTechniqueKey { table, key } => {
                write!(f, "technique table {table} cannot parse key {key}")
            }
            Self::TechniqueNotFound { table, key } => {
                write!(f, "technique table {table} has no row for key {key}")
            }
            Self::ShaderCompilationFailed(msg) => write!(f, "shader compilation failed: {msg}"),
            Self::NullTexture(slot) => write!(f, "texture slot {slot} does not accept an empty texture"),
            Self::AssetLoadFailed { path, reason } => {
                write!(f, "failed to load asset {path}: {reason}")
            }
            Self::NotInitialized(what) => write!(f, "{what} used before initialization"),
        }
    }
}

impl std::error::Error for GraphicsError {}
