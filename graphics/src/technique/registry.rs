//! Process-wide technique tables, one per material type.

use std::sync::OnceLock;

use crate::error::GraphicsError;

use super::config::TechniqueConfig;
use super::descriptor::TechniqueRow;
use super::key::TechniqueKey;
use super::table::TechniqueTable;

/// Lazily built, shared technique table.
///
/// Declared as a `static` next to the material that owns it. The table is
/// built and validated on first access; every instance of the material then
/// shares it, including the compiled state of its rows.
///
/// ```ignore
/// static TECHNIQUES: TechniqueRegistry<StandardFeatures> =
///     TechniqueRegistry::new("StandardMaterial", standard_rows);
///
/// let table = TECHNIQUES.table()?;
/// ```
pub struct TechniqueRegistry<K: TechniqueKey> {
    name: &'static str,
    rows: fn() -> Vec<TechniqueRow>,
    table: OnceLock<Result<TechniqueTable<K>, GraphicsError>>,
}

impl<K: TechniqueKey> TechniqueRegistry<K> {
    pub const fn new(name: &'static str, rows: fn() -> Vec<TechniqueRow>) -> Self {
        Self {
            name,
            rows,
            table: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The shared table, built on first call.
    ///
    /// A table that fails validation keeps failing with the same error.
    pub fn table(&self) -> Result<&TechniqueTable<K>, GraphicsError> {
        self.table
            .get_or_init(|| {
                TechniqueTable::build(self.name, (self.rows)(), TechniqueConfig::default())
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}
