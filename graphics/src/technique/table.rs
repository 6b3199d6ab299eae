//! Technique tables: the ordered catalog of a material's shader variants.

use std::collections::HashMap;

use parking_lot::RwLock;
use verdant_core::profile_function;

use crate::error::GraphicsError;

use super::compiler::ShaderCompiler;
use super::config::{MissPolicy, TechniqueConfig};
use super::descriptor::{TechniqueDescriptor, TechniqueRow};
use super::key::TechniqueKey;

/// Outcome of looking a key up in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Index of the chosen row.
    pub index: usize,
    /// Whether the row's key equals the requested key.
    pub exact: bool,
}

/// Ordered, validated catalog of technique rows keyed by feature set.
///
/// Row 0 is the default row. Rows never change after construction except
/// for their one-way compiled state.
#[derive(Debug)]
pub struct TechniqueTable<K: TechniqueKey> {
    name: &'static str,
    rows: Vec<TechniqueDescriptor<K>>,
    index: HashMap<K, usize>,
    config: TechniqueConfig,
    misses: RwLock<HashMap<K, usize>>,
}

impl<K: TechniqueKey> TechniqueTable<K> {
    /// Build a table from rows declared by canonical name.
    ///
    /// Fails if the table is empty, a row name does not parse into a
    /// canonical key, or two rows share a key.
    pub fn build(
        name: &'static str,
        rows: impl IntoIterator<Item = TechniqueRow>,
        config: TechniqueConfig,
    ) -> Result<Self, GraphicsError> {
        let mut descriptors = Vec::new();
        let mut index = HashMap::new();

        for row in rows {
            let key = K::parse(row.name)
                .filter(|key| key.canonical_name() == row.name)
                .ok_or_else(|| GraphicsError::InvalidTechniqueKey {
                    table: name,
                    key: row.name.to_string(),
                })?;

            if index.insert(key, descriptors.len()).is_some() {
                return Err(GraphicsError::DuplicateTechniqueKey {
                    table: name,
                    key: row.name.to_string(),
                });
            }

            descriptors.push(TechniqueDescriptor::new(key, row));
        }

        if descriptors.is_empty() {
            return Err(GraphicsError::EmptyTechniqueTable(name));
        }

        log::debug!("Built technique table {} with {} rows", name, descriptors.len());

        Ok(Self {
            name,
            rows: descriptors,
            index,
            config,
            misses: RwLock::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> TechniqueConfig {
        self.config
    }

    /// Number of rows. Always at least one.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TechniqueDescriptor<K>] {
        &self.rows
    }

    /// The default row (index 0).
    pub fn default_row(&self) -> &TechniqueDescriptor<K> {
        &self.rows[0]
    }

    /// Row with exactly this key.
    pub fn find(&self, key: K) -> Option<&TechniqueDescriptor<K>> {
        self.index.get(&key).map(|&i| &self.rows[i])
    }

    /// Row with this display name.
    pub fn by_name(&self, name: &str) -> Option<&TechniqueDescriptor<K>> {
        self.rows.iter().find(|row| row.name() == name)
    }

    /// Number of rows compiled so far.
    pub fn compiled_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_compiled()).count()
    }

    /// Map a key to a row index according to the miss policy.
    ///
    /// Malformed keys are a bug in the material's feature extraction: they
    /// panic in debug builds and resolve to row 0 in release builds.
    pub fn resolve(&self, key: K) -> Result<Resolution, GraphicsError> {
        debug_assert!(
            key.is_well_formed(),
            "malformed technique key {key:?} for table {}",
            self.name
        );
        if !key.is_well_formed() {
            log::warn!(
                "Technique table {}: malformed key {:?}, using {}",
                self.name,
                key,
                self.rows[0].name()
            );
            return Ok(Resolution {
                index: 0,
                exact: false,
            });
        }

        if let Some(&index) = self.index.get(&key) {
            return Ok(Resolution { index, exact: true });
        }

        let index = match self.config.miss_policy {
            MissPolicy::Strict => {
                return Err(GraphicsError::TechniqueNotFound {
                    table: self.name,
                    key: key.canonical_name(),
                });
            }
            MissPolicy::DefaultRow => self.remember_miss(key, |_| 0),
            MissPolicy::NearestSubset => self.remember_miss(key, |table| table.nearest_subset(key)),
        };

        Ok(Resolution {
            index,
            exact: false,
        })
    }

    /// Resolve `key` and make sure the chosen row is compiled.
    pub fn select(
        &self,
        key: K,
        compiler: &dyn ShaderCompiler,
    ) -> Result<&TechniqueDescriptor<K>, GraphicsError> {
        profile_function!();

        let resolution = self.resolve(key)?;
        let row = &self.rows[resolution.index];
        row.ensure_compiled(self.name, compiler)?;
        Ok(row)
    }

    /// Compile the default row so a valid technique exists before any
    /// selection happens.
    pub fn prepare_default(
        &self,
        compiler: &dyn ShaderCompiler,
    ) -> Result<&TechniqueDescriptor<K>, GraphicsError> {
        let row = self.default_row();
        row.ensure_compiled(self.name, compiler)?;
        Ok(row)
    }

    fn remember_miss(&self, key: K, choose: impl FnOnce(&Self) -> usize) -> usize {
        if let Some(&index) = self.misses.read().get(&key) {
            return index;
        }

        let mut misses = self.misses.write();
        *misses.entry(key).or_insert_with(|| {
            let index = choose(self);
            if self.config.warn_on_miss {
                log::warn!(
                    "Technique table {}: no row for {}, using {}",
                    self.name,
                    key.canonical_name(),
                    self.rows[index].name()
                );
            }
            index
        })
    }

    fn nearest_subset(&self, key: K) -> usize {
        let mut best: Option<(usize, u32)> = None;
        for (index, row) in self.rows.iter().enumerate() {
            let row_key = row.key();
            if !row_key.is_subset_of(&key) {
                continue;
            }
            let count = row_key.feature_count();
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((index, count)),
            }
        }
        best.map_or(0, |(index, _)| index)
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::mesh::VertexFormat;
    use crate::shader::ShaderEntry;
    use crate::technique::DummyShaderCompiler;
    use crate::technique::key::{flags_count, flags_name, flags_parse};

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        struct Probe: u8 {
            const LIT = 1 << 0;
            const DIFFUSE = 1 << 1;
            const VCOLOR = 1 << 2;
            const ALPHA_TEST = 1 << 3;
            const GBUFFER = 1 << 4;
        }
    }

    const TOKENS: &[(Probe, &str)] = &[
        (Probe::LIT, "L"),
        (Probe::DIFFUSE, "D"),
        (Probe::VCOLOR, "V"),
        (Probe::ALPHA_TEST, "T"),
        (Probe::GBUFFER, "G"),
    ];

    impl TechniqueKey for Probe {
        fn canonical_name(&self) -> String {
            flags_name(*self, TOKENS, "Simple")
        }

        fn parse(name: &str) -> Option<Self> {
            flags_parse(name, TOKENS, "Simple")
        }

        fn is_subset_of(&self, other: &Self) -> bool {
            other.contains(*self)
        }

        fn feature_count(&self) -> u32 {
            flags_count(*self, TOKENS)
        }

        fn is_well_formed(&self) -> bool {
            !self.contains(Probe::GBUFFER) || *self == Probe::GBUFFER
        }
    }

    const VS: ShaderEntry = ShaderEntry::new("Probe", "vsProbe");
    const PS: ShaderEntry = ShaderEntry::new("Probe", "psProbe");

    fn row(name: &'static str) -> TechniqueRow {
        TechniqueRow::new(name, VS, PS, VertexFormat::PositionTexture)
    }

    fn table(names: &[&'static str], config: TechniqueConfig) -> TechniqueTable<Probe> {
        TechniqueTable::build("Probe", names.iter().map(|n| row(n)), config).unwrap()
    }

    #[test]
    fn test_exact_lookup() {
        let table = table(&["Simple", "L", "LD", "LDV"], TechniqueConfig::default());
        let resolution = table.resolve(Probe::LIT | Probe::DIFFUSE).unwrap();
        assert_eq!(resolution, Resolution { index: 2, exact: true });
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let err = TechniqueTable::<Probe>::build(
            "Probe",
            [row("Simple"), row("G"), row("G")],
            TechniqueConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphicsError::DuplicateTechniqueKey {
                table: "Probe",
                key: "G".to_string()
            }
        );
    }

    #[test]
    fn test_non_canonical_name_is_rejected() {
        let err = TechniqueTable::<Probe>::build("Probe", [row("DL")], TechniqueConfig::default())
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidTechniqueKey { .. }));
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let err = TechniqueTable::<Probe>::build("Probe", [], TechniqueConfig::default()).unwrap_err();
        assert_eq!(err, GraphicsError::EmptyTechniqueTable("Probe"));
    }

    #[test]
    fn test_nearest_subset_prefers_most_features() {
        let table = table(&["Simple", "L", "LD", "D", "T"], TechniqueConfig::default());
        let resolution = table.resolve(Probe::LIT | Probe::DIFFUSE | Probe::ALPHA_TEST).unwrap();
        assert_eq!(resolution, Resolution { index: 2, exact: false });
    }

    #[test]
    fn test_nearest_subset_tie_keeps_first_row() {
        let table = table(&["Simple", "D", "L"], TechniqueConfig::default());
        let resolution = table.resolve(Probe::LIT | Probe::DIFFUSE).unwrap();
        assert_eq!(resolution.index, 1);
    }

    #[test]
    fn test_default_row_policy() {
        let config = TechniqueConfig::default().with_miss_policy(MissPolicy::DefaultRow);
        let table = table(&["Simple", "L", "LD"], config);
        let resolution = table.resolve(Probe::LIT | Probe::VCOLOR).unwrap();
        assert_eq!(resolution, Resolution { index: 0, exact: false });
    }

    #[test]
    fn test_strict_policy_reports_missing_key() {
        let config = TechniqueConfig::default().with_miss_policy(MissPolicy::Strict);
        let table = table(&["Simple", "L"], config);
        let err = table.resolve(Probe::DIFFUSE | Probe::VCOLOR).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::TechniqueNotFound {
                table: "Probe",
                key: "DV".to_string()
            }
        );
    }

    #[test]
    fn test_select_compiles_each_row_once() {
        let table = table(&["Simple", "L", "LD"], TechniqueConfig::default());
        let compiler = DummyShaderCompiler::new();

        for _ in 0..5 {
            table.select(Probe::LIT, &compiler).unwrap();
            table.select(Probe::LIT | Probe::DIFFUSE, &compiler).unwrap();
        }

        assert_eq!(compiler.compile_count(), 2);
        assert_eq!(table.compiled_count(), 2);
        assert!(!table.default_row().is_compiled());
    }

    #[test]
    fn test_misses_share_the_fallback_compilation() {
        let table = table(&["Simple", "L"], TechniqueConfig::default());
        let compiler = DummyShaderCompiler::new();

        let a = table.select(Probe::LIT | Probe::VCOLOR, &compiler).unwrap().name();
        let b = table.select(Probe::LIT | Probe::ALPHA_TEST, &compiler).unwrap().name();

        assert_eq!(a, "L");
        assert_eq!(b, "L");
        assert_eq!(compiler.compile_count(), 1);
    }

    #[test]
    fn test_failed_compilation_can_be_retried() {
        let table = table(&["Simple", "L"], TechniqueConfig::default());
        let failing = DummyShaderCompiler::new().with_failure("Probe/L");

        let err = table.select(Probe::LIT, &failing).unwrap_err();
        assert!(matches!(err, GraphicsError::ShaderCompilationFailed(_)));
        assert!(!table.find(Probe::LIT).unwrap().is_compiled());

        let working = DummyShaderCompiler::new();
        table.select(Probe::LIT, &working).unwrap();
        assert!(table.find(Probe::LIT).unwrap().is_compiled());
    }

    #[test]
    fn test_prepare_default_compiles_row_zero() {
        let table = table(&["Simple", "L"], TechniqueConfig::default());
        let compiler = DummyShaderCompiler::new();

        let row = table.prepare_default(&compiler).unwrap();
        assert_eq!(row.name(), "Simple");
        assert_eq!(compiler.compiled_labels(), vec!["Probe/Simple".to_string()]);
    }

    #[test]
    fn test_concurrent_selection_compiles_once() {
        let table = table(&["Simple", "L", "LD"], TechniqueConfig::default());
        let compiler = DummyShaderCompiler::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        table.select(Probe::LIT | Probe::DIFFUSE, &compiler).unwrap();
                    }
                });
            }
        });

        assert_eq!(compiler.compile_count(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "malformed technique key")]
    fn test_malformed_key_panics_in_debug() {
        let table = table(&["Simple", "G"], TechniqueConfig::default());
        let _ = table.resolve(Probe::GBUFFER | Probe::LIT);
    }
}
