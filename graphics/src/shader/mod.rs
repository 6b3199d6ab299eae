//! Shader stage entry points and preprocessor defines.

/// Shader stage in the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl ShaderStage {
    /// The define every stage is compiled with.
    pub fn define(&self) -> &'static str {
        match self {
            Self::Vertex => "VERTEX",
            Self::Fragment => "FRAGMENT",
        }
    }
}

/// Effect file plus entry point of one shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderEntry {
    /// Effect (shader source file) the entry point lives in.
    pub effect: &'static str,
    /// Entry point function name.
    pub entry_point: &'static str,
}

impl ShaderEntry {
    pub const fn new(effect: &'static str, entry_point: &'static str) -> Self {
        Self {
            effect,
            entry_point,
        }
    }
}

/// Build the defines list for a stage.
///
/// Returns `(name, value)` pairs. The stage define comes first, followed by
/// the variant's symbols in declaration order. Symbols carry an empty value.
pub fn build_defines(stage: ShaderStage, symbols: &[&str]) -> Vec<(String, String)> {
    let mut defines = Vec::with_capacity(symbols.len() + 1);
    defines.push((stage.define().to_string(), String::new()));
    defines.extend(symbols.iter().map(|s| (s.to_string(), String::new())));
    defines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_define_comes_first() {
        let defines = build_defines(ShaderStage::Fragment, &["LIT", "DIFF"]);
        let names: Vec<&str> = defines.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["FRAGMENT", "LIT", "DIFF"]);
        assert!(defines.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_no_symbols() {
        let defines = build_defines(ShaderStage::Vertex, &[]);
        assert_eq!(defines, vec![("VERTEX".to_string(), String::new())]);
    }
}
