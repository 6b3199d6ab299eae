//! Feature keys identifying technique rows.
//!
//! A key is a small set of feature flags. Each material declares the order
//! of its feature tokens; concatenating the tokens of the set flags in that
//! order gives the canonical row name ("LADVT", "GDN"). An empty set has an
//! explicit name such as "Simple" or "None".

use std::fmt::Debug;
use std::hash::Hash;

use bitflags::Flags;

/// Key type of a technique table.
pub trait TechniqueKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Canonical display name of this key.
    fn canonical_name(&self) -> String;

    /// Parse a canonical name back into a key.
    fn parse(name: &str) -> Option<Self>;

    /// Whether every feature of `self` is also set in `other`.
    fn is_subset_of(&self, other: &Self) -> bool;

    /// Number of features set.
    fn feature_count(&self) -> u32;

    /// Whether a material could produce this combination at all.
    fn is_well_formed(&self) -> bool {
        true
    }
}

/// Concatenate the tokens of the flags set in `features`, in token order.
pub fn flags_name<F: Flags + Copy>(features: F, tokens: &[(F, &str)], empty_name: &str) -> String {
    if features.is_empty() {
        return empty_name.to_string();
    }

    tokens
        .iter()
        .filter(|(flag, _)| features.contains(*flag))
        .map(|(_, token)| *token)
        .collect()
}

/// Inverse of [`flags_name`].
///
/// Tokens are consumed greedily in declaration order, so each token may
/// appear at most once and only in its declared position.
pub fn flags_parse<F: Flags + Copy>(name: &str, tokens: &[(F, &str)], empty_name: &str) -> Option<F> {
    if name == empty_name {
        return Some(F::empty());
    }
    if name.is_empty() {
        return None;
    }

    let mut features = F::empty();
    let mut rest = name;
    for (flag, token) in tokens {
        if let Some(tail) = rest.strip_prefix(token) {
            features.insert(*flag);
            rest = tail;
        }
    }

    rest.is_empty().then_some(features)
}

/// Number of token flags set in `features`.
pub fn flags_count<F: Flags + Copy>(features: F, tokens: &[(F, &str)]) -> u32 {
    tokens.iter().filter(|(flag, _)| features.contains(*flag)).count() as u32
}
