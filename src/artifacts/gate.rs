//! Prerequisite gate.
//!
//! Pure checks of a brand snapshot against an artifact's declared
//! dependencies. Nothing here loads or writes storage.

use serde::Serialize;

use crate::brand::{Brand, BrandField};

use super::registry::{ArtifactKind, Dependency};

/// Outcome of [`check_prerequisites`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "missing", rename_all = "snake_case")]
pub enum Prerequisites {
    Satisfied,
    /// Every unmet dependency, in declaration order. Never empty.
    Missing(Vec<BrandField>),
}

impl Prerequisites {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Check `brand` against every dependency declared for `kind`.
pub fn check_prerequisites(brand: &Brand, kind: ArtifactKind) -> Prerequisites {
    let missing = unmet(kind.descriptor().dependencies, brand);
    if missing.is_empty() {
        Prerequisites::Satisfied
    } else {
        Prerequisites::Missing(missing)
    }
}

/// Fields of `dependencies` that do not hold against `brand`.
pub fn unmet(dependencies: &[Dependency], brand: &Brand) -> Vec<BrandField> {
    dependencies
        .iter()
        .filter(|d| !d.holds(brand))
        .map(|d| d.field())
        .collect()
}
