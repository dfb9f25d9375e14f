//! Owner-type routing.

use crate::{
    models::owner::OwnerKind,
    services::{error::CatalogResult, owner_adapter::OwnerAdapter},
};

/// Adapters for every owner kind, built once at startup.
#[derive(Debug, Clone)]
pub struct OwnerRegistry {
    adapters: [OwnerAdapter; OwnerKind::COUNT],
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self {
            adapters: OwnerKind::ALL.map(OwnerAdapter::new),
        }
    }

    /// `ALL` lists kinds in declaration order, so the discriminant is the index.
    pub fn adapter(&self, kind: OwnerKind) -> OwnerAdapter {
        self.adapters[kind as usize]
    }

    /// Resolve a wire tag. Unknown tags fail with `UnknownOwnerType`.
    pub fn resolve(&self, tag: &str) -> CatalogResult<OwnerAdapter> {
        let kind: OwnerKind = tag.parse()?;
        Ok(self.adapter(kind))
    }
}

impl Default for OwnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
