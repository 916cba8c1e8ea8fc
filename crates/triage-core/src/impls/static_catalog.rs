//! Fixed reference catalog for tests and the demo wiring.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::ports::{CatalogEntry, CatalogKind, LookupError, ReferenceCatalog};

pub struct StaticCatalog {
    entries: HashMap<(CatalogKind, String), CatalogEntry>,
    store_open: bool,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            store_open: true,
        }
    }

    pub fn with_entry(mut self, kind: CatalogKind, entry: CatalogEntry) -> Self {
        self.entries.insert((kind, entry.code.clone()), entry);
        self
    }

    pub fn with_store_open(mut self, open: bool) -> Self {
        self.store_open = open;
        self
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceCatalog for StaticCatalog {
    async fn lookup(
        &self,
        kind: CatalogKind,
        code: &str,
    ) -> Result<Option<CatalogEntry>, LookupError> {
        Ok(self.entries.get(&(kind, code.to_string())).cloned())
    }

    async fn store_open(&self) -> Result<bool, LookupError> {
        Ok(self.store_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_is_scoped_by_kind() {
        let catalog = StaticCatalog::new().with_entry(
            CatalogKind::MenuItem,
            CatalogEntry {
                code: "P12".to_string(),
                available: true,
                alternatives: vec![],
            },
        );
        assert!(catalog
            .lookup(CatalogKind::MenuItem, "P12")
            .await
            .unwrap()
            .is_some());
        assert!(catalog
            .lookup(CatalogKind::Coupon, "P12")
            .await
            .unwrap()
            .is_none());
    }
}
