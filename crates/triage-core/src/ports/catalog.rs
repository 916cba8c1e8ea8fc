//! ReferenceCatalog port - what the item/coupon/address experts consult.

use async_trait::async_trait;

use super::system_of_record::LookupError;

/// Which reference set a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    MenuItem,
    Coupon,
    Address,
}

/// Catalog answer for one code.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub code: String,
    /// Currently orderable / redeemable / deliverable.
    pub available: bool,
    /// Suggested replacements when not available.
    pub alternatives: Vec<String>,
}

/// Read-only reference data used during investigation.
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    /// `None` when the code does not exist at all.
    async fn lookup(&self, kind: CatalogKind, code: &str)
        -> Result<Option<CatalogEntry>, LookupError>;

    /// Is the store currently accepting orders? Used by the store-closed
    /// expert; `Err` becomes an `error`-status check, not an abort.
    async fn store_open(&self) -> Result<bool, LookupError>;
}
