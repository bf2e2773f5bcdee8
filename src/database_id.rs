//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
/// The ID of a product in the catalog.
pub type ProductID = DatabaseID;
/// The ID of a row in the stock ledger.
pub type LedgerEntryID = DatabaseID;
