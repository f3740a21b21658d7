use anyhow::Result;

use crate::models::{CompanyKey, CompanyRecord, ProfileRecord};

/// Persistent cache of searched companies and profiles.
///
/// Lookups are exact matches on the cache key. Nothing is ever updated or
/// deleted, and no uniqueness is enforced: callers check before inserting.
pub trait Store {
    fn has_company(&self, key: &CompanyKey) -> Result<bool>;

    fn insert_company(&self, record: &CompanyRecord) -> Result<()>;

    /// Every stored company, oldest first.
    fn companies(&self) -> Result<Vec<CompanyRecord>>;

    fn has_profile(&self, profile_url: &str) -> Result<bool>;

    fn insert_profile(&self, record: &ProfileRecord) -> Result<()>;

    fn profile_count(&self) -> Result<u64>;
}
