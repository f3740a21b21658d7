use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::config::{CompanyTarget, Config};
use crate::models::{CompanyKey, CompanyRecord, ProfileRecord};
use crate::provider::Provider;
use crate::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub fetched: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub companies: SearchStats,
    pub profile_urls: usize,
    pub profiles: SearchStats,
}

/// Looks up companies and profiles through a provider, using the store as a
/// permanent cache so that each company and profile is paid for once.
pub struct Searcher<P, S> {
    provider: P,
    store: S,
}

impl<P: Provider, S: Store> Searcher<P, S> {
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches the employee listing of every company not already stored
    /// under the same name and URL.
    pub fn search_employee_listing(
        &self,
        companies: &[CompanyTarget],
        employment_status: &str,
    ) -> Result<SearchStats> {
        let mut stats = SearchStats::default();

        for company in companies {
            let key = CompanyKey::new(&company.name, &company.url);

            if self.store.has_company(&key)? {
                info!("{} already in collection", company.name);
                stats.skipped += 1;
                continue;
            }

            let listing = self
                .provider
                .employee_listing(&company.url, employment_status)?;
            let record = CompanyRecord::new(key, listing, Utc::now());

            info!(
                "{} - fetched data on {} employees",
                company.name,
                record.employees.len()
            );

            self.store.insert_company(&record)?;
            stats.fetched += 1;
        }

        Ok(stats)
    }

    /// Fetches every profile not already stored. Repeated URLs are fetched
    /// at most once since the first fetch lands in the store.
    pub fn search_profile_details(&self, profile_urls: &[String]) -> Result<SearchStats> {
        let mut stats = SearchStats::default();

        for profile_url in profile_urls {
            if self.store.has_profile(profile_url)? {
                info!("URL already in database: {}", profile_url);
                stats.skipped += 1;
                continue;
            }

            let profile = self.provider.profile_details(profile_url)?;
            let record = ProfileRecord::new(profile_url, profile, Utc::now());
            self.store.insert_profile(&record)?;

            info!("Stored profile: {}", profile_url);
            stats.fetched += 1;
        }

        Ok(stats)
    }

    /// Profile URLs of every employee of every stored company, including
    /// companies cached by earlier runs.
    pub fn stored_employee_urls(&self) -> Result<Vec<String>> {
        Ok(employee_urls(&self.store.companies()?))
    }

    pub fn run(&self, config: &Config) -> Result<RunSummary> {
        let companies =
            self.search_employee_listing(&config.companies, &config.employment_status)?;

        let urls = self.stored_employee_urls()?;
        info!("Searching {} employee profiles", urls.len());
        let profiles = self.search_profile_details(&urls)?;

        Ok(RunSummary {
            companies,
            profile_urls: urls.len(),
            profiles,
        })
    }
}

/// Flattens employee profile URLs in record order, keeping duplicates.
pub fn employee_urls(companies: &[CompanyRecord]) -> Vec<String> {
    companies
        .iter()
        .flat_map(|company| company.employees.iter())
        .map(|employee| employee.profile_url.clone())
        .collect()
}
