use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::sync::{Client, Collection};
use serde::Serialize;

use crate::models::{CompanyKey, CompanyRecord, ProfileRecord};
use crate::store::Store;

pub const DEFAULT_DATABASE: &str = "biotechs";

/// MongoDB-backed store using the blocking driver. The client is opened once
/// and held for the life of the process.
pub struct MongoStore {
    companies: Collection<Document>,
    employees: Collection<Document>,
}

impl MongoStore {
    pub fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).context("Failed to connect to MongoDB")?;
        let db = client.database(database);
        Ok(Self {
            companies: db.collection::<Document>("companies"),
            employees: db.collection::<Document>("employees"),
        })
    }
}

impl Store for MongoStore {
    fn has_company(&self, key: &CompanyKey) -> Result<bool> {
        let filter = doc! {
            "company_name": key.company_name.as_str(),
            "company_url": key.company_url.as_str(),
        };
        let found = self
            .companies
            .find_one(filter, None)
            .context("Failed to query companies collection")?;
        Ok(found.is_some())
    }

    fn insert_company(&self, record: &CompanyRecord) -> Result<()> {
        let document = to_document(record, record.date_searched)?;
        self.companies
            .insert_one(document, None)
            .context("Failed to insert company")?;
        Ok(())
    }

    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        let cursor = self
            .companies
            .find(None, oldest_first())
            .context("Failed to query companies collection")?;

        let mut records = Vec::new();
        for document in cursor {
            let document = document.context("Failed to read company document")?;
            records.push(from_document(document)?);
        }
        Ok(records)
    }

    fn has_profile(&self, profile_url: &str) -> Result<bool> {
        let found = self
            .employees
            .find_one(doc! { "profile_url": profile_url }, None)
            .context("Failed to query employees collection")?;
        Ok(found.is_some())
    }

    fn insert_profile(&self, record: &ProfileRecord) -> Result<()> {
        let document = to_document(record, record.date_searched)?;
        self.employees
            .insert_one(document, None)
            .context("Failed to insert profile")?;
        Ok(())
    }

    fn profile_count(&self) -> Result<u64> {
        self.employees
            .count_documents(None, None)
            .context("Failed to count employees collection")
    }
}

// ObjectIds grow with insertion time
fn oldest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

/// Serializes a record, storing `date_searched` as a native BSON datetime.
fn to_document<T: Serialize>(record: &T, date_searched: DateTime<Utc>) -> Result<Document> {
    let mut document = bson::to_document(record)?;
    document.insert(
        "date_searched",
        bson::DateTime::from_millis(date_searched.timestamp_millis()),
    );
    Ok(document)
}

fn from_document(mut document: Document) -> Result<CompanyRecord> {
    document.remove("_id");

    if let Some(Bson::DateTime(searched)) = document.get("date_searched").cloned() {
        let searched = DateTime::<Utc>::from_timestamp_millis(searched.timestamp_millis())
            .ok_or_else(|| anyhow!("date_searched out of range"))?;
        document.insert("date_searched", searched.to_rfc3339());
    }

    let value = Bson::Document(document).into_relaxed_extjson();
    serde_json::from_value(value).context("Corrupt company document")
}
