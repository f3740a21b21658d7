use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields identifying a searched company. A stored record matching both
/// fields exactly means the company has already been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyKey {
    pub company_name: String,
    pub company_url: String,
}

impl CompanyKey {
    pub fn new(company_name: &str, company_url: &str) -> Self {
        Self {
            company_name: company_name.to_string(),
            company_url: company_url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStub {
    pub profile_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the employee-listing endpoint. `employees` is the only field we
/// rely on; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeListing {
    pub employees: Vec<EmployeeStub>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub company_url: String,
    pub employees: Vec<EmployeeStub>,
    pub date_searched: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompanyRecord {
    pub fn new(key: CompanyKey, listing: EmployeeListing, date_searched: DateTime<Utc>) -> Self {
        let mut extra = listing.extra;
        // Key fields and the timestamp win over anything the provider sent
        for field in ["company_name", "company_url", "date_searched"] {
            extra.remove(field);
        }

        Self {
            company_name: key.company_name,
            company_url: key.company_url,
            employees: listing.employees,
            date_searched,
            extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile_url: String,
    pub date_searched: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileRecord {
    pub fn new(profile_url: &str, mut profile: Map<String, Value>, date_searched: DateTime<Utc>) -> Self {
        profile.remove("profile_url");
        profile.remove("date_searched");

        Self {
            profile_url: profile_url.to_string(),
            date_searched,
            extra: profile,
        }
    }
}
