use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::models::{CompanyKey, CompanyRecord, ProfileRecord};
use crate::store::Store;

/// SQLite-backed store. Each record is kept as its full JSON document next
/// to the key columns used for lookups.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Self { conn, path };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "prospect") {
            Ok(proj_dirs.data_dir().join("prospect.db"))
        } else {
            Ok(PathBuf::from("prospect.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                company_url TEXT NOT NULL,
                document TEXT NOT NULL,
                date_searched TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS employees (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_url TEXT NOT NULL,
                document TEXT NOT NULL,
                date_searched TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_companies_key ON companies(company_name, company_url);
            CREATE INDEX IF NOT EXISTS idx_employees_url ON employees(profile_url);
            "#,
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn profile(&self, profile_url: &str) -> Result<Option<ProfileRecord>> {
        let result = self.conn.query_row(
            "SELECT document FROM employees WHERE profile_url = ?1 ORDER BY id LIMIT 1",
            [profile_url],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Store for Database {
    fn has_company(&self, key: &CompanyKey) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM companies WHERE company_name = ?1 AND company_url = ?2",
            params![key.company_name, key.company_url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_company(&self, record: &CompanyRecord) -> Result<()> {
        let document = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO companies (company_name, company_url, document, date_searched)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.company_name,
                record.company_url,
                document,
                record.date_searched.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM companies ORDER BY id")?;
        let documents = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list companies")?;

        documents
            .iter()
            .map(|doc| serde_json::from_str::<CompanyRecord>(doc).context("Corrupt company document"))
            .collect()
    }

    fn has_profile(&self, profile_url: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM employees WHERE profile_url = ?1",
            [profile_url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_profile(&self, record: &ProfileRecord) -> Result<()> {
        let document = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO employees (profile_url, document, date_searched) VALUES (?1, ?2, ?3)",
            params![record.profile_url, document, record.date_searched.to_rfc3339()],
        )?;
        Ok(())
    }

    fn profile_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
