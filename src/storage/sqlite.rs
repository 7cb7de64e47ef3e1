//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DomainStore trait.

use crate::state::{Domain, DomainId, Header};
use crate::storage::schema::{initialize_schema, UNPROCESSED_PREDICATE};
use crate::storage::traits::{DomainStore, StoreError, StoreResult};
use crate::storage::DomainFilter;
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const DOMAIN_COLUMNS: &str = "d.id, d.name, d.parent_domain, d.skipped, d.last_checked";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        Self::from_connection(conn)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        initialize_schema(&conn)?;
        register_regexp(&conn)?;
        Ok(Self { conn })
    }

    fn load_headers(&self, domain_id: DomainId) -> StoreResult<Vec<Header>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT key, value FROM domain_headers WHERE domain_id = ?1 ORDER BY position",
        )?;

        let headers = stmt
            .query_map(params![domain_id], |row| {
                Ok(Header {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(headers)
    }

    /// Runs a domain query and attaches each row's headers
    fn query_domains(&self, sql: &str, values: &[Value]) -> StoreResult<Vec<Domain>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut domains = stmt
            .query_map(params_from_iter(values.iter()), domain_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for domain in &mut domains {
            if let Some(id) = domain.id {
                domain.headers = self.load_headers(id)?;
            }
        }

        Ok(domains)
    }
}

impl DomainStore for SqliteStore {
    // ===== Crawl Queries =====

    fn find_unprocessed(&self, limit: usize) -> StoreResult<Vec<Domain>> {
        let sql = format!(
            "SELECT {} FROM domains d WHERE {} ORDER BY d.id LIMIT ?",
            DOMAIN_COLUMNS, UNPROCESSED_PREDICATE
        );
        self.query_domains(&sql, &[Value::Integer(limit as i64)])
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Option<Domain>> {
        let sql = format!("SELECT {} FROM domains d WHERE d.name = ?1", DOMAIN_COLUMNS);
        let domain = self
            .conn
            .query_row(&sql, params![name], domain_from_row)
            .optional()?;

        match domain {
            Some(mut domain) => {
                if let Some(id) = domain.id {
                    domain.headers = self.load_headers(id)?;
                }
                Ok(Some(domain))
            }
            None => Ok(None),
        }
    }

    fn find_by_id(&self, id: DomainId) -> StoreResult<Domain> {
        let sql = format!("SELECT {} FROM domains d WHERE d.id = ?1", DOMAIN_COLUMNS);
        let mut domain = self
            .conn
            .query_row(&sql, params![id], domain_from_row)
            .optional()?
            .ok_or(StoreError::DomainNotFound(id))?;

        domain.headers = self.load_headers(id)?;
        Ok(domain)
    }

    fn insert(&mut self, domain: &Domain) -> StoreResult<DomainId> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO domains (name, parent_domain, skipped, last_checked) VALUES (?1, ?2, ?3, ?4)",
            params![
                domain.name,
                domain.parent_domain,
                domain.skipped,
                domain.last_checked.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| classify_write_error(e, &domain.name))?;

        let id = tx.last_insert_rowid();
        insert_headers(&tx, id, &domain.headers)?;
        tx.commit()?;

        Ok(id)
    }

    fn update_by_id(&mut self, id: DomainId, domain: &Domain) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        let updated = tx
            .execute(
                "UPDATE domains SET name = ?1, parent_domain = ?2, skipped = ?3, last_checked = ?4
                 WHERE id = ?5",
                params![
                    domain.name,
                    domain.parent_domain,
                    domain.skipped,
                    domain.last_checked.map(|t| t.to_rfc3339()),
                    id
                ],
            )
            .map_err(|e| classify_write_error(e, &domain.name))?;

        if updated == 0 {
            return Err(StoreError::DomainNotFound(id));
        }

        tx.execute(
            "DELETE FROM domain_headers WHERE domain_id = ?1",
            params![id],
        )?;
        insert_headers(&tx, id, &domain.headers)?;
        tx.commit()?;

        Ok(())
    }

    // ===== Browsing Queries =====

    fn find_page(
        &self,
        filter: &DomainFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Domain>> {
        let (predicate, mut values) = filter_clause(filter)?;
        let sql = format!(
            "SELECT {} FROM domains d WHERE {} ORDER BY d.id LIMIT ? OFFSET ?",
            DOMAIN_COLUMNS, predicate
        );
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(offset as i64));

        self.query_domains(&sql, &values)
    }

    fn count(&self, filter: &DomainFilter) -> StoreResult<u64> {
        let (predicate, values) = filter_clause(filter)?;
        let sql = format!("SELECT COUNT(*) FROM domains d WHERE {}", predicate);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn domain_from_row(row: &Row<'_>) -> rusqlite::Result<Domain> {
    let last_checked: Option<String> = row.get(4)?;

    Ok(Domain {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        parent_domain: row.get(2)?,
        skipped: row.get(3)?,
        last_checked: last_checked.and_then(|s| s.parse::<DateTime<Utc>>().ok()),
        headers: Vec::new(),
    })
}

fn insert_headers(conn: &Connection, domain_id: DomainId, headers: &[Header]) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO domain_headers (domain_id, position, key, value) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (position, header) in headers.iter().enumerate() {
        stmt.execute(params![domain_id, position as i64, header.key, header.value])?;
    }

    Ok(())
}

/// Maps a unique-name violation to `DuplicateName`
fn classify_write_error(err: rusqlite::Error, name: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                StoreError::DuplicateName(name.to_string())
            } else {
                StoreError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

/// Builds the WHERE predicate and its bound values for a filter
///
/// Patterns are compiled up front so a bad pattern is reported as
/// `InvalidPattern` instead of a failure inside SQLite.
fn filter_clause(filter: &DomainFilter) -> StoreResult<(String, Vec<Value>)> {
    for pattern in filter.patterns() {
        Regex::new(pattern).map_err(|e| StoreError::InvalidPattern(e.to_string()))?;
    }

    let clause = match filter {
        DomainFilter::All => ("1 = 1".to_string(), Vec::new()),
        DomainFilter::Checked => (
            format!("d.skipped = 0 AND NOT ({})", UNPROCESSED_PREDICATE),
            Vec::new(),
        ),
        DomainFilter::Skipped => ("d.skipped = 1".to_string(), Vec::new()),
        DomainFilter::Unprocessed => (UNPROCESSED_PREDICATE.to_string(), Vec::new()),
        DomainFilter::NameMatches(pattern) => (
            "regexp(?, d.name)".to_string(),
            vec![Value::Text(pattern.clone())],
        ),
        DomainFilter::HeaderValueMatches(pattern) => (
            "EXISTS (SELECT 1 FROM domain_headers h
                     WHERE h.domain_id = d.id AND regexp(?, h.value))"
                .to_string(),
            vec![Value::Text(pattern.clone())],
        ),
        DomainFilter::HeaderMatches { key, value } => (
            "EXISTS (SELECT 1 FROM domain_headers h
                     WHERE h.domain_id = d.id AND h.key = ? COLLATE NOCASE AND regexp(?, h.value))"
                .to_string(),
            vec![Value::Text(key.clone()), Value::Text(value.clone())],
        ),
    };

    Ok(clause)
}

/// Registers `regexp(pattern, text)`, caching the compiled pattern per statement
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regex: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let text = ctx
                .get_raw(1)
                .as_str()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(regex.is_match(text))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(name: &str, headers: &[(&str, &str)]) -> Domain {
        let mut domain = Domain::seed(name);
        domain.last_checked = Some(Utc::now());
        domain.headers = headers.iter().map(|(k, v)| Header::new(*k, *v)).collect();
        domain
    }

    #[test]
    fn test_create_in_memory() {
        let store = SqliteStore::new_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_insert_and_find_by_name() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let id = store.insert(&Domain::seed("a.com")).unwrap();
        assert!(id > 0);

        let found = store.find_by_name("a.com").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.parent_domain, None);
        assert!(found.is_unprocessed());

        assert!(store.find_by_name("b.com").unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_name_rejected() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.insert(&Domain::seed("a.com")).unwrap();

        let result = store.insert(&Domain::seed("a.com"));
        assert!(matches!(result, Err(StoreError::DuplicateName(name)) if name == "a.com"));
        assert_eq!(store.count(&DomainFilter::All).unwrap(), 1);
    }

    #[test]
    fn test_insert_with_unknown_parent_rejected() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = store.insert(&Domain::discovered("b.com", 42));
        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }

    #[test]
    fn test_find_by_id_missing() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(matches!(
            store.find_by_id(99),
            Err(StoreError::DomainNotFound(99))
        ));
    }

    #[test]
    fn test_update_overwrites_headers_in_order() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let id = store.insert(&Domain::seed("a.com")).unwrap();

        let mut domain = store.find_by_id(id).unwrap();
        domain.last_checked = Some(Utc::now());
        domain.headers = vec![
            Header::new("Server", "Apache/2.4"),
            Header::new("X-Powered-By", "PHP/7.4"),
        ];
        store.update_by_id(id, &domain).unwrap();

        let loaded = store.find_by_id(id).unwrap();
        assert_eq!(loaded.headers, domain.headers);
        assert!(loaded.last_checked.is_some());

        domain.headers = vec![Header::new("Server", "nginx")];
        store.update_by_id(id, &domain).unwrap();
        let loaded = store.find_by_id(id).unwrap();
        assert_eq!(loaded.headers, vec![Header::new("Server", "nginx")]);
    }

    #[test]
    fn test_update_missing_id() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = store.update_by_id(5, &Domain::seed("a.com"));
        assert!(matches!(result, Err(StoreError::DomainNotFound(5))));
    }

    #[test]
    fn test_find_unprocessed_excludes_attempted() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.insert(&Domain::seed("fresh.com")).unwrap();
        store.insert(&checked("done.com", &[("Server", "nginx")])).unwrap();

        let mut skipped = Domain::seed("skip.com");
        skipped.skipped = true;
        store.insert(&skipped).unwrap();

        // Fetched, but the response carried nothing worth keeping
        store.insert(&checked("empty.com", &[])).unwrap();

        let pending = store.find_unprocessed(10).unwrap();
        let names: Vec<_> = pending.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fresh.com"]);
    }

    #[test]
    fn test_find_unprocessed_respects_limit() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        for i in 0..5 {
            store.insert(&Domain::seed(format!("d{}.com", i))).unwrap();
        }

        assert_eq!(store.find_unprocessed(3).unwrap().len(), 3);
        assert_eq!(store.find_unprocessed(10).unwrap().len(), 5);
    }

    #[test]
    fn test_status_counts() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.insert(&Domain::seed("fresh.com")).unwrap();
        store.insert(&checked("done.com", &[("Server", "nginx")])).unwrap();
        let mut skipped = Domain::seed("skip.com");
        skipped.skipped = true;
        skipped.last_checked = Some(Utc::now());
        store.insert(&skipped).unwrap();

        assert_eq!(store.count(&DomainFilter::All).unwrap(), 3);
        assert_eq!(store.count(&DomainFilter::Checked).unwrap(), 1);
        assert_eq!(store.count(&DomainFilter::Skipped).unwrap(), 1);
        assert_eq!(store.count(&DomainFilter::Unprocessed).unwrap(), 1);
    }

    #[test]
    fn test_header_value_filter() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .insert(&checked("a.com", &[("Server", "Apache/2.4.41 (Ubuntu)")]))
            .unwrap();
        store.insert(&checked("b.com", &[("Server", "nginx")])).unwrap();
        store
            .insert(&checked("c.com", &[("Set-Cookie", "JSESSIONID=abc")]))
            .unwrap();

        let apache = DomainFilter::HeaderValueMatches("^Apache".to_string());
        let found = store.find_page(&apache, 25, 0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a.com");
        assert_eq!(found[0].headers.len(), 1);

        let ubuntu = DomainFilter::HeaderValueMatches("Ubuntu".to_string());
        assert_eq!(store.count(&ubuntu).unwrap(), 1);

        let java = DomainFilter::HeaderValueMatches("^JSESSIONID=".to_string());
        assert_eq!(store.count(&java).unwrap(), 1);
    }

    #[test]
    fn test_header_key_filter() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .insert(&checked("a.com", &[("Server", "nginx"), ("Via", "nginx-proxy")]))
            .unwrap();
        store
            .insert(&checked("b.com", &[("Via", "nginx-proxy")]))
            .unwrap();

        let filter = DomainFilter::HeaderMatches {
            key: "server".to_string(),
            value: "^nginx".to_string(),
        };
        let found = store.find_page(&filter, 25, 0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a.com");
    }

    #[test]
    fn test_name_filter_and_pagination() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        for i in 0..7 {
            store
                .insert(&Domain::seed(format!("agency{}.gov", i)))
                .unwrap();
        }
        store.insert(&Domain::seed("example.com")).unwrap();

        let gov = DomainFilter::NameMatches(".gov".to_string());
        assert_eq!(store.count(&gov).unwrap(), 7);

        let first = store.find_page(&gov, 5, 0).unwrap();
        let second = store.find_page(&gov, 5, 5).unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].name, "agency0.gov");
        assert_eq!(second[1].name, "agency6.gov");
    }

    #[test]
    fn test_invalid_pattern_reported() {
        let store = SqliteStore::new_in_memory().unwrap();
        let result = store.count(&DomainFilter::NameMatches("(".to_string()));
        assert!(matches!(result, Err(StoreError::InvalidPattern(_))));
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store.insert(&Domain::seed("a.com")).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.find_by_name("a.com").unwrap().is_some());
    }
}
