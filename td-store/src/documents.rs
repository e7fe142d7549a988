//! Document read/write operations and the atomic write batch.
//!
//! Documents are schemaless JSON bodies addressed by `DocPath`. Reads are
//! plain lookups and field-equality queries; the only multi-document write
//! is `WriteBatch`, a set of staged deletions committed in one transaction.

use chrono::Utc;
use rusqlite::{params, Row};
use serde_json::Value;
use tracing::debug;

use td_core::error::{TdError, TdResult};

use crate::db::Database;
use crate::paths::DocPath;

/// A single document: its path and parsed JSON body.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: DocPath,
    pub fields: Value,
}

impl Document {
    /// Construct a Document from a database row (`path`, `body` columns).
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
        Ok((row.get("path")?, row.get("body")?))
    }

    fn parse(path: String, body: String) -> TdResult<Self> {
        Ok(Self {
            path: DocPath::parse(&path)?,
            fields: serde_json::from_str(&body)?,
        })
    }

    /// The document id (last path segment).
    pub fn id(&self) -> &str {
        self.path.doc_id()
    }
}

impl Database {
    /// Create or replace the document at `path`.
    pub fn put_document(&self, path: &DocPath, fields: &Value) -> TdResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO documents (path, collection, doc_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET body = excluded.body, updated_at = ?5",
            params![
                path.as_str(),
                path.collection(),
                path.doc_id(),
                fields.to_string(),
                now,
            ],
        )
        .map_err(|e| TdError::Database(e.to_string()))?;

        debug!("put document {path}");
        Ok(())
    }

    /// Fetch a single document, or None if it does not exist.
    pub fn get_document(&self, path: &DocPath) -> TdResult<Option<Document>> {
        let conn = self.conn()?;
        match conn.query_row(
            "SELECT path, body FROM documents WHERE path = ?1",
            [path.as_str()],
            Document::from_row,
        ) {
            Ok((p, b)) => Ok(Some(Document::parse(p, b)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TdError::Database(e.to_string())),
        }
    }

    /// List every document in a collection.
    pub fn list_collection(&self, collection: &str) -> TdResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT path, body FROM documents WHERE collection = ?1 ORDER BY id")
            .map_err(|e| TdError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([collection], Document::from_row)
            .map_err(|e| TdError::Database(e.to_string()))?;

        let mut docs = Vec::new();
        for row in rows {
            let (p, b) = row.map_err(|e| TdError::Database(e.to_string()))?;
            docs.push(Document::parse(p, b)?);
        }
        Ok(docs)
    }

    /// Query a collection for documents whose `field` equals `value`.
    pub fn query_field_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> TdResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT path, body FROM documents
                 WHERE collection = ?1 AND json_extract(body, '$.' || ?2) = ?3
                 ORDER BY id",
            )
            .map_err(|e| TdError::Database(e.to_string()))?;

        // json_extract yields SQL text/int/real for scalar JSON values
        let bound = sql_value(value)?;
        let rows = stmt
            .query_map(params![collection, field, bound], Document::from_row)
            .map_err(|e| TdError::Database(e.to_string()))?;

        let mut docs = Vec::new();
        for row in rows {
            let (p, b) = row.map_err(|e| TdError::Database(e.to_string()))?;
            docs.push(Document::parse(p, b)?);
        }
        Ok(docs)
    }

    /// Query a collection for the first document whose string `field`
    /// equals `value` case-insensitively.
    pub fn query_field_eq_ci(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> TdResult<Option<Document>> {
        let conn = self.conn()?;
        match conn.query_row(
            "SELECT path, body FROM documents
             WHERE collection = ?1 AND LOWER(json_extract(body, '$.' || ?2)) = LOWER(?3)
             ORDER BY id LIMIT 1",
            params![collection, field, value],
            Document::from_row,
        ) {
            Ok((p, b)) => Ok(Some(Document::parse(p, b)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TdError::Database(e.to_string())),
        }
    }

    /// The highest document rowid, or 0 on an empty store.
    ///
    /// Used by the watcher to start tailing from "now".
    pub fn latest_rowid(&self) -> TdResult<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COALESCE(MAX(id), 0) FROM documents", [], |row| {
            row.get(0)
        })
        .map_err(|e| TdError::Database(e.to_string()))
    }

    /// Documents created after the given rowid, oldest first, paired with
    /// their rowids so the caller can advance its cursor.
    pub fn documents_after(&self, rowid: i64) -> TdResult<Vec<(i64, Document)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, path, body FROM documents WHERE id > ?1 ORDER BY id")
            .map_err(|e| TdError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([rowid], |row| {
                let id: i64 = row.get(0)?;
                let path: String = row.get(1)?;
                let body: String = row.get(2)?;
                Ok((id, path, body))
            })
            .map_err(|e| TdError::Database(e.to_string()))?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, p, b) = row.map_err(|e| TdError::Database(e.to_string()))?;
            docs.push((id, Document::parse(p, b)?));
        }
        Ok(docs)
    }
}

/// Convert a scalar JSON value to its SQL-typed form.
///
/// json_extract yields INTEGER for JSON booleans and integers, so the
/// bound parameter must carry the matching SQL type for equality to hold.
fn sql_value(value: &Value) -> TdResult<rusqlite::types::Value> {
    use rusqlite::types::Value as SqlValue;
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => Ok(SqlValue::Real(n.as_f64().unwrap_or_default())),
        },
        other => Err(TdError::Database(format!(
            "unsupported query value: {other}"
        ))),
    }
}

/// A set of staged document deletions applied as one atomic unit.
///
/// Either every staged document is removed or, on failure, none are.
/// Deleting a document that no longer exists is not an error.
#[derive(Debug, Default)]
pub struct WriteBatch {
    deletes: Vec<DocPath>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a document for deletion.
    pub fn stage_delete(&mut self, path: DocPath) {
        self.deletes.push(path);
    }

    /// Number of staged deletions.
    pub fn len(&self) -> usize {
        self.deletes.len()
    }

    /// Whether the batch has no staged deletions.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
    }

    /// Paths staged for deletion.
    pub fn staged(&self) -> &[DocPath] {
        &self.deletes
    }

    /// Commit the batch in a single transaction.
    ///
    /// Returns the number of documents actually removed (absent documents
    /// count zero).
    pub fn commit(self, db: &Database) -> TdResult<usize> {
        let staged = self.deletes.len();
        let removed = db.transaction(|conn| {
            let mut removed = 0usize;
            for path in &self.deletes {
                let affected = conn
                    .execute("DELETE FROM documents WHERE path = ?1", [path.as_str()])
                    .map_err(|e| TdError::Database(e.to_string()))?;
                removed += affected;
            }
            Ok(removed)
        })?;

        debug!("batch commit: {staged} staged, {removed} removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use td_core::config::DatabaseConfig;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("test.db"), &DatabaseConfig::default()).unwrap();
        (db, dir)
    }

    fn put(db: &Database, path: &str, fields: Value) -> DocPath {
        let p = DocPath::parse(path).unwrap();
        db.put_document(&p, &fields).unwrap();
        p
    }

    #[test]
    fn test_put_and_get() {
        let (db, _dir) = test_db();
        let p = put(&db, "users/u1", json!({"displayName": "Ana", "email": "ana@example.com"}));

        let doc = db.get_document(&p).unwrap().unwrap();
        assert_eq!(doc.id(), "u1");
        assert_eq!(doc.fields["displayName"], "Ana");

        let missing = DocPath::parse("users/nope").unwrap();
        assert!(db.get_document(&missing).unwrap().is_none());
    }

    #[test]
    fn test_put_replaces_body() {
        let (db, _dir) = test_db();
        let p = put(&db, "users/u1", json!({"displayName": "Ana"}));
        put(&db, "users/u1", json!({"displayName": "Anabel"}));

        let doc = db.get_document(&p).unwrap().unwrap();
        assert_eq!(doc.fields["displayName"], "Anabel");
    }

    #[test]
    fn test_list_collection() {
        let (db, _dir) = test_db();
        put(&db, "users/u1/medicines/m1", json!({"name": "Aspirin"}));
        put(&db, "users/u1/medicines/m2", json!({"name": "Ibuprofen"}));
        put(&db, "users/u2/medicines/m3", json!({"name": "Metformin"}));

        let docs = db.list_collection("users/u1/medicines").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id(), "m1");
    }

    #[test]
    fn test_query_field_eq() {
        let (db, _dir) = test_db();
        put(&db, "caregivers/c1", json!({"userId": "u1", "notifyOnMissed": true}));
        put(&db, "caregivers/c2", json!({"userId": "u2", "notifyOnMissed": true}));
        put(&db, "caregivers/c3", json!({"userId": "u1", "notifyOnMissed": false}));

        let docs = db.query_field_eq("caregivers", "userId", &json!("u1")).unwrap();
        assert_eq!(docs.len(), 2);

        let flagged = db
            .query_field_eq("caregivers", "notifyOnMissed", &json!(true))
            .unwrap();
        assert_eq!(flagged.len(), 2);
    }

    #[test]
    fn test_query_field_eq_ci() {
        let (db, _dir) = test_db();
        put(&db, "users/u1", json!({"email": "Carla@Example.COM"}));

        let hit = db
            .query_field_eq_ci("users", "email", "carla@example.com")
            .unwrap();
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().id(), "u1");

        let miss = db
            .query_field_eq_ci("users", "email", "nobody@example.com")
            .unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn test_batch_commit_removes_all() {
        let (db, _dir) = test_db();
        let p1 = put(&db, "users/u1/logs/l1", json!({"status": "taken"}));
        let p2 = put(&db, "users/u1/logs/l2", json!({"status": "missed"}));

        let mut batch = WriteBatch::new();
        batch.stage_delete(p1);
        batch.stage_delete(p2);
        assert_eq!(batch.len(), 2);

        let removed = batch.commit(&db).unwrap();
        assert_eq!(removed, 2);
        assert!(db.list_collection("users/u1/logs").unwrap().is_empty());
    }

    #[test]
    fn test_batch_absent_document_is_noop() {
        let (db, _dir) = test_db();
        let mut batch = WriteBatch::new();
        batch.stage_delete(DocPath::parse("users/ghost").unwrap());

        let removed = batch.commit(&db).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_documents_after() {
        let (db, _dir) = test_db();
        let start = db.latest_rowid().unwrap();

        put(&db, "caregivers/c1", json!({"userId": "u1"}));
        put(&db, "caregivers/c2", json!({"userId": "u2"}));

        let created = db.documents_after(start).unwrap();
        assert_eq!(created.len(), 2);
        assert!(created[0].0 < created[1].0);
        assert_eq!(created[0].1.id(), "c1");
    }
}
