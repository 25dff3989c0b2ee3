//! TursoStore - NodeStore Implementation for Turso/libsql
//!
//! Persists nodes in a single `nodes` table of an embedded libsql (SQLite) database.
//! Every `NodeQuery` is compiled to one `SELECT` so tree queries stay a single
//! round-trip.
//!
//! # Schema
//!
//! - `nodes` table: one row per node, `path` and `position` nullable
//! - `idx_nodes_type_path`: serves children, siblings and descendant queries
//! - `idx_nodes_type_position`: serves ordered sibling reads
//!
//! Prefix matching on `path` uses a half-open range instead of `LIKE`, so ids containing
//! `%` or `_` need no escaping and the `(node_type, path)` index is usable.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ancestry_core::db::{NodeStore, TursoStore};
//! use std::sync::Arc;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn NodeStore> =
//!         Arc::new(TursoStore::new(PathBuf::from("./data/tree.db")).await?);
//!     let node = store.get_node("node-123").await?;
//!     Ok(())
//! }
//! ```

use crate::db::node_store::NodeStore;
use crate::db::StoreOpenError;
use crate::models::{DeleteResult, Node, NodeQuery, OrderBy, PathMatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{Builder, Connection, Database, Row, Value};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

const NODE_COLUMNS: &str =
    "id, node_type, content, path, position, depth, created_at, modified_at, properties";

/// NodeStore backed by an embedded libsql database
pub struct TursoStore {
    // Kept alive for the lifetime of the connection
    _db: Database,
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl TursoStore {
    /// Open (or create) a database file and prepare the schema
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Create the `nodes` table and its indexes if missing
    ///
    /// # Errors
    ///
    /// Returns `StoreOpenError` if the directory cannot be created, the database cannot be
    /// opened, or schema initialization fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use ancestry_core::db::TursoStore;
    /// # use std::path::PathBuf;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = TursoStore::new(PathBuf::from("./data/tree.db")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(db_path: PathBuf) -> Result<Self, StoreOpenError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreOpenError::directory(parent.to_path_buf(), e))?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| StoreOpenError::open(db_path.clone(), e))?;
        let conn = db.connect()?;

        let store = Self {
            _db: db,
            conn,
            db_path: Some(db_path),
        };
        store.execute_pragma("PRAGMA journal_mode = WAL").await?;
        store.execute_pragma("PRAGMA busy_timeout = 5000").await?;
        store.initialize_schema().await?;

        tracing::info!("Opened tree store at {:?}", store.db_path);
        Ok(store)
    }

    /// Open a private in-memory database
    ///
    /// The store holds a single connection, so the database lives exactly as long as the
    /// store does.
    pub async fn new_in_memory() -> Result<Self, StoreOpenError> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreOpenError::open(":memory:", e))?;
        let conn = db.connect()?;

        let store = Self {
            _db: db,
            conn,
            db_path: None,
        };
        store.initialize_schema().await?;

        tracing::debug!("Opened in-memory tree store");
        Ok(store)
    }

    /// Database file backing this store (`None` for in-memory stores)
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// PRAGMA statements return rows, so they go through `query()` rather than `execute()`
    async fn execute_pragma(&self, pragma: &str) -> Result<(), StoreOpenError> {
        let mut stmt = self
            .conn
            .prepare(pragma)
            .await
            .map_err(|e| StoreOpenError::setup(pragma, e))?;
        stmt.query(())
            .await
            .map_err(|e| StoreOpenError::setup(pragma, e))?;
        Ok(())
    }

    async fn initialize_schema(&self) -> Result<(), StoreOpenError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                node_type TEXT NOT NULL,
                content TEXT NOT NULL,
                path TEXT,
                position INTEGER,
                depth INTEGER,
                created_at TEXT NOT NULL,
                modified_at TEXT NOT NULL,
                properties TEXT NOT NULL DEFAULT '{}'
            )",
            "CREATE INDEX IF NOT EXISTS idx_nodes_type_path ON nodes(node_type, path)",
            "CREATE INDEX IF NOT EXISTS idx_nodes_type_position ON nodes(node_type, position)",
        ];

        for sql in statements {
            self.conn
                .execute(sql, ())
                .await
                .map_err(|e| StoreOpenError::setup(sql, e))?;
        }
        Ok(())
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    /// Convert a row selected with `NODE_COLUMNS` into a loaded `Node`
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let node_type: String = row.get(1).context("Failed to get node_type")?;
        let content: String = row.get(2).context("Failed to get content")?;
        let path: Option<String> = row.get(3).context("Failed to get path")?;
        let position: Option<i64> = row.get(4).context("Failed to get position")?;
        let depth: Option<i64> = row.get(5).context("Failed to get depth")?;
        let created_at_str: String = row.get(6).context("Failed to get created_at")?;
        let modified_at_str: String = row.get(7).context("Failed to get modified_at")?;
        let properties_json: String = row.get(8).context("Failed to get properties")?;

        let created_at =
            Self::parse_timestamp(&created_at_str).context("Failed to parse created_at")?;
        let modified_at =
            Self::parse_timestamp(&modified_at_str).context("Failed to parse modified_at")?;
        let properties: JsonValue =
            serde_json::from_str(&properties_json).context("Failed to parse properties JSON")?;

        let mut node = Node::new_with_id(id, node_type, content, properties);
        node.created_at = created_at;
        node.modified_at = modified_at;
        node.set_path(path);
        node.set_position(position);
        node.set_cached_depth(depth);
        node.mark_loaded();
        Ok(node)
    }

    /// Compile a query into SQL text and positional parameters
    ///
    /// Returns `None` when the query can never match (an empty id set).
    fn build_select(query: &NodeQuery, select: &str) -> Option<(String, Vec<Value>)> {
        let filter = &query.filter;
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(node_type) = &filter.node_type {
            params.push(Value::Text(node_type.clone()));
            clauses.push(format!("node_type = ?{}", params.len()));
        }

        if let Some(ids) = &filter.ids {
            if ids.is_empty() {
                return None;
            }
            let placeholders: Vec<String> = ids
                .iter()
                .map(|id| {
                    params.push(Value::Text(id.clone()));
                    format!("?{}", params.len())
                })
                .collect();
            clauses.push(format!("id IN ({})", placeholders.join(", ")));
        }

        match &filter.path {
            None => {}
            Some(PathMatch::Root) => clauses.push("path IS NULL".to_string()),
            Some(PathMatch::Exact(path)) => {
                params.push(Value::Text(path.clone()));
                clauses.push(format!("path = ?{}", params.len()));
            }
            Some(PathMatch::Within(prefix)) => {
                // '0' is the byte after '/', so [prefix/, prefix0) is exactly "prefix/..."
                params.push(Value::Text(prefix.clone()));
                let exact = params.len();
                params.push(Value::Text(format!("{}/", prefix)));
                let lower = params.len();
                params.push(Value::Text(format!("{}0", prefix)));
                let upper = params.len();
                clauses.push(format!(
                    "(path = ?{} OR (path >= ?{} AND path < ?{}))",
                    exact, lower, upper
                ));
            }
        }

        if let Some(exclude_id) = &filter.exclude_id {
            params.push(Value::Text(exclude_id.clone()));
            clauses.push(format!("id != ?{}", params.len()));
        }

        if let Some(depth) = filter.depth {
            params.push(Value::Integer(depth));
            clauses.push(format!("depth = ?{}", params.len()));
        }

        let mut sql = format!("SELECT {} FROM nodes", select);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        Some((sql, params))
    }

    /// SQLite limits are signed; anything past `i64::MAX` means "no limit"
    fn limit_param(limit: usize) -> Value {
        Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let sql = format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [id])
            .await
            .context("Failed to query node by id")?;

        match rows.next().await.context("Failed to read node row")? {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn query_nodes(&self, query: NodeQuery) -> Result<Vec<Node>> {
        let Some((mut sql, mut params)) = Self::build_select(&query, NODE_COLUMNS) else {
            return Ok(Vec::new());
        };

        sql.push_str(match query.order_by {
            OrderBy::Insertion => " ORDER BY rowid",
            OrderBy::Position => " ORDER BY position IS NULL, position, rowid",
        });
        if let Some(limit) = query.limit {
            params.push(Self::limit_param(limit));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }

        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await
            .with_context(|| format!("Failed to execute node query: {}", sql))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read node row")? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn save_node(&self, node: &Node) -> Result<()> {
        let properties_json =
            serde_json::to_string(&node.properties).context("Failed to serialize properties")?;

        let params: Vec<Value> = vec![
            Value::Text(node.id.clone()),
            Value::Text(node.node_type.clone()),
            Value::Text(node.content.clone()),
            node.path().map_or(Value::Null, |p| Value::Text(p.to_string())),
            node.position().map_or(Value::Null, Value::Integer),
            node.cached_depth().map_or(Value::Null, Value::Integer),
            Value::Text(node.created_at.to_rfc3339()),
            Value::Text(node.modified_at.to_rfc3339()),
            Value::Text(properties_json),
        ];

        // ON CONFLICT keeps the existing rowid, which preserves insertion order
        self.conn
            .execute(
                "INSERT INTO nodes (id, node_type, content, path, position, depth, created_at, modified_at, properties)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    node_type = excluded.node_type,
                    content = excluded.content,
                    path = excluded.path,
                    position = excluded.position,
                    depth = excluded.depth,
                    modified_at = excluded.modified_at,
                    properties = excluded.properties",
                libsql::params_from_iter(params),
            )
            .await
            .with_context(|| format!("Failed to save node '{}'", node.id))?;
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<DeleteResult> {
        let affected = self
            .conn
            .execute("DELETE FROM nodes WHERE id = ?1", [id])
            .await
            .with_context(|| format!("Failed to delete node '{}'", id))?;

        Ok(if affected > 0 {
            DeleteResult::existed()
        } else {
            DeleteResult::not_found()
        })
    }

    async fn count_nodes(&self, query: NodeQuery) -> Result<usize> {
        let Some((sql, params)) = Self::build_select(&query, "COUNT(*)") else {
            return Ok(0);
        };

        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await
            .with_context(|| format!("Failed to execute count query: {}", sql))?;

        let count: i64 = match rows.next().await.context("Failed to read count row")? {
            Some(row) => row.get(0).context("Failed to get count")?,
            None => 0,
        };
        let count = count as usize;
        Ok(query.limit.map_or(count, |limit| count.min(limit)))
    }
}
