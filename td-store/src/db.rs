//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling.
//! Runs integrity checks on startup and applies versioned migrations.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{error, info, warn};

use td_core::config::DatabaseConfig;
use td_core::error::{TdError, TdResult};

use crate::migrations;
use crate::schema;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// This:
    /// 1. Creates the database file and parent directories if needed
    /// 2. Enables WAL mode for concurrent read/write
    /// 3. Sets up connection pooling
    /// 4. Runs integrity checks if configured
    /// 5. Creates the schema tables
    /// 6. Runs pending migrations
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> TdResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("initializing document store at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| TdError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        // Run integrity check if configured
        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        // Create schema and run migrations
        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        info!("document store initialized successfully");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> TdResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| TdError::Pool(e.to_string()))
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> TdResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| TdError::Database(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(TdError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    pub fn transaction<T, F>(&self, f: F) -> TdResult<T>
    where
        F: FnOnce(&Connection) -> TdResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| TdError::Database(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| TdError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get store statistics (document counts per collection group).
    pub fn stats(&self) -> TdResult<StoreStats> {
        let conn = self.conn()?;

        let count = |sql: &str| -> i64 {
            conn.query_row(sql, [], |row| row.get(0)).unwrap_or(0)
        };

        Ok(StoreStats {
            users: count("SELECT COUNT(*) FROM documents WHERE collection = 'users'"),
            medicines: count(
                "SELECT COUNT(*) FROM documents WHERE collection LIKE 'users/%/medicines'",
            ),
            reminders: count(
                "SELECT COUNT(*) FROM documents WHERE collection LIKE 'users/%/reminders'",
            ),
            logs: count("SELECT COUNT(*) FROM documents WHERE collection LIKE 'users/%/logs'"),
            side_effects: count(
                "SELECT COUNT(*) FROM documents WHERE collection LIKE 'users/%/side_effects'",
            ),
            conversations: count(
                "SELECT COUNT(*) FROM documents WHERE collection = 'iFeelConversations'",
            ),
            messages: count(
                "SELECT COUNT(*) FROM documents WHERE collection LIKE 'iFeelConversations/%/messages'",
            ),
            caregivers: count("SELECT COUNT(*) FROM documents WHERE collection = 'caregivers'"),
            invitations: count(
                "SELECT COUNT(*) FROM documents WHERE collection = 'caregiver_invitations'",
            ),
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> TdResult<()> {
        warn!("resetting document store - all data will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        info!("document store reset complete");
        Ok(())
    }
}

/// Document count statistics per collection group.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub users: i64,
    pub medicines: i64,
    pub reminders: i64,
    pub logs: i64,
    pub side_effects: i64,
    pub conversations: i64,
    pub messages: i64,
    pub caregivers: i64,
    pub invitations: i64,
}

impl StoreStats {
    /// Total document count across all groups.
    pub fn total(&self) -> i64 {
        self.users
            + self.medicines
            + self.reminders
            + self.logs
            + self.side_effects
            + self.conversations
            + self.messages
            + self.caregivers
            + self.invitations
    }
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users={}, medicines={}, reminders={}, logs={}, side_effects={}, conversations={}, messages={}, caregivers={}, invitations={}",
            self.users, self.medicines, self.reminders, self.logs, self.side_effects,
            self.conversations, self.messages, self.caregivers, self.invitations
        )
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        // Enable WAL mode for better concurrent performance
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        // Performance pragmas
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )?;

        Ok(())
    }
}
