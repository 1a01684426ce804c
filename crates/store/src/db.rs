//! Database handle and schema management

use turso::{Builder, Database};

use crate::error::Result;

/// The log store: one Turso database holding the `logs` table.
///
/// `Database` is internally reference-counted; the store hands out one
/// connection per operation, which is how the engine serializes writers.
pub struct LogStore {
    db: Database,
}

impl LogStore {
    /// Open (or create) a file-backed store and initialize the schema.
    pub async fn open(path: &str) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub async fn open_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    pub(crate) fn connect(&self) -> Result<turso::Connection> {
        Ok(self.db.connect()?)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(SCHEMA_LOGS, ()).await?;
        conn.execute(INDEX_TIMESTAMP, ()).await?;
        conn.execute(INDEX_SEVERITY, ()).await?;
        conn.execute(INDEX_HOSTNAME, ()).await?;
        conn.execute(INDEX_APPNAME, ()).await?;
        conn.execute(INDEX_CREATED_AT, ()).await?;

        tracing::debug!("log store schema initialized");
        Ok(())
    }
}

const SCHEMA_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    priority INTEGER,
    facility INTEGER,
    severity INTEGER,
    version INTEGER,
    hostname TEXT,
    appname TEXT,
    procid TEXT,
    msgid TEXT,
    message TEXT,
    structured_data TEXT,
    raw_message TEXT,
    remote_addr TEXT,
    protocol TEXT,
    rfc_format TEXT,
    device_type TEXT,
    event_type TEXT,
    event_category TEXT,
    parsed_fields TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
)
"#;

const INDEX_TIMESTAMP: &str = "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)";
const INDEX_SEVERITY: &str = "CREATE INDEX IF NOT EXISTS idx_logs_severity ON logs(severity)";
const INDEX_HOSTNAME: &str = "CREATE INDEX IF NOT EXISTS idx_logs_hostname ON logs(hostname)";
const INDEX_APPNAME: &str = "CREATE INDEX IF NOT EXISTS idx_logs_appname ON logs(appname)";
const INDEX_CREATED_AT: &str = "CREATE INDEX IF NOT EXISTS idx_logs_created_at ON logs(created_at)";
