use std::collections::HashSet;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use seva_core::store::{SlotError, SlotStore};

const MIGRATION_0001: (&str, &str) = (
    "0001_slots.sql",
    r#"
    CREATE TABLE IF NOT EXISTS slots (
      key TEXT PRIMARY KEY NOT NULL,
      value TEXT NOT NULL,
      updated_at TEXT NOT NULL
    );
    "#,
);

fn migrations() -> Vec<(&'static str, &'static str)> {
    vec![MIGRATION_0001]
}

pub fn open(path: &Path) -> Result<Connection, SlotError> {
    Connection::open(path).map_err(|e| SlotError(format!("open {}: {e}", path.display())))
}

pub fn open_in_memory() -> Result<Connection, SlotError> {
    Connection::open_in_memory().map_err(|e| SlotError(format!("open in-memory db: {e}")))
}

/// Apply pending migrations, tracked by name so each runs exactly once.
pub fn migrate(conn: &mut Connection) -> Result<(), SlotError> {
    conn.execute_batch(
        r#"
      CREATE TABLE IF NOT EXISTS _migrations (
        name TEXT PRIMARY KEY NOT NULL,
        applied_at TEXT NOT NULL
      );
    "#,
    )
    .map_err(|e| SlotError(format!("ensure migrations table: {e}")))?;

    let applied: HashSet<String> = {
        let mut stmt = conn
            .prepare("SELECT name FROM _migrations")
            .map_err(|e| SlotError(format!("query applied migrations: {e}")))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| SlotError(format!("read applied migrations: {e}")))?;
        let mut set = HashSet::new();
        for r in rows {
            set.insert(r.map_err(|e| SlotError(format!("decode migration row: {e}")))?);
        }
        set
    };

    for (name, sql) in migrations() {
        if applied.contains(name) {
            continue;
        }
        let tx = conn
            .transaction()
            .map_err(|e| SlotError(format!("start migration tx: {e}")))?;
        tx.execute_batch(sql)
            .map_err(|e| SlotError(format!("migration {name} failed: {e}")))?;
        tx.execute(
            "INSERT INTO _migrations(name, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
            [name],
        )
        .map_err(|e| SlotError(format!("record migration {name}: {e}")))?;
        tx.commit()
            .map_err(|e| SlotError(format!("commit migration tx: {e}")))?;
    }

    Ok(())
}

/// Slot store backed by a `slots` key-value table in SQLite.
pub struct SqliteSlot {
    conn: Connection,
}

impl SqliteSlot {
    /// Open (creating if needed) and migrate the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, SlotError> {
        let mut conn = open(path)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, SlotError> {
        let mut conn = open_in_memory()?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }
}

impl SlotStore for SqliteSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        self.conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| SlotError(format!("read slot {key}: {e}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        self.conn
            .execute(
                r#"
          INSERT INTO slots(key, value, updated_at)
          VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ','now'))
          ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
          "#,
                rusqlite::params![key, value],
            )
            .map_err(|e| SlotError(format!("write slot {key}: {e}")))?;
        Ok(())
    }
}
