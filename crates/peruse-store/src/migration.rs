//! Schema migration system.
//!
//! Migrations are an explicit, ordered list of additive steps. Column
//! additions are checked against the live schema (`pragma_table_info`)
//! before applying, so upgrading an old database never relies on
//! swallowing "duplicate column" errors. Applied versions are tracked
//! in a `_migrations` table so each migration runs once; table and
//! index creation uses `IF NOT EXISTS` so a database that predates the
//! bookkeeping table upgrades cleanly too.
//!
//! Destructive changes (dropping tables or columns, rewriting data) are
//! not representable here on purpose.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// A single additive schema change.
enum Step {
    /// Idempotent SQL batch — `CREATE TABLE IF NOT EXISTS` and friends.
    /// May contain multiple statements separated by `;`.
    Batch(&'static str),
    /// Add a column to `table` when the live schema does not have it yet.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

/// A single migration definition.
struct Migration {
    /// Monotonically increasing version number (1, 2, 3, ...).
    version: u32,
    /// Human-readable description.
    description: &'static str,
    /// Additive steps applied in order, inside one transaction.
    steps: &'static [Step],
}

/// All migrations in order. Add new migrations to the end of this array.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema — items and usage records",
        steps: &[Step::Batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                price         REAL NOT NULL,
                purchase_date TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS usage_records (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id    INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                usage_date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_usage_records_item ON usage_records(item_id);
        "#,
        )],
    },
    Migration {
        version: 2,
        description: "per-item accent color",
        steps: &[Step::AddColumn {
            table: "items",
            column: "color",
            definition: "TEXT NOT NULL DEFAULT '#6200EE'",
        }],
    },
    Migration {
        version: 3,
        description: "groups — named categories items may belong to",
        steps: &[
            Step::Batch(
                r#"
                CREATE TABLE IF NOT EXISTS groups (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    name       TEXT NOT NULL UNIQUE,
                    color      TEXT NOT NULL DEFAULT '#6200EE',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            "#,
            ),
            Step::AddColumn {
                table: "items",
                column: "group_id",
                definition: "INTEGER REFERENCES groups(id) ON DELETE SET NULL",
            },
            Step::Batch("CREATE INDEX IF NOT EXISTS idx_items_group ON items(group_id);"),
        ],
    },
];

// ── public API ───────────────────────────────────────────────────────

/// Run all pending migrations against `conn`.
///
/// This is a **synchronous** function — call it from `spawn_blocking`.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        debug!(current_version = current, "database schema is up to date");
        return Ok(());
    }

    info!(
        current_version = current,
        pending = pending.len(),
        "running pending migrations"
    );

    for migration in pending {
        apply(conn, migration)?;
    }

    info!(
        new_version = MIGRATIONS.last().map(|m| m.version).unwrap_or(0),
        "all migrations applied"
    );
    Ok(())
}

/// Return the latest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Migration {
            version: 0,
            message: format!("failed to read current version: {e}"),
        })?;
    Ok(version)
}

// ── internals ────────────────────────────────────────────────────────

/// Create the `_migrations` bookkeeping table if it does not exist.
fn ensure_migrations_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  TEXT NOT NULL
        );",
    )
    .map_err(|e| StoreError::Migration {
        version: 0,
        message: format!("failed to create _migrations table: {e}"),
    })?;
    Ok(())
}

/// Whether `table` currently has a column named `column`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        rusqlite::params![table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Apply one step of a migration.
fn apply_step(conn: &Connection, step: &Step) -> StoreResult<()> {
    match step {
        Step::Batch(sql) => {
            conn.execute_batch(sql)?;
        }
        Step::AddColumn {
            table,
            column,
            definition,
        } => {
            if column_exists(conn, table, column)? {
                debug!(table, column, "column already present, skipping");
                return Ok(());
            }
            conn.execute_batch(&format!(
                "ALTER TABLE {table} ADD COLUMN {column} {definition};"
            ))?;
            debug!(table, column, "column added");
        }
    }
    Ok(())
}

/// Apply a single migration inside a transaction.
fn apply(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    info!(
        version = migration.version,
        description = migration.description,
        "applying migration"
    );

    // `conn.transaction()` requires `&mut Connection`, so the transaction
    // is managed manually here.
    conn.execute_batch("BEGIN IMMEDIATE;")
        .map_err(|e| StoreError::Migration {
            version: migration.version,
            message: format!("failed to begin transaction: {e}"),
        })?;

    let result = (|| -> StoreResult<()> {
        for step in migration.steps {
            apply_step(conn, step).map_err(|e| StoreError::Migration {
                version: migration.version,
                message: e.to_string(),
            })?;
        }

        conn.execute(
            "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.description,
                crate::db::now_iso()
            ],
        )
        .map_err(|e| StoreError::Migration {
            version: migration.version,
            message: format!("failed to record migration: {e}"),
        })?;

        Ok(())
    })();

    match &result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")
                .map_err(|e| StoreError::Migration {
                    version: migration.version,
                    message: format!("failed to commit: {e}"),
                })?;
            info!(version = migration.version, "migration applied");
        }
        Err(err) => {
            warn!(version = migration.version, %err, "migration failed, rolling back");
            let _ = conn.execute_batch("ROLLBACK;");
        }
    }

    result
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// The expected latest migration version (update when adding migrations).
    const LATEST_VERSION: u32 = 3;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[1].version > window[0].version,
                "migration versions must be strictly increasing: {} >= {}",
                window[0].version,
                window[1].version,
            );
        }
    }

    #[test]
    fn run_all_on_fresh_db() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        let version = current_version(&conn).unwrap();
        assert_eq!(version, LATEST_VERSION);
    }

    #[test]
    fn run_all_is_idempotent() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();

        let version = current_version(&conn).unwrap();
        assert_eq!(version, LATEST_VERSION);
    }

    #[test]
    fn migrations_create_all_tables() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
                )
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .map(|r| r.unwrap())
                .collect()
        };

        assert!(tables.contains(&"items".to_string()));
        assert!(tables.contains(&"usage_records".to_string()));
        assert!(tables.contains(&"groups".to_string()));
    }

    #[test]
    fn final_items_schema_has_color_and_group() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        assert!(column_exists(&conn, "items", "color").unwrap());
        assert!(column_exists(&conn, "items", "group_id").unwrap());

        // Color defaults at the storage level.
        conn.execute(
            "INSERT INTO items (name, price, purchase_date, created_at, updated_at) \
             VALUES ('Mug', 12.5, '2024-01-01T00:00:00.000Z', '2024-01-01T00:00:00.000Z', '2024-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();
        let color: String = conn
            .query_row("SELECT color FROM items WHERE name = 'Mug'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(color, "#6200EE");
    }

    #[test]
    fn upgrade_from_pre_bookkeeping_schema_preserves_data() {
        // A database created by an old build: v1-era tables, no color or
        // group_id columns, and no _migrations table at all.
        let conn = setup_conn();
        conn.execute_batch(
            r#"
            CREATE TABLE items (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                price         REAL NOT NULL,
                purchase_date TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );
            CREATE TABLE usage_records (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id    INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                usage_date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            INSERT INTO items (name, price, purchase_date, created_at, updated_at)
            VALUES ('Bike', 400.0, '2023-05-01T00:00:00.000Z', '2023-05-02T00:00:00.000Z', '2023-05-02T00:00:00.000Z');
            INSERT INTO usage_records (item_id, usage_date, created_at)
            VALUES (1, '2023-06-01T00:00:00.000Z', '2023-06-01T00:00:00.000Z');
        "#,
        )
        .unwrap();

        run_all(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);

        // Existing rows survive and pick up the column defaults.
        let (name, color, group_id): (String, String, Option<i64>) = conn
            .query_row(
                "SELECT name, color, group_id FROM items WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(name, "Bike");
        assert_eq!(color, "#6200EE");
        assert_eq!(group_id, None);

        let usages: i64 = conn
            .query_row("SELECT COUNT(*) FROM usage_records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(usages, 1);
    }

    #[test]
    fn column_exists_reports_live_schema() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        assert!(column_exists(&conn, "items", "name").unwrap());
        assert!(!column_exists(&conn, "items", "no_such_column").unwrap());
        assert!(!column_exists(&conn, "no_such_table", "name").unwrap());
    }
}
