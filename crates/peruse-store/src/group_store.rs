//! Group persistence.
//!
//! Groups are named, colored categories that items may optionally belong
//! to. Names are unique at the storage level; a duplicate name surfaces
//! the constraint violation unmodified. Deleting a group never deletes
//! its items — the engine's ON DELETE SET NULL rule makes them
//! ungrouped instead (the one integrity rule that differs from the
//! item→usage cascade).

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::DEFAULT_COLOR;
use crate::db::{Database, now_iso};
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A named category items may belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Row id.
    pub id: i64,
    /// Display name, unique across groups.
    pub name: String,
    /// Accent color as `#RRGGBB`.
    pub color: String,
    /// ISO 8601 timestamp set on insert.
    pub created_at: String,
    /// ISO 8601 timestamp refreshed on every update.
    pub updated_at: String,
}

/// Partial update for [`GroupStore::update`].
///
/// Only fields that are `Some` are written; `updated_at` is always
/// refreshed.
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

fn group_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

// ═══════════════════════════════════════════════════════════════════════
//  GroupStore
// ═══════════════════════════════════════════════════════════════════════

/// CRUD operations on groups.
#[derive(Clone)]
pub struct GroupStore {
    db: Database,
}

impl GroupStore {
    /// Create a new group store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new group and return the populated record.
    ///
    /// The color defaults when absent. A duplicate name fails with the
    /// storage engine's UNIQUE constraint error.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, color: Option<&str>) -> StoreResult<Group> {
        let now = now_iso();
        let name = name.to_string();
        let color = color.unwrap_or(DEFAULT_COLOR).to_string();

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO groups (name, color, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?3)",
                    rusqlite::params![name, color, now],
                )?;
                let id = conn.last_insert_rowid();

                debug!(group_id = id, name = %name, "group created");
                Ok(Group {
                    id,
                    name,
                    color,
                    created_at: now.clone(),
                    updated_at: now,
                })
            })
            .await
    }

    /// All groups, alphabetical by name.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<Group>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, color, created_at, updated_at FROM groups ORDER BY name ASC",
                )?;
                let groups = stmt
                    .query_map([], group_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(groups)
            })
            .await
    }

    /// Fetch a single group by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Group>> {
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, name, color, created_at, updated_at FROM groups WHERE id = ?1",
                    rusqlite::params![id],
                    group_from_row,
                );
                match result {
                    Ok(group) => Ok(Some(group)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Apply a partial update to a group, refreshing `updated_at`.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: GroupPatch) -> StoreResult<()> {
        let now = now_iso();

        self.db
            .execute(move |conn| {
                let mut sets: Vec<&'static str> = Vec::new();
                let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

                if let Some(name) = patch.name {
                    sets.push("name = ?");
                    values.push(Box::new(name));
                }
                if let Some(color) = patch.color {
                    sets.push("color = ?");
                    values.push(Box::new(color));
                }

                sets.push("updated_at = ?");
                values.push(Box::new(now));
                values.push(Box::new(id));

                let sql = format!("UPDATE groups SET {} WHERE id = ?", sets.join(", "));
                let params: Vec<&dyn rusqlite::ToSql> =
                    values.iter().map(|v| v.as_ref()).collect();

                let updated = conn.execute(&sql, &params[..])?;
                if updated == 0 {
                    return Err(StoreError::NotFound { entity: "group", id });
                }
                debug!(group_id = id, "group updated");
                Ok(())
            })
            .await
    }

    /// Delete a group.
    ///
    /// Items referencing it become ungrouped (`group_id` set to NULL by
    /// the engine); the items themselves survive.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        self.db
            .execute(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM groups WHERE id = ?1", rusqlite::params![id])?;
                if deleted == 0 {
                    return Err(StoreError::NotFound { entity: "group", id });
                }
                debug!(group_id = id, "group deleted");
                Ok(())
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "group_store_tests.rs"]
mod tests;
