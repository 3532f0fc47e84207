//! Item and usage-record persistence.
//!
//! Provides SQLite-backed CRUD for tracked purchases and the usage
//! events logged against them. Usage records are exclusively owned by
//! their item: deleting an item cascades to its usage records via the
//! storage engine's foreign-key rule. No validation happens here — the
//! service layer rejects malformed input before it reaches this store.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::DEFAULT_COLOR;
use crate::db::{Database, now_iso};
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A tracked purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Row id, assigned on insert and stable for the record lifetime.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Original purchase cost. Always positive.
    pub price: f64,
    /// When the item was bought (ISO 8601, user-supplied).
    pub purchase_date: String,
    /// Accent color as `#RRGGBB`.
    pub color: String,
    /// Owning group, if any. `None` means ungrouped.
    pub group_id: Option<i64>,
    /// ISO 8601 timestamp set by the store on insert.
    pub created_at: String,
    /// ISO 8601 timestamp refreshed by the store on every update.
    pub updated_at: String,
}

/// One logged use of an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Row id.
    pub id: i64,
    /// The item this usage belongs to.
    pub item_id: i64,
    /// When the item was used (ISO 8601, may be backdated).
    pub usage_date: String,
    /// When the record was inserted — distinct from `usage_date`.
    pub created_at: String,
}

/// Input for [`ItemStore::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
    pub purchase_date: String,
    /// Defaults to [`DEFAULT_COLOR`] when absent.
    pub color: Option<String>,
    /// Defaults to ungrouped when absent.
    pub group_id: Option<i64>,
}

/// Partial update for [`ItemStore::update`].
///
/// Only fields that are `Some` are written; everything else is left
/// untouched. `group_id` is doubly optional: the outer `None` leaves the
/// group assignment alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub purchase_date: Option<String>,
    pub color: Option<String>,
    pub group_id: Option<Option<i64>>,
}

/// Column list shared by every item SELECT.
const ITEM_COLUMNS: &str = "id, name, price, purchase_date, color, group_id, created_at, updated_at";

/// Map a row selected with [`ITEM_COLUMNS`] into an [`Item`].
pub(crate) fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        purchase_date: row.get(3)?,
        color: row.get(4)?,
        group_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn usage_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsageRecord> {
    Ok(UsageRecord {
        id: row.get(0)?,
        item_id: row.get(1)?,
        usage_date: row.get(2)?,
        created_at: row.get(3)?,
    })
}

// ═══════════════════════════════════════════════════════════════════════
//  ItemStore
// ═══════════════════════════════════════════════════════════════════════

/// CRUD operations on items and their usage records.
#[derive(Clone)]
pub struct ItemStore {
    db: Database,
}

impl ItemStore {
    /// Create a new item store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new item and return the fully populated record.
    ///
    /// `created_at` and `updated_at` are set to the current time; the
    /// color defaults when absent; `group_id` defaults to ungrouped.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewItem) -> StoreResult<Item> {
        let now = now_iso();
        let NewItem {
            name,
            price,
            purchase_date,
            color,
            group_id,
        } = input;
        let color = color.unwrap_or_else(|| DEFAULT_COLOR.to_string());

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO items (name, price, purchase_date, color, group_id, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    rusqlite::params![name, price, purchase_date, color, group_id, now],
                )?;
                let id = conn.last_insert_rowid();

                debug!(item_id = id, "item created");
                Ok(Item {
                    id,
                    name,
                    price,
                    purchase_date,
                    color,
                    group_id,
                    created_at: now.clone(),
                    updated_at: now,
                })
            })
            .await
    }

    /// All items, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<Item>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM items ORDER BY created_at DESC, id DESC"
                ))?;
                let items = stmt
                    .query_map([], item_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await
    }

    /// Fetch a single item by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Item>> {
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                    rusqlite::params![id],
                    item_from_row,
                );
                match result {
                    Ok(item) => Ok(Some(item)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Apply a partial update to an item.
    ///
    /// Only the fields present in `patch` are written; `updated_at` is
    /// always refreshed, so an empty patch is still a valid update. A
    /// failed update leaves the row exactly as it was.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: ItemPatch) -> StoreResult<()> {
        let now = now_iso();

        self.db
            .execute(move |conn| {
                let mut sets: Vec<&'static str> = Vec::new();
                let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

                if let Some(name) = patch.name {
                    sets.push("name = ?");
                    values.push(Box::new(name));
                }
                if let Some(price) = patch.price {
                    sets.push("price = ?");
                    values.push(Box::new(price));
                }
                if let Some(purchase_date) = patch.purchase_date {
                    sets.push("purchase_date = ?");
                    values.push(Box::new(purchase_date));
                }
                if let Some(color) = patch.color {
                    sets.push("color = ?");
                    values.push(Box::new(color));
                }
                if let Some(group_id) = patch.group_id {
                    sets.push("group_id = ?");
                    values.push(Box::new(group_id));
                }

                sets.push("updated_at = ?");
                values.push(Box::new(now));
                values.push(Box::new(id));

                let sql = format!("UPDATE items SET {} WHERE id = ?", sets.join(", "));
                let params: Vec<&dyn rusqlite::ToSql> =
                    values.iter().map(|v| v.as_ref()).collect();

                let updated = conn.execute(&sql, &params[..])?;
                if updated == 0 {
                    return Err(StoreError::NotFound { entity: "item", id });
                }
                debug!(item_id = id, "item updated");
                Ok(())
            })
            .await
    }

    /// Delete an item.
    ///
    /// All usage records referencing it are deleted by the storage
    /// engine's ON DELETE CASCADE rule.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        self.db
            .execute(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM items WHERE id = ?1", rusqlite::params![id])?;
                if deleted == 0 {
                    return Err(StoreError::NotFound { entity: "item", id });
                }
                debug!(item_id = id, "item deleted");
                Ok(())
            })
            .await
    }

    /// Log one use of an item.
    ///
    /// `usage_date` defaults to the current time; `created_at` is always
    /// the current time regardless of `usage_date`, so backdated entries
    /// still record when they were logged.
    #[instrument(skip(self))]
    pub async fn add_usage(
        &self,
        item_id: i64,
        usage_date: Option<&str>,
    ) -> StoreResult<UsageRecord> {
        let now = now_iso();
        let usage_date = usage_date.map(str::to_string).unwrap_or_else(|| now.clone());

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO usage_records (item_id, usage_date, created_at) \
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![item_id, usage_date, now],
                )?;
                let id = conn.last_insert_rowid();

                debug!(usage_id = id, item_id, "usage recorded");
                Ok(UsageRecord {
                    id,
                    item_id,
                    usage_date,
                    created_at: now,
                })
            })
            .await
    }

    /// All usage records for an item, most recent use first.
    #[instrument(skip(self))]
    pub async fn usage_history(&self, item_id: i64) -> StoreResult<Vec<UsageRecord>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, item_id, usage_date, created_at FROM usage_records \
                     WHERE item_id = ?1 ORDER BY usage_date DESC, id DESC",
                )?;
                let records = stmt
                    .query_map(rusqlite::params![item_id], usage_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
    }

    /// Delete exactly one usage record by id.
    #[instrument(skip(self))]
    pub async fn delete_usage(&self, usage_id: i64) -> StoreResult<()> {
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM usage_records WHERE id = ?1",
                    rusqlite::params![usage_id],
                )?;
                if deleted == 0 {
                    return Err(StoreError::NotFound {
                        entity: "usage_record",
                        id: usage_id,
                    });
                }
                debug!(usage_id, "usage record deleted");
                Ok(())
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "item_store_tests.rs"]
mod tests;
