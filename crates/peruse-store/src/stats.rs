//! Usage aggregation and the derived price-per-use metric.
//!
//! Read-only queries that join items with their usage counts and
//! assemble the grouped view the UI renders. Nothing here is memoized:
//! every call re-queries the store, so reads reflect the latest state
//! immediately after any write.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::item_store::Item;
use crate::{DEFAULT_COLOR, UNGROUPED_NAME};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// An item joined with its usage count and derived price per use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemWithUsage {
    #[serde(flatten)]
    pub item: Item,
    /// Number of usage records logged against the item.
    pub usage_count: i64,
    /// `price / usage_count`, or the raw price while unused. Never
    /// persisted — computed at read time.
    pub price_per_use: f64,
}

/// One bucket of the grouped view.
///
/// `group_id` is `None` for the synthetic "Ungrouped" bucket, which is
/// assembled at query time and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBucket {
    pub group_id: Option<i64>,
    pub group_name: String,
    pub group_color: String,
    pub items: Vec<ItemWithUsage>,
}

/// Amortized cost of an item: the price spread over its logged uses,
/// or the full price while the item is unused.
pub fn price_per_use(price: f64, usage_count: i64) -> f64 {
    if usage_count > 0 {
        price / usage_count as f64
    } else {
        price
    }
}

/// Items joined with usage counts; callers append WHERE/GROUP BY/ORDER BY.
const ITEM_USAGE_QUERY: &str = "SELECT i.id, i.name, i.price, i.purchase_date, i.color, \
     i.group_id, i.created_at, i.updated_at, COUNT(u.id) AS usage_count \
     FROM items i LEFT JOIN usage_records u ON u.item_id = i.id";

fn item_with_usage_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemWithUsage> {
    let item = crate::item_store::item_from_row(row)?;
    let usage_count: i64 = row.get(8)?;
    let price = item.price;
    Ok(ItemWithUsage {
        item,
        usage_count,
        price_per_use: price_per_use(price, usage_count),
    })
}

fn all_items_with_usage(conn: &Connection) -> StoreResult<Vec<ItemWithUsage>> {
    let mut stmt = conn.prepare(&format!(
        "{ITEM_USAGE_QUERY} GROUP BY i.id ORDER BY i.created_at DESC, i.id DESC"
    ))?;
    let items = stmt
        .query_map([], item_with_usage_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

// ═══════════════════════════════════════════════════════════════════════
//  StatsStore
// ═══════════════════════════════════════════════════════════════════════

/// Read-only aggregation queries over items, usage records, and groups.
#[derive(Clone)]
pub struct StatsStore {
    db: Database,
}

impl StatsStore {
    /// Create a new stats store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// A single item joined with its usage count.
    ///
    /// Unlike [`crate::ItemStore::get`], a missing id is an error here:
    /// callers reach for this once the item's existence is established.
    #[instrument(skip(self))]
    pub async fn item_with_usage(&self, id: i64) -> StoreResult<ItemWithUsage> {
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    &format!("{ITEM_USAGE_QUERY} WHERE i.id = ?1 GROUP BY i.id"),
                    rusqlite::params![id],
                    item_with_usage_from_row,
                );
                match result {
                    Ok(item) => Ok(item),
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        Err(StoreError::NotFound { entity: "item", id })
                    }
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Every item joined with its usage count, newest first — same order
    /// as [`crate::ItemStore::list`].
    #[instrument(skip(self))]
    pub async fn all_items_with_usage(&self) -> StoreResult<Vec<ItemWithUsage>> {
        self.db.execute(all_items_with_usage).await
    }

    /// The grouped view: one bucket per group plus the synthetic
    /// "Ungrouped" bucket.
    ///
    /// The "Ungrouped" bucket is always first, even when empty. Real
    /// groups follow in ascending alphabetical name order and appear
    /// even when they hold no items. Items within a bucket are newest
    /// first.
    #[instrument(skip(self))]
    pub async fn items_grouped(&self) -> StoreResult<Vec<GroupBucket>> {
        self.db
            .execute(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, color FROM groups ORDER BY name ASC")?;
                let groups = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut buckets = Vec::with_capacity(groups.len() + 1);
                buckets.push(GroupBucket {
                    group_id: None,
                    group_name: UNGROUPED_NAME.to_string(),
                    group_color: DEFAULT_COLOR.to_string(),
                    items: Vec::new(),
                });
                for (id, name, color) in groups {
                    buckets.push(GroupBucket {
                        group_id: Some(id),
                        group_name: name,
                        group_color: color,
                        items: Vec::new(),
                    });
                }

                for item in all_items_with_usage(conn)? {
                    // With foreign keys ON every group_id matches a
                    // bucket; an unmatched id lands in "Ungrouped".
                    let slot = match item.item.group_id {
                        None => 0,
                        Some(gid) => buckets
                            .iter()
                            .position(|b| b.group_id == Some(gid))
                            .unwrap_or(0),
                    };
                    buckets[slot].items.push(item);
                }

                Ok(buckets)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
