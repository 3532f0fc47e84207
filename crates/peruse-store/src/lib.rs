//! # peruse-store
//!
//! Storage engine for Peruse.
//!
//! Provides SQLite-backed persistence for tracked purchases, their usage
//! history, and user-defined groups, plus the read-time aggregation that
//! derives the price-per-use metric.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  StatsStore (usage counts, price per use,    │
//! │              grouped view — read only)       │
//! ├──────────────────────────────────────────────┤
//! │  ItemStore  (items + usage records)          │
//! │  GroupStore (groups)                         │
//! ├──────────────────────────────────────────────┤
//! │  Database   (rusqlite, WAL, foreign keys ON) │
//! │  Migrations (versioned, additive, checked)   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use peruse_store::{Database, ItemStore, NewItem, StatsStore};
//!
//! let db = Database::open("data/peruse.db")?;
//! db.initialize().await?;
//!
//! let items = ItemStore::new(db.clone());
//! let item = items
//!     .create(NewItem {
//!         name: "Umbrella".into(),
//!         price: 20.0,
//!         purchase_date: "2024-01-01T00:00:00.000Z".into(),
//!         color: None,
//!         group_id: None,
//!     })
//!     .await?;
//! items.add_usage(item.id, None).await?;
//!
//! let stats = StatsStore::new(db.clone());
//! let with_usage = stats.item_with_usage(item.id).await?;
//! assert_eq!(with_usage.usage_count, 1);
//! ```

pub mod db;
pub mod error;
pub mod group_store;
pub mod item_store;
pub mod migration;
pub mod stats;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use group_store::{Group, GroupPatch, GroupStore};
pub use item_store::{Item, ItemPatch, ItemStore, NewItem, UsageRecord};
pub use stats::{GroupBucket, ItemWithUsage, StatsStore, price_per_use};

/// Accent color applied when the caller supplies none.
pub const DEFAULT_COLOR: &str = "#6200EE";

/// Display name of the synthetic bucket holding items without a group.
pub const UNGROUPED_NAME: &str = "Ungrouped";
