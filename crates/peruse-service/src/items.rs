//! Item-facing application service.
//!
//! Validates user input, then delegates to the record store; also
//! exposes the aggregation reads the UI renders. A validation failure
//! rejects the whole call before anything is written.

use peruse_store::{
    Database, GroupBucket, Item, ItemPatch, ItemStore, ItemWithUsage, NewItem, StatsStore,
    StoreError, UsageRecord,
};
use tracing::{debug, instrument};

use crate::error::ServiceResult;
use crate::validate::Validator;

/// Format an amount as currency, two decimals with a `$` prefix.
pub fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Validated item operations over the record store.
pub struct ItemService {
    items: ItemStore,
    stats: StatsStore,
    validator: Validator,
}

impl ItemService {
    /// Create a new item service on top of `db`.
    pub fn new(db: Database) -> Self {
        Self {
            items: ItemStore::new(db.clone()),
            stats: StatsStore::new(db),
            validator: Validator::new(),
        }
    }

    /// Validate and create an item.
    ///
    /// An empty color string counts as absent and falls through to the
    /// store's default.
    #[instrument(skip(self, input))]
    pub async fn create_item(&self, mut input: NewItem) -> ServiceResult<Item> {
        self.validator.item_name(&input.name)?;
        self.validator.price(input.price)?;
        self.validator.purchase_date(&input.purchase_date)?;

        match input.color.as_deref() {
            None | Some("") => input.color = None,
            Some(color) => self.validator.color(color)?,
        }

        let item = self.items.create(input).await?;
        debug!(item_id = item.id, "item created");
        Ok(item)
    }

    /// Validate the supplied fields and apply a partial update.
    ///
    /// Color is validated here on update exactly as on create; an empty
    /// color string resets to the default.
    #[instrument(skip(self, patch))]
    pub async fn update_item(&self, id: i64, mut patch: ItemPatch) -> ServiceResult<()> {
        if let Some(name) = &patch.name {
            self.validator.item_name(name)?;
        }
        if let Some(price) = patch.price {
            self.validator.price(price)?;
        }
        match patch.color.as_deref() {
            None => {}
            Some("") => patch.color = Some(peruse_store::DEFAULT_COLOR.to_string()),
            Some(color) => self.validator.color(color)?,
        }

        self.items.update(id, patch).await?;
        Ok(())
    }

    /// Delete an item and, via the storage engine, its usage records.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i64) -> ServiceResult<()> {
        self.items.delete(id).await?;
        Ok(())
    }

    /// Fetch a single item; `None` when absent.
    pub async fn get_item(&self, id: i64) -> ServiceResult<Option<Item>> {
        Ok(self.items.get(id).await?)
    }

    /// All items, newest first.
    pub async fn items(&self) -> ServiceResult<Vec<Item>> {
        Ok(self.items.list().await?)
    }

    /// Log one use of an item right now.
    ///
    /// Unlike the raw store insert, this checks the item exists first
    /// and raises a distinct not-found error when it does not.
    #[instrument(skip(self))]
    pub async fn increment_usage(&self, item_id: i64) -> ServiceResult<UsageRecord> {
        self.add_usage(item_id, None).await
    }

    /// Log one use of an item, optionally backdated.
    #[instrument(skip(self))]
    pub async fn add_usage(
        &self,
        item_id: i64,
        usage_date: Option<&str>,
    ) -> ServiceResult<UsageRecord> {
        if self.items.get(item_id).await?.is_none() {
            return Err(StoreError::NotFound {
                entity: "item",
                id: item_id,
            }
            .into());
        }
        Ok(self.items.add_usage(item_id, usage_date).await?)
    }

    /// All usage records for an item, most recent use first.
    pub async fn usage_history(&self, item_id: i64) -> ServiceResult<Vec<UsageRecord>> {
        Ok(self.items.usage_history(item_id).await?)
    }

    /// Delete a single usage record.
    #[instrument(skip(self))]
    pub async fn delete_usage_record(&self, usage_id: i64) -> ServiceResult<()> {
        self.items.delete_usage(usage_id).await?;
        Ok(())
    }

    /// A single item with its usage count and price per use.
    pub async fn item_with_usage(&self, id: i64) -> ServiceResult<ItemWithUsage> {
        Ok(self.stats.item_with_usage(id).await?)
    }

    /// Every item with usage counts, newest first.
    pub async fn all_items_with_usage(&self) -> ServiceResult<Vec<ItemWithUsage>> {
        Ok(self.stats.all_items_with_usage().await?)
    }

    /// The grouped view: "Ungrouped" first, then groups alphabetically.
    pub async fn items_grouped(&self) -> ServiceResult<Vec<GroupBucket>> {
        Ok(self.stats.items_grouped().await?)
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
