//! Group-facing application service.

use peruse_store::{Database, Group, GroupPatch, GroupStore};
use tracing::{debug, instrument};

use crate::error::ServiceResult;
use crate::validate::Validator;

/// Validated group operations over the record store.
pub struct GroupService {
    groups: GroupStore,
    validator: Validator,
}

impl GroupService {
    /// Create a new group service on top of `db`.
    pub fn new(db: Database) -> Self {
        Self {
            groups: GroupStore::new(db),
            validator: Validator::new(),
        }
    }

    /// Validate and create a group.
    ///
    /// Name uniqueness is enforced by storage; a duplicate surfaces the
    /// constraint error unmodified. An empty color string counts as
    /// absent and falls through to the store's default.
    #[instrument(skip(self))]
    pub async fn create_group(&self, name: &str, color: Option<&str>) -> ServiceResult<Group> {
        self.validator.group_name(name)?;

        let color = match color {
            None | Some("") => None,
            Some(c) => {
                self.validator.color(c)?;
                Some(c)
            }
        };

        let group = self.groups.create(name, color).await?;
        debug!(group_id = group.id, "group created");
        Ok(group)
    }

    /// Validate the supplied fields and apply a partial update.
    #[instrument(skip(self, patch))]
    pub async fn update_group(&self, id: i64, mut patch: GroupPatch) -> ServiceResult<()> {
        if let Some(name) = &patch.name {
            self.validator.group_name(name)?;
        }
        match patch.color.as_deref() {
            None => {}
            Some("") => patch.color = Some(peruse_store::DEFAULT_COLOR.to_string()),
            Some(color) => self.validator.color(color)?,
        }

        self.groups.update(id, patch).await?;
        Ok(())
    }

    /// Delete a group; its items become ungrouped.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, id: i64) -> ServiceResult<()> {
        self.groups.delete(id).await?;
        Ok(())
    }

    /// All groups, alphabetical by name.
    pub async fn groups(&self) -> ServiceResult<Vec<Group>> {
        Ok(self.groups.list().await?)
    }

    /// Fetch a single group; `None` when absent.
    pub async fn get_group(&self, id: i64) -> ServiceResult<Option<Group>> {
        Ok(self.groups.get(id).await?)
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
