//! # peruse-service
//!
//! Application services for Peruse. This crate sits between the
//! presentation layer and `peruse-store`: every write is validated here
//! before it reaches storage, and every read is a plain pass-through —
//! no caching, no retries.
//!
//! ```ignore
//! use peruse_service::{GroupService, ItemService};
//! use peruse_store::Database;
//!
//! let db = Database::open("data/peruse.db")?;
//! db.initialize().await?;
//!
//! let items = ItemService::new(db.clone());
//! let groups = GroupService::new(db);
//! ```

pub mod error;
pub mod groups;
pub mod items;
mod validate;

pub use error::{ServiceError, ServiceResult};
pub use groups::GroupService;
pub use items::{ItemService, format_currency};
pub use validate::{GROUP_NAME_MAX, ITEM_NAME_MAX};
