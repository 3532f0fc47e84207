//! Input validation rules.
//!
//! All rules reject synchronously, before anything reaches the store.
//! Names are measured after trimming surrounding whitespace; the stored
//! value stays exactly what the caller supplied.

use regex::Regex;

use crate::error::{ServiceError, ServiceResult};

/// Maximum item name length in characters, after trimming.
pub const ITEM_NAME_MAX: usize = 50;

/// Maximum group name length in characters, after trimming.
pub const GROUP_NAME_MAX: usize = 30;

/// Compiled validation rules, built once per service.
pub(crate) struct Validator {
    hex_color: Regex,
}

impl Validator {
    pub(crate) fn new() -> Self {
        // Compile-time constant pattern; a failure here is a bug.
        let hex_color = Regex::new("^#[0-9a-fA-F]{6}$").expect("hex color pattern is valid");
        Self { hex_color }
    }

    /// Item name: required, non-empty after trimming, bounded length.
    pub(crate) fn item_name(&self, name: &str) -> ServiceResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::invalid("name", "must not be empty"));
        }
        if trimmed.chars().count() > ITEM_NAME_MAX {
            return Err(ServiceError::invalid(
                "name",
                format!("must be at most {ITEM_NAME_MAX} characters"),
            ));
        }
        Ok(())
    }

    /// Group name: required, non-empty after trimming, bounded length.
    /// Uniqueness is enforced by storage and surfaces as a store error.
    pub(crate) fn group_name(&self, name: &str) -> ServiceResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::invalid("name", "must not be empty"));
        }
        if trimmed.chars().count() > GROUP_NAME_MAX {
            return Err(ServiceError::invalid(
                "name",
                format!("must be at most {GROUP_NAME_MAX} characters"),
            ));
        }
        Ok(())
    }

    /// Price: strictly greater than zero. Applied on create and, when
    /// the field is present, on update.
    pub(crate) fn price(&self, price: f64) -> ServiceResult<()> {
        if price <= 0.0 || price.is_nan() {
            return Err(ServiceError::invalid("price", "must be greater than 0"));
        }
        Ok(())
    }

    /// Purchase date: required on create.
    pub(crate) fn purchase_date(&self, date: &str) -> ServiceResult<()> {
        if date.is_empty() {
            return Err(ServiceError::invalid("purchase_date", "is required"));
        }
        Ok(())
    }

    /// Color: `#` followed by exactly six hex digits, case-insensitive.
    /// Callers treat absent/empty colors as "use the default" and never
    /// pass them here.
    pub(crate) fn color(&self, color: &str) -> ServiceResult<()> {
        if !self.hex_color.is_match(color) {
            return Err(ServiceError::invalid(
                "color",
                format!("must be '#' followed by 6 hex digits, got {color:?}"),
            ));
        }
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
