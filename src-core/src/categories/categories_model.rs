use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryError;
use crate::errors::{Error, Result};

/// Envelope-budgeting category.
///
/// `available` is derived: it always equals `assigned - activity` and is
/// rewritten inside the same transaction as whatever disturbed it.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub group_name: String,
    pub assigned: f64,
    pub activity: f64,
    pub available: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a new category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub group_name: String,
    pub assigned: f64,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Category(CategoryError::InvalidData(
                "Category name cannot be empty".to_string(),
            )));
        }
        if !self.assigned.is_finite() {
            return Err(Error::Category(CategoryError::InvalidData(
                "Assigned amount must be a finite number".to_string(),
            )));
        }
        Ok(())
    }
}

/// Input for renaming/regrouping an existing category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub id: String,
    pub name: String,
    pub group_name: String,
}

impl CategoryUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Category(CategoryError::InvalidData(
                "Category name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}
