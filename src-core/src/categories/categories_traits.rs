use async_trait::async_trait;

use crate::categories::categories_model::{Category, CategoryUpdate, NewCategory};
use crate::errors::Result;

#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    fn get_by_id(&self, category_id: &str) -> Result<Category>;
    fn list(&self) -> Result<Vec<Category>>;
    async fn create(&self, new_category: NewCategory) -> Result<Category>;
    async fn update(&self, category_update: CategoryUpdate) -> Result<Category>;
    async fn set_assigned(&self, category_id: &str, assigned: f64) -> Result<Category>;
    async fn delete(&self, category_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait CategoryServiceTrait: Send + Sync {
    fn get_category(&self, category_id: &str) -> Result<Category>;
    fn get_categories(&self) -> Result<Vec<Category>>;
    async fn create_category(&self, new_category: NewCategory) -> Result<Category>;
    async fn update_category(&self, category_update: CategoryUpdate) -> Result<Category>;
    /// Assigns funds to the envelope and re-establishes
    /// `available = assigned - activity` in the same transaction.
    async fn assign_to_category(&self, category_id: &str, assigned: f64) -> Result<Category>;
    async fn delete_category(&self, category_id: &str) -> Result<usize>;
}
