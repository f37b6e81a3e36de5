use async_trait::async_trait;
use std::sync::Arc;

use crate::categories::categories_model::{Category, CategoryUpdate, NewCategory};
use crate::categories::categories_traits::{CategoryRepositoryTrait, CategoryServiceTrait};
use crate::errors::Result;

/// Service for managing envelope categories
pub struct CategoryService {
    repository: Arc<dyn CategoryRepositoryTrait>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CategoryServiceTrait for CategoryService {
    fn get_category(&self, category_id: &str) -> Result<Category> {
        self.repository.get_by_id(category_id)
    }

    fn get_categories(&self) -> Result<Vec<Category>> {
        self.repository.list()
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category> {
        new_category.validate()?;
        self.repository.create(new_category).await
    }

    async fn update_category(&self, category_update: CategoryUpdate) -> Result<Category> {
        category_update.validate()?;
        self.repository.update(category_update).await
    }

    async fn assign_to_category(&self, category_id: &str, assigned: f64) -> Result<Category> {
        self.repository.set_assigned(category_id, assigned).await
    }

    async fn delete_category(&self, category_id: &str) -> Result<usize> {
        self.repository.delete(category_id).await
    }
}
