use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::categories::categories_model::{Category, CategoryUpdate, NewCategory};
use crate::categories::categories_traits::CategoryRepositoryTrait;
use crate::categories::CategoryError;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{Error, Result};
use crate::ledger;
use crate::schema::categories;

pub struct CategoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CategoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        CategoryRepository { pool, writer }
    }
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    fn get_by_id(&self, category_id: &str) -> Result<Category> {
        let mut conn = get_connection(&self.pool)?;
        categories::table
            .find(category_id)
            .first::<Category>(&mut conn)
            .optional()?
            .ok_or_else(|| Error::Category(CategoryError::NotFound(category_id.to_string())))
    }

    fn list(&self) -> Result<Vec<Category>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(categories::table
            .order((categories::group_name.asc(), categories::name.asc()))
            .load::<Category>(&mut conn)?)
    }

    async fn create(&self, new_category: NewCategory) -> Result<Category> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Category> {
                let now = chrono::Utc::now().to_rfc3339();
                let category = Category {
                    id: new_category
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: new_category.name,
                    group_name: new_category.group_name,
                    assigned: new_category.assigned,
                    activity: 0.0,
                    available: new_category.assigned,
                    created_at: now.clone(),
                    updated_at: now,
                };

                diesel::insert_into(categories::table)
                    .values(&category)
                    .execute(conn)?;

                Ok(category)
            })
            .await
    }

    async fn update(&self, category_update: CategoryUpdate) -> Result<Category> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Category> {
                let now = chrono::Utc::now().to_rfc3339();
                let updated = diesel::update(categories::table.find(&category_update.id))
                    .set((
                        categories::name.eq(&category_update.name),
                        categories::group_name.eq(&category_update.group_name),
                        categories::updated_at.eq(&now),
                    ))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(Error::Category(CategoryError::NotFound(
                        category_update.id.clone(),
                    )));
                }

                Ok(categories::table
                    .find(&category_update.id)
                    .first::<Category>(conn)?)
            })
            .await
    }

    async fn set_assigned(&self, category_id: &str, assigned: f64) -> Result<Category> {
        let id_owned = category_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Category> {
                let now = chrono::Utc::now().to_rfc3339();
                let updated = diesel::update(categories::table.find(&id_owned))
                    .set((
                        categories::assigned.eq(assigned),
                        categories::updated_at.eq(&now),
                    ))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(Error::Category(CategoryError::NotFound(id_owned.clone())));
                }

                ledger::recalculate_category(conn, &id_owned)?;

                Ok(categories::table.find(&id_owned).first::<Category>(conn)?)
            })
            .await
    }

    async fn delete(&self, category_id: &str) -> Result<usize> {
        let id_owned = category_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(categories::table.find(id_owned)).execute(conn)?)
            })
            .await
    }
}
