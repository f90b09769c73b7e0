use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories, transactions};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    pub async fn create_category(
        &self,
        owner_id: &str,
        name: &str,
        icon: Option<String>,
        color: Option<String>,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, owner_id).await?;
            let existing = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .filter(categories::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(name));
            }
            let category = Category::new(owner_id.to_string(), name, icon, color);
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    pub async fn list_categories(&self, owner_id: &str) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Category::try_from).collect()
        })
    }

    pub async fn rename_category(
        &self,
        owner_id: &str,
        category_id: Uuid,
        name: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, owner_id, category_id).await?;
            let model = categories::ActiveModel {
                id: ActiveValue::Set(category_id.to_string()),
                name: ActiveValue::Set(name),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes an unused category. Income and expense rows always carry a
    /// category, so one still referenced cannot go away.
    pub async fn delete_category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, owner_id, category_id).await?;
            let referenced = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .filter(transactions::Column::CategoryId.eq(category_id.to_string()))
                .count(&db_tx)
                .await?;
            if referenced > 0 {
                return Err(EngineError::InvalidTransaction(
                    "category still has transactions".to_string(),
                ));
            }
            model.delete(&db_tx).await?;
            Ok(())
        })
    }
}
