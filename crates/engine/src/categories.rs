//! Spending/earning categories. Purely descriptive labels: they never affect
//! balances, only filtering and the income/expense flow buckets. Icon and
//! color are display hints denormalized onto transaction reads.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::normalize_optional_text};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl Category {
    pub fn new(
        owner_id: String,
        name: String,
        icon: Option<String>,
        color: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            icon: normalize_optional_text(icon),
            color: normalize_optional_text(color),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id.to_string()),
            owner_id: ActiveValue::Set(category.owner_id.clone()),
            name: ActiveValue::Set(category.name.clone()),
            icon: ActiveValue::Set(category.icon.clone()),
            color: ActiveValue::Set(category.color.clone()),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            owner_id: model.owner_id,
            name: model.name,
            icon: model.icon,
            color: model.color,
        })
    }
}
