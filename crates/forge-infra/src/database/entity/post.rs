//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use forge_core::domain::{Category, Visibility};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub category: String,
    /// JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub word_count: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub prompt: Option<String>,
    pub model_used: Option<String>,
    pub tokens_used: Option<i64>,
    pub visibility: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::UserId",
        to = "super::account::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for forge_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            body: model.body,
            category: Category::from_tag(&model.category),
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            word_count: model.word_count,
            prompt: model.prompt,
            model_used: model.model_used,
            tokens_used: model.tokens_used,
            visibility: Visibility::from_tag(&model.visibility),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<forge_core::domain::Post> for ActiveModel {
    fn from(post: forge_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            user_id: Set(post.user_id),
            title: Set(post.title),
            body: Set(post.body),
            category: Set(post.category.as_str().to_string()),
            tags: Set(serde_json::Value::from(post.tags)),
            word_count: Set(post.word_count),
            prompt: Set(post.prompt),
            model_used: Set(post.model_used),
            tokens_used: Set(post.tokens_used),
            visibility: Set(post.visibility.as_str().to_string()),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
