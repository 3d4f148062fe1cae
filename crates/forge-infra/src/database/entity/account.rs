//! Account entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub credits: i64,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Account.
impl From<Model> for forge_core::domain::Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            credits: model.credits,
            role: model.role,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Account to SeaORM ActiveModel.
impl From<forge_core::domain::Account> for ActiveModel {
    fn from(account: forge_core::domain::Account) -> Self {
        Self {
            id: Set(account.id),
            name: Set(account.name),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            credits: Set(account.credits),
            role: Set(account.role),
            created_at: Set(account.created_at.into()),
            updated_at: Set(account.updated_at.into()),
        }
    }
}
