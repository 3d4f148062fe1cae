use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait,
};

use forge_core::domain::Identifiable;
use forge_core::error::RepoError;
use forge_core::ports::BaseRepository;

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Map a SeaORM error, surfacing unique violations as constraint errors.
pub(crate) fn map_db_err(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint("Entity already exists".to_string())
    } else if matches!(e, DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) {
        RepoError::Connection(err_str)
    } else {
        RepoError::Query(err_str)
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: Identifiable<ID> + From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        // An ActiveModel with every column set updates on `save`, so pick
        // insert or update from whether the row exists.
        let exists = E::find_by_id(entity.id())
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .is_some();

        let active_model: E::ActiveModel = entity.into();
        let model = if exists {
            active_model.update(&self.db).await
        } else {
            active_model.insert(&self.db).await
        }
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
