use crate::error::Error;
use crate::users::Model;
use entity::Id;
use sea_orm::DatabaseConnection;

pub use entity_api::user::{AuthSession, Backend, Credentials};

pub async fn create(db: &DatabaseConnection, user_model: Model) -> Result<Model, Error> {
    Ok(entity_api::user::create(db, user_model).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, user_id: Id) -> Result<Model, Error> {
    Ok(entity_api::user::find_by_id(db, user_id).await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, Error> {
    Ok(entity_api::user::find_by_email(db, email).await?)
}
