//! CRUD operations for the esp_keys table.

use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::esp_keys::{ActiveModel, Column, Entity, Model};
use entity::provider::Provider;
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder};

/// Persists a new ESP key for a user.
///
/// When `name` is `None` a default label of the form `"<provider> key <n>"`
/// is assigned, where n counts the user's existing keys at call time. The
/// count-then-insert sequence is not serialized against concurrent creates
/// for the same user; see DESIGN.md.
pub async fn create(
    db: &DatabaseConnection,
    user_id: Id,
    provider: Provider,
    secret_key: String,
    name: Option<String>,
) -> Result<Model, Error> {
    let name = match name {
        Some(name) => name,
        None => {
            let existing = count_by_user_id(db, user_id).await?;
            default_key_name(provider, existing)
        }
    };

    debug!("New ESP key to be inserted for user {user_id}: provider={provider}, name={name}");

    let now = Utc::now();
    let esp_key_active_model = ActiveModel {
        user_id: Set(user_id),
        provider: Set(provider),
        name: Set(name),
        secret_key: Set(secret_key),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(esp_key_active_model.insert(db).await?)
}

pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_by_user_id(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn count_by_user_id(db: &DatabaseConnection, user_id: Id) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .count(db)
        .await?)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    let esp_key = find_by_id(db, id).await?;
    esp_key.delete(db).await?;
    Ok(())
}

/// Default label for a key stored without a caller-supplied name.
pub fn default_key_name(provider: Provider, existing_keys: u64) -> String {
    format!("{} key {}", provider, existing_keys + 1)
}
