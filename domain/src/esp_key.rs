//! Stored ESP keys: upstream validation before persistence, plus lookups.

use crate::error::{DomainErrorKind, EntityErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use crate::gateway::AdapterRegistry;
use entity::esp_keys::Model;
use entity::provider::Provider;
use entity::Id;
use log::*;
use sea_orm::DatabaseConnection;

/// Validates a raw key against the live provider and persists it only when
/// the provider accepts it. The caller blocks for the upstream round-trip;
/// there is no retry, so a provider outage during validation reads the same
/// as a rejected key.
pub async fn create(
    db: &DatabaseConnection,
    registry: &AdapterRegistry,
    user_id: Id,
    provider: Provider,
    secret_key: String,
    name: Option<String>,
) -> Result<Model, Error> {
    let secret_key = secret_key.trim().to_string();
    if secret_key.is_empty() {
        return Err(Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Invalid,
            )),
        });
    }

    let adapter = registry.get(provider).ok_or_else(|| Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid)),
    })?;

    if !adapter.validate_key(&secret_key).await {
        warn!("Upstream rejected a new {provider} key for user {user_id}");
        return Err(Error {
            source: None,
            error_kind: DomainErrorKind::External(ExternalErrorKind::KeyRejected),
        });
    }

    Ok(entity_api::esp_key::create(db, user_id, provider, secret_key, name).await?)
}

pub async fn find_by_user(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(entity_api::esp_key::find_by_user_id(db, user_id).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Ok(entity_api::esp_key::find_by_id(db, id).await?)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    Ok(entity_api::esp_key::delete_by_id(db, id).await?)
}
