//! Controller for stored ESP keys and audience retrieval.
//!
//! Keys are validated against the live provider before they are stored, and
//! the stored secret is never serialized back out. Audience endpoints come in
//! two flavors with deliberately different failure behavior: the single-key
//! fetch surfaces upstream errors, the all-keys aggregation degrades to
//! partial results.

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::esp_key::CreateEspKeyParams;
use crate::{AppState, Error};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use domain::error::{DomainErrorKind, EntityErrorKind, Error as DomainError, InternalErrorKind};
use domain::gateway::AdapterRegistry;
use domain::provider::Provider;
use domain::{audience, esp_key, esp_keys, Id};
use serde_json::json;
use service::config::ApiVersion;

/// POST a new ESP key
///
/// Validates the raw key against the provider's API and persists it for the
/// authenticated user when the provider accepts it.
#[utoipa::path(
    post,
    path = "/keys/{provider}",
    params(
        ApiVersion,
        ("provider" = String, Path, description = "ESP provider tag (mailchimp | getresponse)"),
    ),
    request_body = CreateEspKeyParams,
    responses(
        (status = 201, description = "Key validated and stored", body = domain::esp_keys::Model),
        (status = 400, description = "Blank key or the provider rejected it"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(provider): Path<Provider>,
    Json(params): Json<CreateEspKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let registry = AdapterRegistry::from_config(&app_state.config)?;

    let key = esp_key::create(
        app_state.db_conn_ref(),
        &registry,
        user.id,
        provider,
        params.key,
        params.name,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({"key": key}), "Key added")),
    ))
}

/// GET all stored keys of the authenticated user
#[utoipa::path(
    get,
    path = "/keys",
    params(ApiVersion),
    responses(
        (status = 200, description = "The user's stored keys, secrets omitted"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let keys = esp_key::find_by_user(app_state.db_conn_ref(), user.id).await?;

    Ok(Json(ApiResponse::success(
        json!({"keys": keys}),
        "All keys fetched",
    )))
}

/// GET the audience behind one stored key
///
/// Expands the key's collections and members; unlike the aggregate endpoint,
/// an upstream failure here is reported to the caller.
#[utoipa::path(
    get,
    path = "/keys/{provider}/{id}/lists",
    params(
        ApiVersion,
        ("provider" = String, Path, description = "ESP provider tag"),
        ("id" = String, Path, description = "Stored key ID"),
    ),
    responses(
        (status = 200, description = "Normalized audience members for this key"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such key for this user and provider"),
        (status = 502, description = "The provider call failed"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn audiences(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((provider, id)): Path<(Provider, Id)>,
) -> Result<impl IntoResponse, Error> {
    let key = find_owned_key(&app_state, &user, provider, id).await?;

    let registry = AdapterRegistry::from_config(&app_state.config)?;
    let members = audience::fetch_for_key(&registry, &key).await?;

    Ok(Json(ApiResponse::success(
        json!({"audiences": members}),
        "Audiences fetched",
    )))
}

/// GET the merged audience across every stored key of the user
///
/// Best-effort aggregation: keys whose provider errors contribute nothing
/// instead of failing the whole call. Only an empty key store is an error.
#[utoipa::path(
    get,
    path = "/keys/esp/lists",
    params(ApiVersion),
    responses(
        (status = 200, description = "Normalized audience members across all stored keys"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "The user has no stored keys"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn all_audiences(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let keys = esp_key::find_by_user(app_state.db_conn_ref(), user.id).await?;

    let registry = AdapterRegistry::from_config(&app_state.config)?;
    let members = audience::aggregate_all(&registry, &keys).await?;

    Ok(Json(ApiResponse::success(
        json!({"audiences": members}),
        "All ESP audiences fetched",
    )))
}

/// DELETE a stored key
#[utoipa::path(
    delete,
    path = "/keys/{provider}/{id}",
    params(
        ApiVersion,
        ("provider" = String, Path, description = "ESP provider tag"),
        ("id" = String, Path, description = "Stored key ID"),
    ),
    responses(
        (status = 200, description = "Key deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such key for this user and provider"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((provider, id)): Path<(Provider, Id)>,
) -> Result<impl IntoResponse, Error> {
    let key = find_owned_key(&app_state, &user, provider, id).await?;
    esp_key::delete_by_id(app_state.db_conn_ref(), key.id).await?;

    Ok(Json(ApiResponse::<()>::message_only("Key deleted")))
}

/// Looks up a key and checks it belongs to the caller under the named
/// provider. A key owned by someone else reads as absent rather than
/// forbidden, so key ids are not probeable.
async fn find_owned_key(
    app_state: &AppState,
    user: &domain::users::Model,
    provider: Provider,
    id: Id,
) -> Result<esp_keys::Model, Error> {
    let key = esp_key::find_by_id(app_state.db_conn_ref(), id).await?;

    if key.user_id != user.id || key.provider != provider {
        return Err(Error::from(DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NotFound,
            )),
        }));
    }

    Ok(key)
}
