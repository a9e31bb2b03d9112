//! Multi-provider audience aggregation.
//!
//! Resolves stored ESP keys into normalized audience members by fanning out
//! one branch per key and, inside each branch, one fetch per collection. The
//! batch path trades strict error signaling for availability: a failing
//! branch contributes zero members and is only observable in the logs. The
//! single-key path does the opposite and surfaces the upstream failure.

use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::gateway::{AdapterRegistry, CollectionRef, EspAdapter};
use entity::esp_keys;
use entity::provider::Provider;
use futures::future::join_all;
use log::*;
use serde::Serialize;

/// The provider-agnostic contact record produced by aggregation. Never
/// persisted; duplicates across providers and collections pass through
/// unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudienceMember {
    pub provider: Provider,
    /// Originating list for providers with a list-of-lists structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_collection_id: Option<String>,
    /// Provider-native member/contact identifier
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subscription status in the provider's own vocabulary, unnormalized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

/// Resolves every stored key into zero or more audience members and returns
/// the merged set.
///
/// The only failure that aborts the whole operation is an empty `esp_keys`
/// slice. Every other failure (unregistered provider, blank secret, provider
/// outage, malformed response) degrades to zero contribution from that
/// branch without cancelling its siblings. An empty result is a valid
/// success.
///
/// No ordering is guaranteed across keys or collections; within a single
/// upstream response the order is whatever the provider returned.
pub async fn aggregate_all(
    registry: &AdapterRegistry,
    esp_keys: &[esp_keys::Model],
) -> Result<Vec<AudienceMember>, Error> {
    if esp_keys.is_empty() {
        return Err(Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NoCredentials,
            )),
        });
    }

    debug!("Aggregating audiences across {} stored keys", esp_keys.len());

    let branches = esp_keys.iter().map(|key| resolve_key(registry, key));
    let members: Vec<AudienceMember> = join_all(branches).await.into_iter().flatten().collect();

    info!(
        "Aggregated {} audience members from {} keys",
        members.len(),
        esp_keys.len()
    );

    Ok(members)
}

/// Resolves the audience for one key, propagating upstream failures instead
/// of swallowing them. The caller asked about this specific key, so a
/// provider outage is an answer, not noise.
pub async fn fetch_for_key(
    registry: &AdapterRegistry,
    esp_key: &esp_keys::Model,
) -> Result<Vec<AudienceMember>, Error> {
    let adapter = registry.get(esp_key.provider).ok_or_else(|| Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid)),
    })?;

    let mut members = Vec::new();
    for collection in adapter.list_collections(&esp_key.secret_key).await? {
        members.extend(
            adapter
                .list_members(&esp_key.secret_key, &collection)
                .await?,
        );
    }

    Ok(members)
}

/// One aggregation branch: everything a single stored key contributes.
async fn resolve_key(registry: &AdapterRegistry, key: &esp_keys::Model) -> Vec<AudienceMember> {
    let Some(adapter) = registry.get(key.provider) else {
        warn!(
            "No adapter registered for provider {}; key {} contributes nothing",
            key.provider, key.id
        );
        return Vec::new();
    };

    if key.secret_key.trim().is_empty() {
        warn!("Stored key {} has a blank secret; skipping upstream calls", key.id);
        return Vec::new();
    }

    let collections = match adapter.list_collections(&key.secret_key).await {
        Ok(collections) => collections,
        Err(e) => {
            warn!("Listing collections failed for key {}: {e}", key.id);
            return Vec::new();
        }
    };

    let fetches = collections
        .iter()
        .map(|collection| fetch_collection(adapter.as_ref(), key, collection));
    join_all(fetches).await.into_iter().flatten().collect()
}

async fn fetch_collection(
    adapter: &dyn EspAdapter,
    key: &esp_keys::Model,
    collection: &CollectionRef,
) -> Vec<AudienceMember> {
    match adapter.list_members(&key.secret_key, collection).await {
        Ok(members) => members,
        Err(e) => {
            warn!(
                "Member fetch failed for key {} collection {:?}: {e}",
                key.id, collection.id
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExternalErrorKind;
    use crate::gateway::getresponse::GetResponseClient;
    use crate::gateway::mailchimp::MailchimpClient;
    use entity::Id;
    use mockito::{Server, ServerGuard};
    use std::sync::Arc;

    const PAGE_SIZE: u32 = 1000;

    fn stored_key(provider: Provider, secret_key: &str) -> esp_keys::Model {
        let now = chrono::Utc::now().fixed_offset();
        esp_keys::Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            provider,
            name: format!("{provider} key 1"),
            secret_key: secret_key.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn mailchimp_registry(server: &ServerGuard) -> AdapterRegistry {
        let mut registry = AdapterRegistry::empty();
        registry.register(Arc::new(
            MailchimpClient::new(&server.url(), PAGE_SIZE).unwrap(),
        ));
        registry
    }

    #[tokio::test]
    async fn aggregate_all_fails_without_any_stored_keys() {
        let registry = AdapterRegistry::empty();
        let err = aggregate_all(&registry, &[]).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NoCredentials))
        );
    }

    #[tokio::test]
    async fn aggregate_all_with_zero_collections_is_an_empty_success() {
        let mut server = Server::new_async().await;
        let _lists = server
            .mock("GET", "/lists")
            .with_status(200)
            .with_body(r#"{"lists": []}"#)
            .create_async()
            .await;

        let registry = mailchimp_registry(&server);
        let keys = vec![stored_key(Provider::Mailchimp, "mc-secret")];

        let members = aggregate_all(&registry, &keys).await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn aggregate_all_isolates_a_failing_sibling_key() {
        // Key A's provider is down; key B serves two contacts
        let mut mailchimp = Server::new_async().await;
        let _broken_lists = mailchimp
            .mock("GET", "/lists")
            .with_status(500)
            .create_async()
            .await;

        let mut getresponse = Server::new_async().await;
        let _contacts = getresponse
            .mock("GET", "/contacts?perPage=1000")
            .with_status(200)
            .with_body(
                r#"[{"contactId": "c1", "email": "a@example.com"},
                    {"contactId": "c2", "email": "b@example.com"}]"#,
            )
            .create_async()
            .await;

        let mut registry = AdapterRegistry::empty();
        registry.register(Arc::new(
            MailchimpClient::new(&mailchimp.url(), PAGE_SIZE).unwrap(),
        ));
        registry.register(Arc::new(
            GetResponseClient::new(&getresponse.url(), PAGE_SIZE).unwrap(),
        ));

        let keys = vec![
            stored_key(Provider::Mailchimp, "mc-secret"),
            stored_key(Provider::Getresponse, "gr-secret"),
        ];

        let members = aggregate_all(&registry, &keys).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members
            .iter()
            .all(|member| member.provider == Provider::Getresponse));
    }

    #[tokio::test]
    async fn aggregate_all_skips_keys_with_an_unregistered_provider() {
        let mut server = Server::new_async().await;
        let _lists = server
            .mock("GET", "/lists")
            .with_status(200)
            .with_body(r#"{"lists": []}"#)
            .create_async()
            .await;

        // Only the Mailchimp adapter is registered
        let registry = mailchimp_registry(&server);
        let keys = vec![
            stored_key(Provider::Getresponse, "gr-secret"),
            stored_key(Provider::Mailchimp, "mc-secret"),
        ];

        let members = aggregate_all(&registry, &keys).await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn aggregate_all_never_calls_upstream_for_a_blank_secret() {
        let mut server = Server::new_async().await;
        let lists = server
            .mock("GET", "/lists")
            .expect(0)
            .create_async()
            .await;

        let registry = mailchimp_registry(&server);
        let keys = vec![stored_key(Provider::Mailchimp, "   ")];

        let members = aggregate_all(&registry, &keys).await.unwrap();
        assert!(members.is_empty());
        lists.assert_async().await;
    }

    #[tokio::test]
    async fn aggregate_all_isolates_a_failing_sibling_collection() {
        let mut server = Server::new_async().await;
        let _lists = server
            .mock("GET", "/lists")
            .with_status(200)
            .with_body(r#"{"lists": [{"id": "a1"}, {"id": "b2"}]}"#)
            .create_async()
            .await;
        let _good_members = server
            .mock("GET", "/lists/a1/members?count=1000")
            .with_status(200)
            .with_body(r#"{"members": [{"id": "m1", "email_address": "a@example.com"}]}"#)
            .create_async()
            .await;
        let _bad_members = server
            .mock("GET", "/lists/b2/members?count=1000")
            .with_status(500)
            .create_async()
            .await;

        let registry = mailchimp_registry(&server);
        let keys = vec![stored_key(Provider::Mailchimp, "mc-secret")];

        let members = aggregate_all(&registry, &keys).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].source_collection_id.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn fetch_for_key_flattens_the_two_level_expansion() {
        let mut server = Server::new_async().await;
        let _lists = server
            .mock("GET", "/lists")
            .with_status(200)
            .with_body(r#"{"lists": [{"id": "a1"}, {"id": "b2"}]}"#)
            .create_async()
            .await;
        let _a1_members = server
            .mock("GET", "/lists/a1/members?count=1000")
            .with_status(200)
            .with_body(r#"{"members": [{"id": "m1"}, {"id": "m2"}]}"#)
            .create_async()
            .await;
        let _b2_members = server
            .mock("GET", "/lists/b2/members?count=1000")
            .with_status(200)
            .with_body(r#"{"members": [{"id": "m3"}]}"#)
            .create_async()
            .await;

        let registry = mailchimp_registry(&server);
        let key = stored_key(Provider::Mailchimp, "mc-secret");

        let members = fetch_for_key(&registry, &key).await.unwrap();
        assert_eq!(members.len(), 3);
    }

    #[tokio::test]
    async fn fetch_for_key_propagates_an_upstream_failure() {
        // The deliberate asymmetry with the batch path: the caller asked
        // about this key, so the failure is the answer
        let mut server = Server::new_async().await;
        let _lists = server
            .mock("GET", "/lists")
            .with_status(502)
            .create_async()
            .await;

        let registry = mailchimp_registry(&server);
        let key = stored_key(Provider::Mailchimp, "mc-secret");

        let err = fetch_for_key(&registry, &key).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Upstream(Some(502)))
        );
    }

    #[tokio::test]
    async fn fetch_for_key_rejects_an_unregistered_provider() {
        let registry = AdapterRegistry::empty();
        let key = stored_key(Provider::Mailchimp, "mc-secret");

        let err = fetch_for_key(&registry, &key).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
    }
}
