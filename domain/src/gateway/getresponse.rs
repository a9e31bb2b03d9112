//! GetResponse API client.
//!
//! GetResponse exposes a flat contact model: there is no list-of-lists
//! structure, so the whole account maps to a single implicit collection.
//! Authentication uses the `X-Auth-Token: api-key <key>` header scheme.

use crate::audience::AudienceMember;
use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::gateway::{CollectionRef, EspAdapter};
use async_trait::async_trait;
use entity::provider::Provider;
use log::*;
use serde::Deserialize;

const AUTH_HEADER: &str = "X-Auth-Token";

pub struct GetResponseClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

/// One contact record as GetResponse returns it; `GET /contacts` responds
/// with a bare JSON array of these.
#[derive(Debug, Deserialize)]
pub struct Contact {
    #[serde(rename = "contactId")]
    pub contact_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub campaign: Option<Campaign>,
}

/// Campaign context GetResponse attaches per contact.
#[derive(Debug, Deserialize)]
pub struct Campaign {
    #[serde(rename = "campaignId")]
    pub campaign_id: String,
}

/// Pure field remapping from GetResponse's contact shape to the unified
/// record. Missing upstream fields become absent, never an error.
pub fn normalize(contact: Contact) -> AudienceMember {
    AudienceMember {
        provider: Provider::Getresponse,
        source_collection_id: None,
        external_id: contact.contact_id,
        email: contact.email.filter(|email| !email.is_empty()),
        name: contact.name.filter(|name| !name.is_empty()),
        status: None,
        campaign_id: contact.campaign.map(|campaign| campaign.campaign_id),
    }
}

impl GetResponseClient {
    pub fn new(base_url: &str, page_size: u32) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            page_size,
        })
    }

    fn auth_value(secret_key: &str) -> String {
        format!("api-key {secret_key}")
    }
}

#[async_trait]
impl EspAdapter for GetResponseClient {
    fn provider(&self) -> Provider {
        Provider::Getresponse
    }

    async fn validate_key(&self, secret_key: &str) -> bool {
        let url = format!("{}/contacts", self.base_url);

        match self
            .client
            .get(&url)
            .header(AUTH_HEADER, Self::auth_value(secret_key))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("GetResponse key validation request failed: {e:?}");
                false
            }
        }
    }

    async fn list_collections(&self, _secret_key: &str) -> Result<Vec<CollectionRef>, Error> {
        // Flat contact model: one implicit collection, no upstream call
        Ok(vec![CollectionRef::implicit()])
    }

    async fn list_members(
        &self,
        secret_key: &str,
        _collection: &CollectionRef,
    ) -> Result<Vec<AudienceMember>, Error> {
        let url = format!("{}/contacts?perPage={}", self.base_url, self.page_size);

        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, Self::auth_value(secret_key))
            .send()
            .await
            .map_err(|e| {
                warn!("GetResponse contacts request failed: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("GetResponse contacts request returned {status}");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream(Some(
                    status.as_u16(),
                ))),
            });
        }

        let contacts: Vec<Contact> = response.json().await.map_err(|e| {
            warn!("Failed to parse GetResponse contacts response: {e:?}");
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream(None)),
            }
        })?;

        if contacts.len() as u32 >= self.page_size {
            warn!(
                "GetResponse returned a full page ({}); further pages are not fetched",
                self.page_size
            );
        }

        Ok(contacts.into_iter().map(normalize).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const PAGE_SIZE: u32 = 1000;

    #[test]
    fn normalize_maps_missing_optional_fields_to_none() {
        let contact: Contact = serde_json::from_value(serde_json::json!({
            "contactId": "c-77",
        }))
        .unwrap();

        let normalized = normalize(contact);
        assert_eq!(normalized.provider, Provider::Getresponse);
        assert_eq!(normalized.source_collection_id, None);
        assert_eq!(normalized.external_id, "c-77");
        assert_eq!(normalized.email, None);
        assert_eq!(normalized.name, None);
        assert_eq!(normalized.campaign_id, None);
    }

    #[test]
    fn normalize_carries_the_campaign_id_through() {
        let contact: Contact = serde_json::from_value(serde_json::json!({
            "contactId": "c-77",
            "name": "Grace",
            "email": "grace@example.com",
            "campaign": {"campaignId": "camp-3"},
        }))
        .unwrap();

        let normalized = normalize(contact);
        assert_eq!(normalized.name.as_deref(), Some("Grace"));
        assert_eq!(normalized.campaign_id.as_deref(), Some("camp-3"));
    }

    #[tokio::test]
    async fn list_collections_is_a_single_implicit_collection() {
        // No mock server: the flat model never touches the network here
        let client = GetResponseClient::new("http://127.0.0.1:9", PAGE_SIZE).unwrap();
        let collections = client.list_collections("key").await.unwrap();
        assert_eq!(collections, vec![CollectionRef::implicit()]);
    }

    #[tokio::test]
    async fn validate_key_sends_the_api_key_header_scheme() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/contacts")
            .match_header("x-auth-token", "api-key gr-secret")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = GetResponseClient::new(&server.url(), PAGE_SIZE).unwrap();
        assert!(client.validate_key("gr-secret").await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_members_normalizes_the_contact_array() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/contacts?perPage=1000")
            .with_status(200)
            .with_body(
                r#"[
                    {"contactId": "c1", "name": "Grace", "email": "grace@example.com",
                     "campaign": {"campaignId": "camp-3"}},
                    {"contactId": "c2"}
                ]"#,
            )
            .create_async()
            .await;

        let client = GetResponseClient::new(&server.url(), PAGE_SIZE).unwrap();
        let members = client
            .list_members("key", &CollectionRef::implicit())
            .await
            .unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].campaign_id.as_deref(), Some("camp-3"));
        assert_eq!(members[1].email, None);
    }

    #[tokio::test]
    async fn list_members_surfaces_the_upstream_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/contacts?perPage=1000")
            .with_status(401)
            .create_async()
            .await;

        let client = GetResponseClient::new(&server.url(), PAGE_SIZE).unwrap();
        let err = client
            .list_members("key", &CollectionRef::implicit())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Upstream(Some(401)))
        );
    }
}
