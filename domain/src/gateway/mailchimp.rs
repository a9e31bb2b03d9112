//! Mailchimp API client.
//!
//! Mailchimp organizes an account's contacts into lists ("audiences"); members
//! are fetched per list. Authentication is a bearer token per request, since
//! one client instance serves every stored key for the provider.

use crate::audience::AudienceMember;
use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use crate::gateway::{CollectionRef, EspAdapter};
use async_trait::async_trait;
use entity::provider::Provider;
use log::*;
use serde::Deserialize;

pub struct MailchimpClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

/// Response from `GET /lists`
#[derive(Debug, Deserialize)]
pub struct ListsResponse {
    #[serde(default)]
    pub lists: Vec<List>,
}

#[derive(Debug, Deserialize)]
pub struct List {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from `GET /lists/{id}/members`
#[derive(Debug, Deserialize)]
pub struct MembersResponse {
    #[serde(default)]
    pub members: Vec<Member>,
}

/// One member record as Mailchimp returns it. Only the fields the unified
/// record needs are kept; Mailchimp sends empty strings for unset values.
#[derive(Debug, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Pure field remapping from Mailchimp's member shape to the unified record.
/// Missing or empty upstream fields become absent, never an error.
pub fn normalize(member: Member, list_id: &str) -> AudienceMember {
    AudienceMember {
        provider: Provider::Mailchimp,
        source_collection_id: Some(list_id.to_string()),
        external_id: member.id,
        email: member.email_address.filter(|email| !email.is_empty()),
        name: member.full_name.filter(|name| !name.is_empty()),
        status: member.status.filter(|status| !status.is_empty()),
        campaign_id: None,
    }
}

impl MailchimpClient {
    pub fn new(base_url: &str, page_size: u32) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            page_size,
        })
    }

    async fn fetch_lists(&self, secret_key: &str) -> Result<Vec<List>, Error> {
        let url = format!("{}/lists", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| {
                warn!("Mailchimp lists request failed: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Mailchimp lists request returned {status}");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream(Some(
                    status.as_u16(),
                ))),
            });
        }

        let body: ListsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Mailchimp lists response: {e:?}");
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream(None)),
            }
        })?;

        Ok(body.lists)
    }
}

#[async_trait]
impl EspAdapter for MailchimpClient {
    fn provider(&self) -> Provider {
        Provider::Mailchimp
    }

    async fn validate_key(&self, secret_key: &str) -> bool {
        let url = format!("{}/lists", self.base_url);

        match self.client.get(&url).bearer_auth(secret_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Mailchimp key validation request failed: {e:?}");
                false
            }
        }
    }

    async fn list_collections(&self, secret_key: &str) -> Result<Vec<CollectionRef>, Error> {
        Ok(self
            .fetch_lists(secret_key)
            .await?
            .into_iter()
            .map(|list| CollectionRef {
                id: Some(list.id),
                name: list.name,
            })
            .collect())
    }

    async fn list_members(
        &self,
        secret_key: &str,
        collection: &CollectionRef,
    ) -> Result<Vec<AudienceMember>, Error> {
        let list_id = collection.id.as_deref().ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Mailchimp member fetch requires a list id".to_string(),
            )),
        })?;

        let url = format!(
            "{}/lists/{}/members?count={}",
            self.base_url, list_id, self.page_size
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| {
                warn!("Mailchimp members request failed for list {list_id}: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Mailchimp members request for list {list_id} returned {status}");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream(Some(
                    status.as_u16(),
                ))),
            });
        }

        let body: MembersResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Mailchimp members response for list {list_id}: {e:?}");
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Upstream(None)),
            }
        })?;

        if body.members.len() as u32 >= self.page_size {
            warn!(
                "Mailchimp list {list_id} filled a whole page ({}); further pages are not fetched",
                self.page_size
            );
        }

        Ok(body
            .members
            .into_iter()
            .map(|member| normalize(member, list_id))
            .collect())
    }
}
