//! HTTP gateways to the supported email service providers.
//!
//! Each provider gets one client that knows its wire shapes and auth scheme;
//! everything above this module works with the provider-agnostic
//! [`EspAdapter`] trait and the unified audience record.

pub mod getresponse;
pub mod mailchimp;

use crate::audience::AudienceMember;
use crate::error::Error;
use async_trait::async_trait;
use entity::provider::Provider;
use service::config::Config;
use std::collections::HashMap;
use std::sync::Arc;

/// A provider-specific grouping of contacts (a "list" in Mailchimp).
/// Providers with a flat contact model are represented as exactly one
/// implicit collection with `id: None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl CollectionRef {
    /// The single collection of a provider without a list-of-lists structure.
    pub fn implicit() -> Self {
        Self::default()
    }
}

/// Provider-specific capability set used by the aggregation engine.
#[async_trait]
pub trait EspAdapter: Send + Sync {
    /// Provider tag this adapter serves.
    fn provider(&self) -> Provider;

    /// Issues a lightweight authenticated read against the provider's base
    /// endpoint. Any non-success status or network-level failure means the
    /// key is unusable; this never errors.
    async fn validate_key(&self, secret_key: &str) -> bool;

    /// Every collection the key can see.
    async fn list_collections(&self, secret_key: &str) -> Result<Vec<CollectionRef>, Error>;

    /// All members of one collection, already normalized to
    /// [`AudienceMember`]. A single bounded page is fetched; deeper
    /// pagination is not followed.
    async fn list_members(
        &self,
        secret_key: &str,
        collection: &CollectionRef,
    ) -> Result<Vec<AudienceMember>, Error>;
}

/// Maps provider tags to adapter instances.
///
/// Stored keys whose provider has no registered adapter contribute nothing
/// to an aggregation; the registry itself never fails a lookup loudly.
pub struct AdapterRegistry {
    adapters: HashMap<Provider, Arc<dyn EspAdapter>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Builds the registry with every supported provider, pointed at the
    /// configured base URLs.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut registry = Self::empty();
        registry.register(Arc::new(mailchimp::MailchimpClient::new(
            config.mailchimp_base_url(),
            config.esp_page_size,
        )?));
        registry.register(Arc::new(getresponse::GetResponseClient::new(
            config.getresponse_base_url(),
            config.esp_page_size,
        )?));
        Ok(registry)
    }

    pub fn register(&mut self, adapter: Arc<dyn EspAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn EspAdapter>> {
        self.adapters.get(&provider)
    }
}
