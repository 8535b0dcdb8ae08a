//! Contact sink: create-or-update calls against the Brevo contacts API.

use crate::config::TargetConfig;
use crate::error::SyncResult;
use crate::http::JsonClient;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use flocksync_types::MappedContact;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Abstract contact sink.
#[async_trait]
pub trait ContactSink: Send + Sync {
    /// Returns the name of the target system.
    fn name(&self) -> &'static str;

    /// Creates the contact, or updates it if the email already exists.
    async fn upsert(&self, contact: &MappedContact) -> SyncResult<()>;
}

/// Parses a list identifier; only positive integers are accepted.
pub fn parse_list_id(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|id| *id > 0)
}

/// Builds the create-or-update request body.
pub fn upsert_body(contact: &MappedContact, list_id: Option<u64>) -> Value {
    let mut body = json!({
        "email": contact.email(),
        "attributes": contact.attributes(),
        "updateEnabled": true,
    });
    if let Some(id) = list_id {
        body["listIds"] = json!([id]);
    }
    body
}

/// Brevo contacts sink.
pub struct BrevoSink {
    client: JsonClient,
    config: TargetConfig,
    list_id: Option<u64>,
}

impl BrevoSink {
    /// Creates a sink with its own HTTP client.
    pub fn new(config: TargetConfig, policy: RetryPolicy) -> SyncResult<Self> {
        Ok(Self::with_client(JsonClient::new(policy)?, config))
    }

    pub fn with_client(client: JsonClient, config: TargetConfig) -> Self {
        let list_id = parse_list_id(config.list_id.as_deref());
        if list_id.is_none() {
            if let Some(raw) = config.list_id.as_deref().filter(|s| !s.trim().is_empty()) {
                warn!("Ignoring list id {raw:?}: not a positive integer");
            }
        }
        Self {
            client,
            config,
            list_id,
        }
    }

    /// The list every upserted contact is added to, if configured.
    pub fn list_id(&self) -> Option<u64> {
        self.list_id
    }
}

#[async_trait]
impl ContactSink for BrevoSink {
    fn name(&self) -> &'static str {
        "Brevo"
    }

    async fn upsert(&self, contact: &MappedContact) -> SyncResult<()> {
        self.client
            .post_json(
                &self.config.contacts_url(),
                &[
                    ("api-key", self.config.api_key.as_str()),
                    ("accept", "application/json"),
                ],
                upsert_body(contact, self.list_id),
            )
            .await?;
        debug!(email = contact.email(), "Upserted contact");
        Ok(())
    }
}
