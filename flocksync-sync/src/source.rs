//! Contact source: paginated retrieval from the ChurchSuite address book.

use crate::config::SourceConfig;
use crate::error::SyncResult;
use crate::http::JsonClient;
use crate::json::{as_count, is_truthy};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use flocksync_types::SourceContact;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Field names that may carry the next-page pointer, in lookup order.
const NEXT_PAGE_FIELDS: &[&str] = &["next_page", "next"];

/// Abstract contact source.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Returns the name of the source system.
    fn name(&self) -> &'static str;

    /// Drains every page into one ordered list.
    async fn fetch_all(&self) -> SyncResult<Vec<SourceContact>>;
}

/// Pagination metadata from one listing response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    pub total_pages: Option<u64>,
    pub next_page: Option<Value>,
}

impl Pagination {
    /// Reads the `pagination` object of a listing response.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(object) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            total_pages: object.get("total_pages").and_then(as_count),
            next_page: NEXT_PAGE_FIELDS
                .iter()
                .find_map(|field| object.get(*field).filter(|v| is_truthy(v)))
                .cloned(),
        }
    }

    pub fn has_next_pointer(&self) -> bool {
        self.next_page.as_ref().is_some_and(is_truthy)
    }
}

/// Decides which page to fetch after `current`.
///
/// Checked in order, first match wins:
/// 1. a total-page count above the current page
/// 2. an explicit next-page pointer
///
/// The two signals are not reconciled: a pointer still advances past a
/// total-page count that says the listing is done.
pub fn next_page(current: u32, pagination: &Pagination) -> Option<u32> {
    if pagination
        .total_pages
        .is_some_and(|total| u64::from(current) < total)
    {
        return current.checked_add(1);
    }
    if pagination.has_next_pointer() {
        return current.checked_add(1);
    }
    None
}

/// One decoded listing page.
#[derive(Debug, Clone, Default)]
pub struct ContactPage {
    pub contacts: Vec<SourceContact>,
    pub pagination: Pagination,
}

impl ContactPage {
    /// Decodes a listing body. A missing `results` array is an empty page;
    /// entries that are not objects are skipped.
    pub fn from_value(body: &Value) -> Self {
        let contacts = body
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|entry| match SourceContact::from_value(entry.clone()) {
                        Ok(contact) => Some(contact),
                        Err(e) => {
                            warn!("Skipping source record: {e}");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            contacts,
            pagination: Pagination::from_value(body.get("pagination")),
        }
    }
}

/// ChurchSuite address book source.
pub struct ChurchSuiteSource {
    client: JsonClient,
    config: SourceConfig,
    max_pages: u32,
}

impl ChurchSuiteSource {
    /// Creates a source with its own HTTP client.
    pub fn new(config: SourceConfig, policy: RetryPolicy, max_pages: u32) -> SyncResult<Self> {
        Ok(Self::with_client(JsonClient::new(policy)?, config, max_pages))
    }

    pub fn with_client(client: JsonClient, config: SourceConfig, max_pages: u32) -> Self {
        Self {
            client,
            config,
            max_pages,
        }
    }

    /// Filters are sent only when configured.
    fn page_query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", page.to_string())];
        if !self.config.tags.is_empty() {
            query.push(("tags", self.config.tags.join(",")));
        }
        if !self.config.site_ids.is_empty() {
            query.push(("site_ids", self.config.site_ids.join(",")));
        }
        query
    }

    /// Fetches and decodes a single page.
    pub async fn fetch_page(&self, page: u32) -> SyncResult<ContactPage> {
        let body = self
            .client
            .get_json(
                &self.config.contacts_url(),
                &[("X-Auth", self.config.api_key.as_str())],
                &self.page_query(page),
            )
            .await?;
        Ok(ContactPage::from_value(&body))
    }
}

#[async_trait]
impl ContactSource for ChurchSuiteSource {
    fn name(&self) -> &'static str {
        "ChurchSuite"
    }

    async fn fetch_all(&self) -> SyncResult<Vec<SourceContact>> {
        let mut all_contacts = Vec::new();
        let mut page: u32 = 1;

        loop {
            let ContactPage {
                contacts,
                pagination,
            } = self.fetch_page(page).await?;
            debug!(
                page,
                count = contacts.len(),
                total_pages = ?pagination.total_pages,
                "Fetched contacts page"
            );
            all_contacts.extend(contacts);

            match next_page(page, &pagination) {
                Some(next) if next > self.max_pages => {
                    warn!(
                        max_pages = self.max_pages,
                        "Stopping pagination at page limit; source still reports more pages"
                    );
                    break;
                }
                Some(next) => page = next,
                None => break,
            }
        }

        info!(pages = page, contacts = all_contacts.len(), "Fetched source contacts");
        Ok(all_contacts)
    }
}
