//! Sync engine: fetch, map, upsert, summarize.
//!
//! One run is strictly sequential. Setup errors abort before any request;
//! a failed fetch aborts the run; a failed upsert is recorded and the run
//! moves on to the next contact.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::mapping::map_contact;
use crate::source::{ChurchSuiteSource, ContactSource};
use crate::target::{BrevoSink, ContactSink};
use flocksync_types::{MappedContact, SyncSummary};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Runs ChurchSuite to Brevo syncs.
pub struct SyncEngine {
    config: SyncConfig,
    parts: Option<(Box<dyn ContactSource>, Box<dyn ContactSink>)>,
}

impl SyncEngine {
    /// Creates an engine that builds its HTTP clients from `config` on each run.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            parts: None,
        }
    }

    /// Creates an engine with an explicit source and sink.
    pub fn with_parts(
        config: SyncConfig,
        source: Box<dyn ContactSource>,
        sink: Box<dyn ContactSink>,
    ) -> Self {
        Self {
            config,
            parts: Some((source, sink)),
        }
    }

    /// Performs one full sync and returns its summary.
    pub async fn run(&self) -> SyncResult<SyncSummary> {
        self.config.validate()?;

        let run_id = Uuid::now_v7();
        let span = info_span!("sync_run", %run_id);

        async {
            match &self.parts {
                Some((source, sink)) => self.sync(source.as_ref(), sink.as_ref()).await,
                None => {
                    let source = ChurchSuiteSource::new(
                        self.config.source.clone(),
                        self.config.retry,
                        self.config.max_pages,
                    )?;
                    let sink = BrevoSink::new(self.config.target.clone(), self.config.retry)?;
                    self.sync(&source, &sink).await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn sync(
        &self,
        source: &dyn ContactSource,
        sink: &dyn ContactSink,
    ) -> SyncResult<SyncSummary> {
        info!(source = source.name(), "Fetching contacts");
        let contacts = source.fetch_all().await?;
        let mut summary = SyncSummary::new(contacts.len());

        let mapped: Vec<MappedContact> = contacts.iter().filter_map(map_contact).collect();
        let dropped = contacts.len() - mapped.len();
        if dropped > 0 {
            info!(dropped, "Skipping contacts without an email address");
        }

        info!(sink = sink.name(), count = mapped.len(), "Upserting contacts");
        for contact in &mapped {
            match sink.upsert(contact).await {
                Ok(()) => {
                    debug!(email = contact.email(), "Contact synced");
                    summary.record_success();
                }
                Err(e) => {
                    warn!(email = contact.email(), error = %e, "Upsert failed");
                    summary.record_failure(
                        contact.email(),
                        e.to_string(),
                        self.config.max_reported_errors,
                    );
                }
            }
        }

        info!(
            fetched = summary.fetched,
            upserted = summary.upserted,
            failed = summary.failed,
            "Sync complete"
        );
        Ok(summary)
    }
}
