//! ChurchSuite to Brevo contact sync.
//!
//! Each run pulls every contact from the ChurchSuite address book, maps it to
//! Brevo's contact schema, and upserts the result one contact at a time.
//! Nothing is persisted between runs: every run re-fetches everything.
//!
//! ## Components
//!
//! - **Retry**: fixed-delay retry wrapper shared by all HTTP calls
//! - **Source**: paginated ChurchSuite collector
//! - **Mapping**: field mapping with alternate-spelling lookup
//! - **Target**: Brevo create-or-update sink
//! - **Engine**: orchestrates one run and builds the summary
//!
//! # Example
//!
//! ```no_run
//! use flocksync_sync::{SyncConfig, SyncEngine};
//!
//! # async fn demo() -> flocksync_sync::SyncResult<()> {
//! let config = SyncConfig::load(None)?;
//! let summary = SyncEngine::new(config).run().await?;
//! println!("upserted {} of {}", summary.upserted, summary.fetched);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod engine;
mod error;
pub mod http;
mod json;
pub mod mapping;
pub mod retry;
pub mod source;
pub mod target;

pub use config::{ApiVersion, SourceConfig, SyncConfig, TargetConfig};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use http::{JsonClient, JsonRequest};
pub use mapping::map_contact;
pub use retry::{RetryPolicy, with_retry};
pub use source::{ChurchSuiteSource, ContactPage, ContactSource, Pagination, next_page};
pub use target::{BrevoSink, ContactSink, parse_list_id};
