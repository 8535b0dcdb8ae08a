//! Sync configuration and its resolution chain.
//!
//! Every value is resolved once at startup from, in priority order:
//! 1. an environment variable
//! 2. the TOML config file (`flocksync.toml` unless overridden)
//! 3. the built-in default

use crate::error::{SyncError, SyncResult};
use crate::retry::RetryPolicy;
use flocksync_types::DEFAULT_MAX_REPORTED_ERRORS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "flocksync.toml";

pub const ENV_SOURCE_DOMAIN: &str = "CHURCHSUITE_DOMAIN";
pub const ENV_SOURCE_API_KEY: &str = "CHURCHSUITE_API_KEY";
pub const ENV_SOURCE_API_VERSION: &str = "CHURCHSUITE_API_VERSION";
pub const ENV_SOURCE_TAGS: &str = "CHURCHSUITE_TAGS";
pub const ENV_SOURCE_SITE_IDS: &str = "CHURCHSUITE_SITE_IDS";
pub const ENV_TARGET_API_KEY: &str = "BREVO_API_KEY";
pub const ENV_TARGET_LIST_ID: &str = "BREVO_LIST_ID";
pub const ENV_ENVIRONMENT: &str = "FLOCKSYNC_ENV";

/// Source API version; selects the `/api/{v1|v2}` path segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = SyncError;

    fn from_str(s: &str) -> SyncResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            other => Err(SyncError::Config(format!(
                "unsupported source API version: {other}"
            ))),
        }
    }
}

/// Source (ChurchSuite) connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Tenant domain, e.g. `mychurch` or `mychurch.churchsuite.com`.
    pub domain: String,
    pub api_key: String,
    pub api_version: ApiVersion,
    /// Only contacts carrying one of these tags.
    pub tags: Vec<String>,
    /// Only contacts belonging to one of these sites.
    pub site_ids: Vec<String>,
    /// Overrides the URL derived from `domain`.
    pub base_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: String::new(),
            api_version: ApiVersion::V1,
            tags: Vec::new(),
            site_ids: Vec::new(),
            base_url: None,
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("domain", &self.domain)
            .field("api_key", &redact(&self.api_key))
            .field("api_version", &self.api_version)
            .field("tags", &self.tags)
            .field("site_ids", &self.site_ids)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SourceConfig {
    /// Scheme and host of the source API.
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.contains('.') {
            format!("https://{domain}")
        } else {
            format!("https://{domain}.churchsuite.com")
        }
    }

    /// The paginated contacts listing endpoint.
    pub fn contacts_url(&self) -> String {
        format!(
            "{}/api/{}/addressbook/contacts",
            self.base_url(),
            self.api_version.as_str()
        )
    }
}

/// Target (Brevo) connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub api_key: String,
    /// Raw list identifier; only a positive integer is honoured.
    #[serde(deserialize_with = "list_id::deserialize")]
    pub list_id: Option<String>,
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            list_id: None,
            base_url: "https://api.brevo.com".to_string(),
        }
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("api_key", &redact(&self.api_key))
            .field("list_id", &self.list_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TargetConfig {
    pub fn contacts_url(&self) -> String {
        format!("{}/v3/contacts", self.base_url.trim_end_matches('/'))
    }
}

/// Accepts `list_id = 12` as well as `list_id = "12"`.
mod list_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawListId {
        Number(i64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<RawListId>::deserialize(deserializer)?.map(|raw| match raw {
            RawListId::Number(n) => n.to_string(),
            RawListId::Text(text) => text,
        }))
    }
}

/// Full configuration for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
    pub retry: RetryPolicy,
    /// Cap on failures reported in the summary.
    pub max_reported_errors: usize,
    /// Hard stop for pagination.
    pub max_pages: u32,
    /// Deployment environment; anything but `production` exposes diagnostics.
    pub environment: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            target: TargetConfig::default(),
            retry: RetryPolicy::default(),
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
            max_pages: 10_000,
            environment: "production".to_string(),
        }
    }
}

impl SyncConfig {
    /// Resolves config from the process environment and the given (or default) file.
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        Self::resolve(path, |key| std::env::var(key).ok())
    }

    /// Resolves config with an explicit environment lookup.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn resolve<F>(path: Option<&Path>, env: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    info!("No config file at {:?}, using environment and defaults", default_path);
                    Self::default()
                }
            }
        };
        config.apply_env(env)?;
        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SyncError::ConfigFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&contents).map_err(|e| SyncError::ConfigFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn apply_env<F>(&mut self, env: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(domain) = lookup(ENV_SOURCE_DOMAIN) {
            self.source.domain = domain;
        }
        if let Some(key) = lookup(ENV_SOURCE_API_KEY) {
            self.source.api_key = key;
        }
        if let Some(version) = lookup(ENV_SOURCE_API_VERSION) {
            self.source.api_version = version.parse()?;
        }
        if let Some(tags) = lookup(ENV_SOURCE_TAGS) {
            self.source.tags = split_list(&tags);
        }
        if let Some(sites) = lookup(ENV_SOURCE_SITE_IDS) {
            self.source.site_ids = split_list(&sites);
        }
        if let Some(key) = lookup(ENV_TARGET_API_KEY) {
            self.target.api_key = key;
        }
        if let Some(list_id) = lookup(ENV_TARGET_LIST_ID) {
            self.target.list_id = Some(list_id);
        }
        if let Some(environment) = lookup(ENV_ENVIRONMENT) {
            self.environment = environment;
        }

        debug!(config = ?self, "Resolved sync config");
        Ok(())
    }

    /// Checks that every required credential is present.
    pub fn validate(&self) -> SyncResult<()> {
        let mut missing = Vec::new();
        if self.source.domain.trim().is_empty() && self.source.base_url.is_none() {
            missing.push("source domain");
        }
        if self.source.api_key.trim().is_empty() {
            missing.push("source API key");
        }
        if self.target.api_key.trim().is_empty() {
            missing.push("target API key");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Config(format!("missing {}", missing.join(", "))))
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }
}

/// Splits a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_churchsuite_host() {
        let source = SourceConfig {
            domain: "stmarks".to_string(),
            ..Default::default()
        };
        assert_eq!(
            source.contacts_url(),
            "https://stmarks.churchsuite.com/api/v1/addressbook/contacts"
        );
    }

    #[test]
    fn qualified_domain_used_verbatim() {
        let source = SourceConfig {
            domain: "stmarks.churchsuite.co.uk/".to_string(),
            api_version: ApiVersion::V2,
            ..Default::default()
        };
        assert_eq!(
            source.contacts_url(),
            "https://stmarks.churchsuite.co.uk/api/v2/addressbook/contacts"
        );
    }

    #[test]
    fn base_url_override_wins() {
        let source = SourceConfig {
            domain: "ignored".to_string(),
            base_url: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(source.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" a, ,b,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn api_version_parse() {
        assert_eq!("V2".parse::<ApiVersion>().unwrap(), ApiVersion::V2);
        assert_eq!("1".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert!("v3".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn debug_redacts_keys() {
        let mut config = SyncConfig::default();
        config.source.api_key = "cs-secret".to_string();
        config.target.api_key = "xkeysib-secret".to_string();
        let debug = format!("{config:?}");
        assert!(!debug.contains("cs-secret"));
        assert!(!debug.contains("xkeysib-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
