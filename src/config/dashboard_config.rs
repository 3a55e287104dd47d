use crate::repository::graphql::GraphQlRecordStore;
use crate::services::dashboard::DashboardOptions;
use crate::domain::seating::DEFAULT_TABLE_CAPACITY;
use crate::domain::table::DEFAULT_PAGE_SIZE;
use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const ENDPOINT_ENV: &str = "RSVP_GRAPHQL_ENDPOINT";
pub const API_KEY_ENV: &str = "RSVP_GRAPHQL_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// GraphQL endpoint of the hosted RSVP API
    pub graphql_endpoint: String,

    /// Sent as the `x-api-key` header when present
    pub api_key: Option<String>,

    pub request_timeout_seconds: u64,

    /// `limit` for each `listRSVPs` page while loading the full collection
    pub list_page_size: usize,

    /// Rows per table page
    pub table_page_size: usize,

    /// Guests per table in the seating plan
    pub table_capacity: usize,

    /// SQLite file holding custom group names
    pub group_store_path: PathBuf,

    /// Where exports land when no explicit path is given
    pub export_directory: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rsvp-admin");
        Self {
            graphql_endpoint: String::new(),
            api_key: None,
            request_timeout_seconds: 10,
            list_page_size: 100,
            table_page_size: DEFAULT_PAGE_SIZE,
            table_capacity: DEFAULT_TABLE_CAPACITY,
            group_store_path: data_dir.join("groups.db"),
            export_directory: PathBuf::from("."),
        }
    }
}

impl DashboardConfig {
    /// Load from the default location, creating it with defaults when
    /// missing, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = Self::default();
            default_config.save_to(path)?;
            Ok(default_config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rsvp-admin").join("config.toml"))
    }

    /// Environment values win over the file. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.graphql_endpoint = endpoint.trim().to_string();
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        if self.graphql_endpoint.trim().is_empty() {
            bail!(
                "No GraphQL endpoint configured. Set graphql_endpoint in the config file or {ENDPOINT_ENV}"
            );
        }
        Url::parse(self.graphql_endpoint.trim())
            .with_context(|| format!("Invalid GraphQL endpoint '{}'", self.graphql_endpoint))
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.request_timeout_seconds == 0 {
            bail!("request_timeout_seconds must be at least 1");
        }
        if self.table_page_size == 0 {
            bail!("table_page_size must be at least 1");
        }
        if self.table_capacity == 0 {
            bail!("table_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            table_page_size: self.table_page_size,
            list_page_size: (self.list_page_size > 0).then_some(self.list_page_size),
            table_capacity: self.table_capacity,
        }
    }

    pub fn record_store(&self) -> Result<GraphQlRecordStore> {
        self.validate()?;
        let store = GraphQlRecordStore::new(
            self.endpoint_url()?,
            self.api_key.clone(),
            self.request_timeout(),
        )
        .context("Failed to build HTTP client")?;
        Ok(store)
    }
}
