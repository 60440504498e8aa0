//! Provider bootstrap
//!
//! Resolves the Notion secret, builds the one shared API client and hands it
//! to every controller as [`ProviderClient`].

use crate::data_source::{NotionDatabaseDataSource, NotionPageDataSource};
use crate::resource::NotionDatabaseResource;
use declarative::{
    Attribute, DataSourceFactory, Diagnostic, Diagnostics, Provider, ProviderData,
    ResourceFactory, Schema, StringValue, data_source, resource,
};
use notionkit::{HttpClient, NotionApi, RetryConfig};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Type name prefixed to every resource and data source
pub const PROVIDER_TYPE_NAME: &str = "yoloexp";

/// Environment variable consulted when `notion_secret` is not configured
pub const SECRET_ENV: &str = "NOTION_SECRET";

/// Caller-supplied provider configuration
#[derive(Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub notion_secret: StringValue,
    #[serde(default)]
    pub recreate_on_read_error: StringValue,
    #[serde(default)]
    pub api_base_url: StringValue,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.notion_secret.is_null() { "<null>" } else { declarative::REDACTED };
        f.debug_struct("ProviderConfig")
            .field("notion_secret", &secret)
            .field("recreate_on_read_error", &self.recreate_on_read_error)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Which lookup failures during update lead to creating a replacement database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecreatePolicy {
    /// Only a confirmed not-found
    #[default]
    NotFoundOnly,
    /// Any failure to read the existing database
    AnyError,
}

impl RecreatePolicy {
    /// Whether a failed lookup should be answered with a re-create
    pub fn allows(self, err: &notionkit::Error) -> bool {
        match self {
            Self::NotFoundOnly => err.is_not_found(),
            Self::AnyError => true,
        }
    }
}

/// Problems with the provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "The notion_secret value depends on something that is not known yet. \
         Set it to a static value or use the {SECRET_ENV} environment variable."
    )]
    UnknownSecret,

    #[error(
        "No Notion secret was found. Set notion_secret in the provider configuration \
         or the {SECRET_ENV} environment variable."
    )]
    EmptySecret,

    #[error("recreate_on_read_error must be \"true\" or \"false\", got {0:?}")]
    InvalidRecreateFlag(String),

    #[error("api_base_url must be known during configuration")]
    UnknownApiBase,
}

impl ConfigError {
    pub fn summary(&self) -> &'static str {
        match self {
            Self::UnknownSecret => "Unknown Notion secret",
            Self::EmptySecret => "Missing Notion secret",
            Self::InvalidRecreateFlag(_) => "Invalid recreate_on_read_error",
            Self::UnknownApiBase => "Unknown API base URL",
        }
    }

    /// Configuration attribute the error is about
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::UnknownSecret | Self::EmptySecret => "notion_secret",
            Self::InvalidRecreateFlag(_) => "recreate_on_read_error",
            Self::UnknownApiBase => "api_base_url",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.summary(), self.to_string()).with_attribute(self.attribute())
    }
}

/// Resolve the secret: explicit value first, then the environment.
///
/// An explicit empty string counts as not set. An unknown explicit value is
/// rejected without looking at the environment.
pub fn resolve_secret<F>(explicit: &StringValue, env: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = match explicit {
        StringValue::Unknown => return Err(ConfigError::UnknownSecret),
        StringValue::Known(value) if !value.is_empty() => value.clone(),
        _ => env(SECRET_ENV).unwrap_or_default(),
    };

    if secret.is_empty() {
        return Err(ConfigError::EmptySecret);
    }
    Ok(secret)
}

fn parse_recreate_policy(value: &StringValue) -> Result<RecreatePolicy, ConfigError> {
    match value {
        StringValue::Null => Ok(RecreatePolicy::default()),
        StringValue::Unknown => Err(ConfigError::InvalidRecreateFlag("<unknown>".to_string())),
        StringValue::Known(v) => match v.trim().to_ascii_lowercase().as_str() {
            "" | "false" => Ok(RecreatePolicy::NotFoundOnly),
            "true" => Ok(RecreatePolicy::AnyError),
            _ => Err(ConfigError::InvalidRecreateFlag(v.clone())),
        },
    }
}

/// Everything needed to build the API client
#[derive(Clone)]
pub struct ClientSettings {
    pub secret: String,
    pub api_base: Option<String>,
    pub retry: RetryConfig,
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("secret", &declarative::REDACTED)
            .field("api_base", &self.api_base)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Builds the API client from resolved settings
pub type ClientFactory = Arc<dyn Fn(&ClientSettings) -> Arc<dyn NotionApi> + Send + Sync>;

/// Looks up an environment variable
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Shared data handed to every controller
#[derive(Clone)]
pub struct ProviderClient {
    pub api: Arc<dyn NotionApi>,
    pub recreate_policy: RecreatePolicy,
}

impl ProviderClient {
    /// Extract the client from provider data, rejecting any other type
    pub fn from_data(data: &ProviderData) -> Result<Self, Diagnostic> {
        data.get::<Self>().cloned()
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("recreate_policy", &self.recreate_policy)
            .finish_non_exhaustive()
    }
}

/// Error diagnostic for a failed remote call
pub fn remote_error(summary: &str, err: &notionkit::Error) -> Diagnostic {
    Diagnostic::error(summary, format!("{err} ({})", err.category().advice()))
}

/// Error diagnostic for a controller used before configuration
pub fn unconfigured() -> Diagnostic {
    Diagnostic::error(
        "Unconfigured client",
        "Expected a configured Notion client. Please report this issue to the provider developers.",
    )
}

/// The `yoloexp` provider
pub struct YoloProvider {
    version: String,
    env: EnvLookup,
    client_factory: ClientFactory,
}

impl YoloProvider {
    /// Provider that talks to the real API and reads the process environment
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            env: Arc::new(|key: &str| std::env::var(key).ok()),
            client_factory: Arc::new(|settings: &ClientSettings| {
                let mut client = HttpClient::new(settings.secret.clone()).with_retry(settings.retry.clone());
                if let Some(base) = &settings.api_base {
                    client = client.with_api_base(base.clone());
                }
                Arc::new(client) as Arc<dyn NotionApi>
            }),
        }
    }

    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn with_client_factory(mut self, factory: ClientFactory) -> Self {
        self.client_factory = factory;
        self
    }

    /// Turn configuration into client settings and a re-create policy
    pub fn resolve(&self, config: &ProviderConfig) -> Result<(ClientSettings, RecreatePolicy), ConfigError> {
        let secret = resolve_secret(&config.notion_secret, |key| (self.env)(key))?;
        let policy = parse_recreate_policy(&config.recreate_on_read_error)?;
        let api_base = match &config.api_base_url {
            StringValue::Unknown => return Err(ConfigError::UnknownApiBase),
            StringValue::Known(base) if !base.is_empty() => Some(base.trim_end_matches('/').to_string()),
            _ => None,
        };

        let settings = ClientSettings {
            secret,
            api_base,
            retry: RetryConfig::default(),
        };
        Ok((settings, policy))
    }
}

impl Provider for YoloProvider {
    type Config = ProviderConfig;

    fn type_name(&self) -> &str {
        PROVIDER_TYPE_NAME
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn schema(&self) -> Schema {
        Schema::new("Manage Notion databases and look up pages and databases.")
            .with_attribute(
                "notion_secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!(
                        "Notion integration secret. Falls back to the {SECRET_ENV} environment variable."
                    )),
            )
            .with_attribute(
                "recreate_on_read_error",
                Attribute::optional_string().with_description(
                    "When \"true\", any failure to read a database during update creates a replacement, \
                     not only a missing database.",
                ),
            )
            .with_attribute(
                "api_base_url",
                Attribute::optional_string()
                    .with_description(format!("Notion API base URL. Defaults to {}.", notionkit::DEFAULT_API_BASE)),
            )
    }

    fn configure(&self, config: ProviderConfig) -> Result<ProviderData, Diagnostics> {
        let (settings, recreate_policy) = self.resolve(&config).map_err(|e| e.to_diagnostic())?;
        log::debug!("Building Notion client with {settings:?}");

        let api = (self.client_factory)(&settings);
        Ok(ProviderData::new(ProviderClient { api, recreate_policy }))
    }

    fn resources(&self) -> Vec<ResourceFactory> {
        vec![(|| resource(NotionDatabaseResource::default())) as ResourceFactory]
    }

    fn data_sources(&self) -> Vec<DataSourceFactory> {
        vec![
            (|| data_source(NotionPageDataSource::default())) as DataSourceFactory,
            (|| data_source(NotionDatabaseDataSource::default())) as DataSourceFactory,
        ]
    }
}
