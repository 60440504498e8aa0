//! Provider trait
//!
//! A provider declares its own configuration schema, turns a configuration
//! into shared [`ProviderData`] once per process, and lists the resources and
//! data sources it serves.

use crate::context::ProviderData;
use crate::resource::{DataSourceFactory, ResourceFactory};
use crate::schema::Schema;
use crate::types::Diagnostics;
use serde::de::DeserializeOwned;

pub trait Provider: Send + Sync {
    /// Typed provider configuration
    type Config: DeserializeOwned;

    /// Prefix of every resource and data source type name
    fn type_name(&self) -> &str;

    /// Provider version ("dev" for local builds)
    fn version(&self) -> &str;

    /// Schema of the provider configuration block
    fn schema(&self) -> Schema;

    /// Build the data shared by every resource and data source
    ///
    /// Called once per process activation. Any error diagnostic is fatal:
    /// no resource operation runs afterwards.
    fn configure(&self, config: Self::Config) -> Result<ProviderData, Diagnostics>;

    fn resources(&self) -> Vec<ResourceFactory>;

    fn data_sources(&self) -> Vec<DataSourceFactory>;
}
