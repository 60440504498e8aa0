//! In-process provider server
//!
//! [`ProviderServer`] is the single entry point the host drives: it
//! configures the provider once, then dispatches lifecycle calls by type
//! name. Every call gets a fresh controller instance configured with the
//! shared [`ProviderData`], so calls for different objects can run
//! concurrently without sharing mutable state.

use crate::context::ProviderData;
use crate::provider::Provider;
use crate::resource::{DataSourceFactory, DynDataSource, DynResource, ResourceFactory, Response};
use crate::schema::{Schema, Validation};
use crate::types::{Diagnostic, Diagnostics};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A single lifecycle call, as read from a batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    Create {
        resource: String,
        planned: Value,
    },
    Read {
        resource: String,
        state: Value,
    },
    Update {
        resource: String,
        prior: Value,
        planned: Value,
    },
    Delete {
        resource: String,
        state: Value,
    },
    ReadDataSource {
        data_source: String,
        config: Value,
    },
}

impl Call {
    /// Type name the call targets
    pub fn target(&self) -> &str {
        match self {
            Call::Create { resource, .. }
            | Call::Read { resource, .. }
            | Call::Update { resource, .. }
            | Call::Delete { resource, .. } => resource,
            Call::ReadDataSource { data_source, .. } => data_source,
        }
    }
}

/// Every schema the provider serves
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchemas {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}

pub struct ProviderServer<P: Provider> {
    provider: P,
    data: OnceLock<ProviderData>,
    resources: BTreeMap<String, ResourceFactory>,
    data_sources: BTreeMap<String, DataSourceFactory>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let prefix = provider.type_name().to_string();

        let resources = provider
            .resources()
            .into_iter()
            .map(|factory| (factory().type_name(&prefix), factory))
            .collect();
        let data_sources = provider
            .data_sources()
            .into_iter()
            .map(|factory| (factory().type_name(&prefix), factory))
            .collect();

        Self {
            provider,
            data: OnceLock::new(),
            resources,
            data_sources,
        }
    }

    /// Type names of managed resources
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Type names of data sources
    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    pub fn schemas(&self) -> ProviderSchemas {
        ProviderSchemas {
            provider: self.provider.schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, factory)| (name.clone(), factory().schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, factory)| (name.clone(), factory().schema()))
                .collect(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.data.get().is_some()
    }

    /// Configure the provider; only the first successful call takes effect
    pub fn configure(&self, config: Value) -> Diagnostics {
        if self.is_configured() {
            return Diagnostic::error(
                "Provider already configured",
                "The provider is configured once per process activation.",
            )
            .into();
        }

        let schema = self.provider.schema();
        log::debug!("Configuring provider with {}", schema.redact(&config));

        let diags = schema.validate(&config, Validation::Config);
        if diags.has_error() {
            return diags;
        }

        let typed: P::Config = match serde_json::from_value(config) {
            Ok(typed) => typed,
            Err(e) => {
                return Diagnostic::error("Invalid provider configuration", e.to_string()).into();
            }
        };

        match self.provider.configure(typed) {
            Ok(data) => {
                if self.data.set(data).is_err() {
                    return Diagnostic::error(
                        "Provider already configured",
                        "The provider is configured once per process activation.",
                    )
                    .into();
                }
                log::info!("Provider {} configured", self.provider.type_name());
                diags
            }
            Err(errors) => {
                let mut all = diags;
                all.extend(errors);
                all
            }
        }
    }

    pub fn create(&self, type_name: &str, planned: Value) -> Response {
        self.with_resource(type_name, &planned, Validation::Config, |r| r.create(planned.clone()))
    }

    pub fn read(&self, type_name: &str, state: Value) -> Response {
        self.with_resource(type_name, &state, Validation::State, |r| r.read(state.clone()))
    }

    pub fn update(&self, type_name: &str, prior: Value, planned: Value) -> Response {
        self.with_resource(type_name, &planned, Validation::State, |r| {
            r.update(prior.clone(), planned.clone())
        })
    }

    pub fn delete(&self, type_name: &str, state: Value) -> Response {
        self.with_resource(type_name, &state, Validation::Removal, |r| r.delete(state.clone()))
    }

    pub fn read_data_source(&self, type_name: &str, config: Value) -> Response {
        let Some(factory) = self.data_sources.get(type_name) else {
            return Response::failed(Diagnostic::error(
                "Unknown data source type",
                format!("The provider does not serve a data source named \"{type_name}\"."),
            ));
        };

        let mut instance = factory();
        let diags = instance.schema().validate(&config, Validation::Config);
        if diags.has_error() {
            return Response::failed(diags);
        }
        if let Err(diag) = self.inject(|data| instance.configure(data)) {
            return Response::failed(diag);
        }

        log::debug!("Reading data source {type_name}");
        instance.read(config)
    }

    /// Dispatch one call
    pub fn call(&self, call: &Call) -> Response {
        match call {
            Call::Create { resource, planned } => self.create(resource, planned.clone()),
            Call::Read { resource, state } => self.read(resource, state.clone()),
            Call::Update {
                resource,
                prior,
                planned,
            } => self.update(resource, prior.clone(), planned.clone()),
            Call::Delete { resource, state } => self.delete(resource, state.clone()),
            Call::ReadDataSource {
                data_source,
                config,
            } => self.read_data_source(data_source, config.clone()),
        }
    }

    /// Run independent calls concurrently on `jobs` threads
    ///
    /// Responses come back in the order of `calls`. A failing call never
    /// affects the others.
    pub fn run_batch(&self, calls: &[Call], jobs: usize) -> Result<Vec<Response>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

        Ok(pool.install(|| calls.par_iter().map(|call| self.call(call)).collect()))
    }

    fn with_resource<F>(&self, type_name: &str, value: &Value, mode: Validation, op: F) -> Response
    where
        F: FnOnce(&dyn DynResource) -> Response,
    {
        let Some(factory) = self.resources.get(type_name) else {
            return Response::failed(Diagnostic::error(
                "Unknown resource type",
                format!("The provider does not serve a resource named \"{type_name}\"."),
            ));
        };

        let mut instance = factory();
        let diags = instance.schema().validate(value, mode);
        if diags.has_error() {
            return Response::failed(diags);
        }
        if let Err(diag) = self.inject(|data| instance.configure(data)) {
            return Response::failed(diag);
        }

        log::debug!("Running {type_name} operation");
        op(instance.as_ref())
    }

    fn inject<F>(&self, configure: F) -> Result<(), Diagnostic>
    where
        F: FnOnce(&ProviderData) -> Result<(), Diagnostic>,
    {
        let data = self.data.get().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                "The provider must be configured before resources or data sources are used.",
            )
        })?;
        configure(data)
    }
}
