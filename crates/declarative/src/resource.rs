//! Resource and data source traits
//!
//! A [`Resource`] is a managed remote object with a Create/Read/Update/Delete
//! lifecycle. A [`DataSource`] is a read-only lookup. Both work on a typed
//! state model; the server talks to them through the type-erased
//! [`DynResource`] / [`DynDataSource`] wrappers, which decode and encode JSON
//! state and turn failures into diagnostics.

use crate::context::{OperationContext, ProviderData};
use crate::schema::Schema;
use crate::types::{Diagnostic, Diagnostics};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Core trait for managed resources
///
/// Every operation receives the orchestrator's state decoded into
/// [`Resource::Model`] and returns the state to persist. Returning `Err`
/// aborts the operation; the orchestrator keeps its prior state.
///
/// # Example
///
/// ```ignore
/// use declarative::{Attribute, Diagnostic, OperationContext, ProviderData, Resource, Schema};
///
/// #[derive(Default)]
/// struct Note { client: Option<Client> }
///
/// impl Resource for Note {
///     type Model = NoteModel;
///
///     fn type_name(&self, provider: &str) -> String { format!("{provider}_note") }
///
///     fn schema(&self) -> Schema {
///         Schema::new("A note")
///             .with_attribute("id", Attribute::computed_string())
///             .with_attribute("text", Attribute::required_string())
///     }
///
///     fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic> {
///         self.client = Some(data.get::<Client>()?.clone());
///         Ok(())
///     }
///
///     // create / read / update / delete ...
/// }
/// ```
pub trait Resource: Send + Sync {
    /// Typed state model mirroring the schema
    type Model: Serialize + DeserializeOwned + fmt::Debug;

    /// Full type name, given the provider's type name
    fn type_name(&self, provider_type_name: &str) -> String;

    /// Static attribute schema
    fn schema(&self) -> Schema;

    /// Receive the provider's shared data; called once before any operation
    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic>;

    /// Create the remote object from the planned state
    fn create(&self, ctx: &mut OperationContext, plan: Self::Model) -> Result<Self::Model, Diagnostic>;

    /// Refresh the state from the remote object
    fn read(&self, ctx: &mut OperationContext, state: Self::Model) -> Result<Self::Model, Diagnostic>;

    /// Converge the remote object to the planned state
    fn update(
        &self,
        ctx: &mut OperationContext,
        prior: Self::Model,
        plan: Self::Model,
    ) -> Result<Self::Model, Diagnostic>;

    /// Remove the object; the orchestrator drops it from state on success
    fn delete(&self, ctx: &mut OperationContext, state: Self::Model) -> Result<(), Diagnostic>;
}

/// Core trait for read-only lookups
pub trait DataSource: Send + Sync {
    type Model: Serialize + DeserializeOwned + fmt::Debug;

    fn type_name(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic>;

    /// Look up the object described by `config` and return the full state
    fn read(&self, ctx: &mut OperationContext, config: Self::Model) -> Result<Self::Model, Diagnostic>;
}

/// Outcome of one operation as seen by the orchestrator
///
/// When `diagnostics` contains an error the orchestrator keeps its prior
/// state. Otherwise `state` is the new state, and `None` means the object
/// was removed from state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl Response {
    /// A failed operation
    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }

    /// Check if the operation succeeded (no error diagnostics)
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_error()
    }

    /// Look up a string attribute in the returned state
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.state.as_ref()?.get(name)?.as_str()
    }
}

/// Type-erased resource driven with JSON state
pub trait DynResource: Send + Sync {
    fn type_name(&self, provider_type_name: &str) -> String;
    fn schema(&self) -> Schema;
    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic>;
    fn create(&self, plan: Value) -> Response;
    fn read(&self, state: Value) -> Response;
    fn update(&self, prior: Value, plan: Value) -> Response;
    fn delete(&self, state: Value) -> Response;
}

/// Type-erased data source driven with JSON state
pub trait DynDataSource: Send + Sync {
    fn type_name(&self, provider_type_name: &str) -> String;
    fn schema(&self) -> Schema;
    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic>;
    fn read(&self, config: Value) -> Response;
}

/// Builds a fresh, unconfigured resource instance
pub type ResourceFactory = fn() -> Box<dyn DynResource>;

/// Builds a fresh, unconfigured data source instance
pub type DataSourceFactory = fn() -> Box<dyn DynDataSource>;

/// Erase a resource's model type
pub fn resource<R: Resource + 'static>(resource: R) -> Box<dyn DynResource> {
    Box::new(Erased(resource))
}

/// Erase a data source's model type
pub fn data_source<D: DataSource + 'static>(data_source: D) -> Box<dyn DynDataSource> {
    Box::new(Erased(data_source))
}

struct Erased<T>(T);

fn decode<M: DeserializeOwned>(value: Value, what: &str) -> Result<M, Diagnostic> {
    serde_json::from_value(value).map_err(|e| {
        Diagnostic::error(
            format!("Invalid {what}"),
            format!("Could not decode {what}: {e}"),
        )
    })
}

fn finish<M: Serialize>(ctx: OperationContext, result: Result<Option<M>, Diagnostic>) -> Response {
    let mut diagnostics = ctx.into_diagnostics();
    match result.and_then(|model| {
        model
            .map(|m| {
                serde_json::to_value(m).map_err(|e| {
                    Diagnostic::error("Invalid result state", format!("Could not encode state: {e}"))
                })
            })
            .transpose()
    }) {
        Ok(state) => Response { state, diagnostics },
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            Response {
                state: None,
                diagnostics,
            }
        }
    }
}

impl<R: Resource> DynResource for Erased<R> {
    fn type_name(&self, provider_type_name: &str) -> String {
        self.0.type_name(provider_type_name)
    }

    fn schema(&self) -> Schema {
        self.0.schema()
    }

    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic> {
        self.0.configure(data)
    }

    fn create(&self, plan: Value) -> Response {
        let mut ctx = OperationContext::new();
        let result = decode(plan, "plan").and_then(|plan| self.0.create(&mut ctx, plan).map(Some));
        finish(ctx, result)
    }

    fn read(&self, state: Value) -> Response {
        let mut ctx = OperationContext::new();
        let result = decode(state, "state").and_then(|state| self.0.read(&mut ctx, state).map(Some));
        finish(ctx, result)
    }

    fn update(&self, prior: Value, plan: Value) -> Response {
        let mut ctx = OperationContext::new();
        let result = decode(prior, "prior state").and_then(|prior| {
            let plan = decode(plan, "plan")?;
            self.0.update(&mut ctx, prior, plan).map(Some)
        });
        finish(ctx, result)
    }

    fn delete(&self, state: Value) -> Response {
        let mut ctx = OperationContext::new();
        let result = decode::<R::Model>(state, "state")
            .and_then(|state| self.0.delete(&mut ctx, state).map(|()| None::<R::Model>));
        finish(ctx, result)
    }
}

impl<D: DataSource> DynDataSource for Erased<D> {
    fn type_name(&self, provider_type_name: &str) -> String {
        self.0.type_name(provider_type_name)
    }

    fn schema(&self) -> Schema {
        self.0.schema()
    }

    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic> {
        self.0.configure(data)
    }

    fn read(&self, config: Value) -> Response {
        let mut ctx = OperationContext::new();
        let result = decode(config, "config").and_then(|config| self.0.read(&mut ctx, config).map(Some));
        finish(ctx, result)
    }
}
