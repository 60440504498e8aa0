//! Operation context and provider data injection
//!
//! [`ProviderData`] is the value a provider produces once at configuration
//! time and hands to every resource and data source. It is type-erased at the
//! seam and checked once, in each controller's `configure`.
//!
//! [`OperationContext`] collects non-fatal diagnostics (warnings) while a
//! single lifecycle operation runs.

use crate::types::{Diagnostic, Diagnostics};
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// Shared, immutable value produced by provider configuration
#[derive(Clone)]
pub struct ProviderData {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ProviderData {
    /// Wrap a value for injection into resources and data sources
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the concrete type held
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the value as `T`
    ///
    /// Returns an error diagnostic naming both types when the provider handed
    /// over something else, which means provider and controllers disagree.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<&T, Diagnostic> {
        self.value.downcast_ref::<T>().ok_or_else(|| {
            Diagnostic::error(
                "Unexpected Configure Type",
                format!(
                    "Expected {}, got: {}. Please report this issue to the provider developers.",
                    type_name::<T>(),
                    self.type_name
                ),
            )
        })
    }
}

impl fmt::Debug for ProviderData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderData")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Context passed to a single lifecycle operation
#[derive(Debug, Default)]
pub struct OperationContext {
    diagnostics: Diagnostics,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning that should reach the user even if the operation succeeds
    pub fn warn(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        let diagnostic = Diagnostic::warning(summary, detail);
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}
