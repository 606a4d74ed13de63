//! Bootstrap driver: discovery over every candidate, then validation once.

use std::sync::Arc;

use tracing::info;

use crate::config::SecurityExtensionConfig;
use crate::element::TypeDescriptor;
use crate::error::DeploymentError;
use crate::extension::{DefinitionErrors, SecurityExtension};
use crate::storage::SecurityMetadataStorage;

/// Result of a successful bootstrap.
pub struct BootstrapOutcome {
    /// Candidate descriptors, augmented where secured, in discovery order.
    pub types: Vec<TypeDescriptor>,
    /// Read-only registry for the runtime interceptor.
    pub storage: Arc<SecurityMetadataStorage>,
}

/// Drives a [`SecurityExtension`] through one container bootstrap.
///
/// [`SecurityBootstrap::finish`] consumes the driver, so validation runs
/// exactly once and only after discovery.
///
/// ```ignore
/// let mut bootstrap = SecurityBootstrap::new(SecurityExtensionConfig::default());
/// for ty in candidates {
///     bootstrap.discover(ty)?;
/// }
/// let outcome = bootstrap.finish()?;
/// let secured = outcome.storage.is_secured_method("app.Account", "withdraw");
/// ```
pub struct SecurityBootstrap {
    extension: SecurityExtension,
    types: Vec<TypeDescriptor>,
}

impl SecurityBootstrap {
    #[must_use]
    pub fn new(config: SecurityExtensionConfig) -> Self {
        Self {
            extension: SecurityExtension::new(config),
            types: Vec::new(),
        }
    }

    /// Runs discovery on one candidate and keeps the resulting descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::Discovery`] if the candidate declares an
    /// invalid authorizer.
    pub fn discover(&mut self, descriptor: TypeDescriptor) -> Result<(), DeploymentError> {
        let discovered = self
            .extension
            .process_annotated_type(descriptor)
            .map_err(DeploymentError::Discovery)?;
        self.types.push(discovered.descriptor);
        Ok(())
    }

    /// Validates all discovered bindings.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::Validation`] with every unmatched binding.
    pub fn finish(self) -> Result<BootstrapOutcome, DeploymentError> {
        let mut errors = DefinitionErrors::new();
        self.extension.validate_bindings(&mut errors);
        errors.into_result()?;

        info!(types = self.types.len(), "Security bootstrap complete");
        Ok(BootstrapOutcome {
            types: self.types,
            storage: self.extension.storage(),
        })
    }

    /// Discovers every candidate and finishes.
    ///
    /// # Errors
    ///
    /// The first discovery failure, or the collected validation errors.
    pub fn run(
        config: SecurityExtensionConfig,
        candidates: impl IntoIterator<Item = TypeDescriptor>,
    ) -> Result<BootstrapOutcome, DeploymentError> {
        let mut bootstrap = Self::new(config);
        for descriptor in candidates {
            bootstrap.discover(descriptor)?;
        }
        bootstrap.finish()
    }
}
