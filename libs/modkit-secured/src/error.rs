//! Error types for security binding discovery and validation.

use thiserror::Error;

/// A definition problem in the application's security metadata.
///
/// Authorizer variants are raised during discovery and abort processing of
/// the offending type. [`SecurityDefinitionError::UnmatchedBinding`] is
/// accumulated during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityDefinitionError {
    #[error("Invalid authorizer method [{method}] - does not return a boolean.")]
    NonBooleanAuthorizer { method: String },

    #[error("Invalid authorizer method [{method}] - declares multiple security binding types")]
    MultipleBindings { method: String },

    #[error("Invalid authorizer method [{method}] - declares no security binding type")]
    MissingBinding { method: String },

    #[error(
        "Secured type {type_name} has no matching authorizer method for security binding @{binding}"
    )]
    UnmatchedBinding { type_name: String, binding: String },
}

/// Deployment failure reported to the container.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// An invalid authorizer aborted discovery.
    #[error("security discovery failed: {0}")]
    Discovery(#[source] SecurityDefinitionError),

    /// Validation collected one or more definition errors.
    #[error("security validation failed with {} definition error(s)", .0.len())]
    Validation(Vec<SecurityDefinitionError>),
}

impl DeploymentError {
    /// All definition errors carried by this failure.
    #[must_use]
    pub fn definition_errors(&self) -> &[SecurityDefinitionError] {
        match self {
            Self::Discovery(e) => std::slice::from_ref(e),
            Self::Validation(errors) => errors,
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
#[error("invalid security extension configuration: {0}")]
pub struct ConfigError(#[from] Box<figment::Error>);

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self(Box::new(e))
    }
}
