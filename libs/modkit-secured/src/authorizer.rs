//! Authorizers: boolean decision functions bound to one security binding.

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::classifier::security_bindings;
use crate::element::MethodDescriptor;
use crate::error::SecurityDefinitionError;

/// An authorizer method paired with the security binding it decides for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorizer {
    binding: Annotation,
    method: MethodDescriptor,
}

impl Authorizer {
    /// Builds an authorizer from a method declared with the `Secures` marker.
    ///
    /// # Errors
    ///
    /// - [`SecurityDefinitionError::NonBooleanAuthorizer`] if the method does
    ///   not return a (primitive or boxed) boolean; checked first, regardless
    ///   of annotations.
    /// - [`SecurityDefinitionError::MultipleBindings`] if it declares more
    ///   than one security binding.
    /// - [`SecurityDefinitionError::MissingBinding`] if it declares none.
    pub fn try_from_method(method: &MethodDescriptor) -> Result<Self, SecurityDefinitionError> {
        if !method.return_kind().is_boolean() {
            return Err(SecurityDefinitionError::NonBooleanAuthorizer {
                method: method.qualified_name(),
            });
        }

        let mut bindings = security_bindings(method);
        let binding = bindings
            .next()
            .ok_or_else(|| SecurityDefinitionError::MissingBinding {
                method: method.qualified_name(),
            })?;
        if bindings.next().is_some() {
            return Err(SecurityDefinitionError::MultipleBindings {
                method: method.qualified_name(),
            });
        }

        Ok(Self {
            binding: binding.clone(),
            method: method.clone(),
        })
    }

    #[must_use]
    pub fn binding(&self) -> &Annotation {
        &self.binding
    }

    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Whether this authorizer decides for `annotation`.
    ///
    /// Both must be of the same annotation type and agree on every attribute
    /// not declared nonbinding. An attribute present on only one side is a
    /// mismatch.
    #[must_use]
    pub fn matches_binding(&self, annotation: &Annotation) -> bool {
        self.binding.binding_eq(annotation)
    }
}
