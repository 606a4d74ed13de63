//! Discovery and validation of typesafe security bindings.
//!
//! The container drives two passes:
//! 1. [`SecurityExtension::process_annotated_type`] once per candidate type,
//!    registering authorizers and secured types and returning the augmented
//!    descriptor to use from then on.
//! 2. [`SecurityExtension::validate_bindings`] once, after every candidate was
//!    processed, reporting secured types whose bindings have no authorizer and
//!    promoting secured methods into the permanent registry.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::annotation::Annotation;
use crate::augment::{Discovered, TypeAugmenter};
use crate::authorizer::Authorizer;
use crate::classifier::{first_security_binding, is_authorizer_declaration, security_bindings};
use crate::config::SecurityExtensionConfig;
use crate::element::{MethodDescriptor, TypeDescriptor};
use crate::error::{DeploymentError, SecurityDefinitionError};
use crate::storage::SecurityMetadataStorage;

/// Collects definition errors found during validation.
pub trait DefinitionErrorSink {
    fn add_definition_error(&mut self, error: SecurityDefinitionError);
}

/// A plain list of definition errors.
#[derive(Debug, Default)]
pub struct DefinitionErrors {
    errors: Vec<SecurityDefinitionError>,
}

impl DefinitionErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecurityDefinitionError> {
        self.errors.iter()
    }

    /// Fails the deployment if any error was collected.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::Validation`] carrying every collected error.
    pub fn into_result(self) -> Result<(), DeploymentError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DeploymentError::Validation(self.errors))
        }
    }
}

impl DefinitionErrorSink for DefinitionErrors {
    fn add_definition_error(&mut self, error: SecurityDefinitionError) {
        self.errors.push(error);
    }
}

impl DefinitionErrorSink for Vec<SecurityDefinitionError> {
    fn add_definition_error(&mut self, error: SecurityDefinitionError) {
        self.push(error);
    }
}

/// Security extension for one bootstrap.
///
/// Owns a fresh [`SecurityMetadataStorage`]; the handle returned by
/// [`SecurityExtension::storage`] is what the runtime interceptor queries
/// once bootstrap is complete.
pub struct SecurityExtension {
    config: SecurityExtensionConfig,
    storage: Arc<SecurityMetadataStorage>,
}

impl SecurityExtension {
    #[must_use]
    pub fn new(config: SecurityExtensionConfig) -> Self {
        if !config.enabled {
            warn!("Security extension is deactivated; secured bindings will not be enforced");
        }
        Self {
            config,
            storage: Arc::new(SecurityMetadataStorage::new()),
        }
    }

    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub fn storage(&self) -> Arc<SecurityMetadataStorage> {
        Arc::clone(&self.storage)
    }

    /// Discovers security metadata on one candidate type.
    ///
    /// A class-level binding secures the whole type and suppresses
    /// method-level binding scanning. Authorizer declarations are registered
    /// in either case. The returned descriptor carries the interceptor
    /// binding on the type or on each secured method.
    ///
    /// # Errors
    ///
    /// Returns the [`SecurityDefinitionError`] of the first invalid authorizer
    /// declaration; nothing else from this type is registered in that case.
    #[tracing::instrument(skip_all, fields(type_name = %descriptor.name()))]
    pub fn process_annotated_type(
        &self,
        descriptor: TypeDescriptor,
    ) -> Result<Discovered, SecurityDefinitionError> {
        if !self.config.enabled {
            return Ok(Discovered::unchanged(descriptor));
        }

        let mut augmenter = TypeAugmenter::read_from(&descriptor);
        let mut authorizers = Vec::new();

        let type_binding = first_security_binding(&descriptor);
        let mut secured = type_binding.is_some();
        if let Some(binding) = type_binding {
            debug!(%binding, "Type secured by class-level binding");
            augmenter.add_to_type();
        }

        for method in descriptor.methods() {
            if is_authorizer_declaration(method) {
                authorizers.push(Authorizer::try_from_method(method).inspect_err(|e| {
                    error!(method = %method.qualified_name(), error = %e, "Invalid authorizer");
                })?);
                continue;
            }

            if type_binding.is_some() {
                continue;
            }

            if let Some(binding) = first_security_binding(method) {
                debug!(method = %method.name(), %binding, "Method secured by binding");
                augmenter.add_to_method(method.name());
                secured = true;
            }
        }

        for authorizer in authorizers {
            debug!(
                method = %authorizer.method().qualified_name(),
                binding = %authorizer.binding(),
                "Registered authorizer"
            );
            self.storage.add_authorizer(authorizer);
        }

        if secured {
            self.storage.add_secured_type(descriptor.clone());
        }

        let augmented = augmenter.is_changed();
        Ok(Discovered {
            descriptor: if augmented {
                augmenter.build()
            } else {
                descriptor
            },
            augmented,
            secured,
        })
    }

    /// Validates every secured type against the registered authorizers.
    ///
    /// Each distinct binding declared on a secured type or on one of its
    /// methods needs a matching authorizer; one error per unmatched binding
    /// and type is reported to `sink`, and all types are checked. Methods
    /// carrying a binding, or declared on a type with a class-level binding,
    /// are promoted to the confirmed secured-method set; authorizer
    /// declarations never are. The secured-type working set is
    /// cleared afterwards.
    #[tracing::instrument(skip_all)]
    pub fn validate_bindings(&self, sink: &mut impl DefinitionErrorSink) {
        if !self.config.enabled {
            return;
        }

        let secured_types = self.storage.secured_types();
        let mut error_count = 0_usize;

        for ty in &secured_types {
            for binding in required_bindings(ty) {
                if self.storage.find_authorizer(binding).is_some() {
                    continue;
                }
                let err = SecurityDefinitionError::UnmatchedBinding {
                    type_name: ty.name().to_owned(),
                    binding: binding.name().to_owned(),
                };
                error!(type_name = %ty.name(), %binding, "{err}");
                sink.add_definition_error(err);
                error_count += 1;
            }

            let class_level = first_security_binding(ty).is_some();
            for method in ty
                .methods()
                .iter()
                .filter(|m| is_enforced(m, class_level))
            {
                self.storage.register_secured_method(ty, method);
            }
        }

        self.storage.reset_secured_types();

        info!(
            secured_types = secured_types.len(),
            authorizers = self.storage.authorizers().len(),
            secured_methods = self.storage.secured_methods().len(),
            errors = error_count,
            "Security bindings validated"
        );
    }

    /// Runs validation and turns collected errors into a deployment failure.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::Validation`] if any binding lacks an authorizer.
    pub fn validate(&self) -> Result<(), DeploymentError> {
        let mut errors = DefinitionErrors::new();
        self.validate_bindings(&mut errors);
        errors.into_result()
    }
}

/// Distinct bindings a secured type relies on: its own, then those of its
/// non-authorizer methods. Bindings that differ only in nonbinding
/// attributes count once.
fn required_bindings(ty: &TypeDescriptor) -> Vec<&Annotation> {
    let mut bindings: Vec<&Annotation> = Vec::new();
    let method_bindings = ty
        .methods()
        .iter()
        .filter(|m| !is_authorizer_declaration(*m))
        .flat_map(security_bindings);

    for binding in security_bindings(ty).chain(method_bindings) {
        if !bindings.iter().any(|kept| kept.binding_eq(binding)) {
            bindings.push(binding);
        }
    }
    bindings
}

/// Whether calls to `method` go through enforcement: it is not an authorizer
/// and carries a binding, either its own or inherited from a class-level one.
fn is_enforced(method: &MethodDescriptor, class_level: bool) -> bool {
    !is_authorizer_declaration(method) && (class_level || first_security_binding(method).is_some())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::annotation::{Annotated, AnnotationKind, names};
    use crate::element::ReturnKind;

    fn requires_role() -> Annotation {
        Annotation::new(AnnotationKind::security_binding("app.RequiresRole"))
    }

    fn secures() -> Annotation {
        Annotation::new(AnnotationKind::secures())
    }

    fn enabled() -> SecurityExtension {
        SecurityExtension::new(SecurityExtensionConfig::default())
    }

    #[test]
    fn unsecured_type_is_returned_unchanged() {
        let ext = enabled();
        let ty = TypeDescriptor::new("app.Ledger")
            .annotated(Annotation::new(AnnotationKind::new("app.Audited")))
            .method("post", ReturnKind::Void, []);

        let discovered = ext.process_annotated_type(ty.clone()).unwrap();

        assert!(!discovered.augmented);
        assert!(!discovered.secured);
        assert_eq!(discovered.descriptor, ty);
        assert!(ext.storage().secured_types().is_empty());
    }

    #[test]
    fn class_level_binding_suppresses_method_scanning() {
        let ext = enabled();
        let ty = TypeDescriptor::new("app.Account")
            .annotated(requires_role())
            .method("withdraw", ReturnKind::Void, [requires_role()]);

        let discovered = ext.process_annotated_type(ty).unwrap();

        assert!(discovered.secured);
        assert!(
            discovered
                .descriptor
                .is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING)
        );
        let withdraw = discovered.descriptor.find_method("withdraw").unwrap();
        assert!(!withdraw.is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING));
        assert_eq!(ext.storage().secured_types().len(), 1);
    }

    #[test]
    fn method_level_binding_augments_only_that_method() {
        let ext = enabled();
        let ty = TypeDescriptor::new("app.Account")
            .method("withdraw", ReturnKind::Void, [requires_role()])
            .method("transfer", ReturnKind::Void, [requires_role()])
            .method("balance", ReturnKind::Other("long".to_owned()), []);

        let discovered = ext.process_annotated_type(ty).unwrap();
        let out = &discovered.descriptor;

        assert!(discovered.augmented);
        assert!(!out.is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING));
        for name in ["withdraw", "transfer"] {
            assert!(
                out.find_method(name)
                    .unwrap()
                    .is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING)
            );
        }
        assert!(
            !out.find_method("balance")
                .unwrap()
                .is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING)
        );
        // Registered once even though two methods are secured.
        assert_eq!(ext.storage().secured_types().len(), 1);
    }

    #[test]
    fn authorizers_on_class_secured_types_are_registered() {
        let ext = enabled();
        let ty = TypeDescriptor::new("app.Account")
            .annotated(requires_role())
            .method("checkRole", ReturnKind::Bool, [secures(), requires_role()]);

        ext.process_annotated_type(ty).unwrap();

        assert_eq!(ext.storage().authorizers().len(), 1);
        ext.validate().unwrap();
        // The authorizer itself is never guarded.
        assert!(!ext.storage().is_secured_method("app.Account", "checkRole"));
    }

    #[test]
    fn invalid_authorizer_aborts_the_type() {
        let ext = enabled();
        let ty = TypeDescriptor::new("app.Checks")
            .method("isAdmin", ReturnKind::Bool, [secures(), requires_role()])
            .method("withdraw", ReturnKind::Void, [requires_role()])
            .method("audit", ReturnKind::Void, [secures(), requires_role()]);

        let err = ext.process_annotated_type(ty).unwrap_err();

        assert_eq!(
            err,
            SecurityDefinitionError::NonBooleanAuthorizer {
                method: "app.Checks.audit".to_owned()
            }
        );
        assert!(ext.storage().authorizers().is_empty());
        assert!(ext.storage().secured_types().is_empty());
    }

    #[test]
    fn deactivated_extension_is_a_no_op() {
        let ext = SecurityExtension::new(SecurityExtensionConfig { enabled: false });
        let ty = TypeDescriptor::new("app.Account").annotated(requires_role());

        let discovered = ext.process_annotated_type(ty).unwrap();
        assert!(!discovered.secured);
        assert!(!discovered.augmented);

        ext.storage()
            .add_secured_type(TypeDescriptor::new("app.Account").annotated(requires_role()));
        let mut errors = Vec::new();
        ext.validate_bindings(&mut errors);
        assert!(errors.is_empty());
        // Validation did not run, so the working set is untouched.
        assert_eq!(ext.storage().secured_types().len(), 1);
    }

    #[test]
    fn unmatched_bindings_are_reported_once_per_type() {
        let ext = enabled();
        let ty = TypeDescriptor::new("app.Account")
            .method("withdraw", ReturnKind::Void, [requires_role()])
            .method("transfer", ReturnKind::Void, [requires_role()]);
        ext.process_annotated_type(ty).unwrap();

        let mut errors = DefinitionErrors::new();
        ext.validate_bindings(&mut errors);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next(),
            Some(&SecurityDefinitionError::UnmatchedBinding {
                type_name: "app.Account".to_owned(),
                binding: "app.RequiresRole".to_owned(),
            })
        );
        assert!(ext.storage().secured_types().is_empty());
    }

    #[test]
    fn bindings_differing_in_nonbinding_attributes_reported_once() {
        let ext = enabled();
        let kind = AnnotationKind::security_binding("app.RequiresRole").nonbinding("reason");
        let ty = TypeDescriptor::new("app.Account")
            .method(
                "withdraw",
                ReturnKind::Void,
                [Annotation::new(kind.clone())
                    .with("value", "admin")
                    .with("reason", "a")],
            )
            .method(
                "transfer",
                ReturnKind::Void,
                [Annotation::new(kind).with("value", "admin").with("reason", "b")],
            );
        ext.process_annotated_type(ty).unwrap();

        let mut errors = DefinitionErrors::new();
        ext.validate_bindings(&mut errors);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next(),
            Some(&SecurityDefinitionError::UnmatchedBinding {
                type_name: "app.Account".to_owned(),
                binding: "app.RequiresRole".to_owned(),
            })
        );
    }

    #[test]
    fn second_validation_sees_empty_working_set() {
        let ext = enabled();
        ext.process_annotated_type(TypeDescriptor::new("app.Account").annotated(requires_role()))
            .unwrap();

        assert!(ext.validate().is_err());
        assert!(ext.validate().is_ok());
    }

    #[test]
    #[traced_test]
    fn validation_logs_unmatched_binding() {
        let ext = enabled();
        ext.process_annotated_type(TypeDescriptor::new("app.Account").annotated(requires_role()))
            .unwrap();

        assert!(ext.validate().is_err());

        assert!(logs_contain(
            "Secured type app.Account has no matching authorizer method for security binding @app.RequiresRole"
        ));
        assert!(logs_contain("Security bindings validated"));
    }
}
