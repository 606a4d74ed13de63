//! Security metadata collected during bootstrap.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::annotation::Annotation;
use crate::authorizer::Authorizer;
use crate::classifier::security_bindings;
use crate::element::{MethodDescriptor, TypeDescriptor};

/// A method confirmed as secured, with the bindings that apply to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecuredMethod {
    pub type_name: String,
    pub method_name: String,
    /// Type-level bindings first, then method-level bindings.
    pub bindings: Vec<Annotation>,
}

#[derive(Default)]
struct Inner {
    secured_types: Vec<TypeDescriptor>,
    authorizers: Vec<Authorizer>,
    secured_methods: BTreeMap<(String, String), SecuredMethod>,
}

/// Registry of secured types, authorizers and confirmed secured methods.
///
/// Created once per bootstrap and shared by handle. Mutation happens while
/// types are discovered and validated; afterwards the runtime only queries.
/// A single lock guards all three collections, so discovery may run on
/// several threads.
#[derive(Default)]
pub struct SecurityMetadataStorage {
    inner: RwLock<Inner>,
}

impl SecurityMetadataStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a secured type. Duplicates are kept.
    pub fn add_secured_type(&self, descriptor: TypeDescriptor) {
        self.inner.write().secured_types.push(descriptor);
    }

    /// Snapshot of the secured types awaiting validation.
    #[must_use]
    pub fn secured_types(&self) -> Vec<TypeDescriptor> {
        self.inner.read().secured_types.clone()
    }

    /// Drops the secured-type working set.
    pub fn reset_secured_types(&self) {
        self.inner.write().secured_types.clear();
    }

    pub fn add_authorizer(&self, authorizer: Authorizer) {
        self.inner.write().authorizers.push(authorizer);
    }

    #[must_use]
    pub fn authorizers(&self) -> Vec<Authorizer> {
        self.inner.read().authorizers.clone()
    }

    /// The first registered authorizer that matches `binding`.
    #[must_use]
    pub fn find_authorizer(&self, binding: &Annotation) -> Option<Authorizer> {
        self.inner
            .read()
            .authorizers
            .iter()
            .find(|a| a.matches_binding(binding))
            .cloned()
    }

    /// Records `method` of `ty` as secured.
    ///
    /// Registering the same pair again replaces the recorded bindings.
    pub fn register_secured_method(&self, ty: &TypeDescriptor, method: &MethodDescriptor) {
        let bindings = security_bindings(ty)
            .chain(security_bindings(method))
            .cloned()
            .collect();
        let key = (ty.name().to_owned(), method.name().to_owned());
        let entry = SecuredMethod {
            type_name: key.0.clone(),
            method_name: key.1.clone(),
            bindings,
        };
        self.inner.write().secured_methods.insert(key, entry);
    }

    #[must_use]
    pub fn is_secured_method(&self, type_name: &str, method_name: &str) -> bool {
        self.inner
            .read()
            .secured_methods
            .contains_key(&(type_name.to_owned(), method_name.to_owned()))
    }

    /// Confirmed secured methods, ordered by type then method name.
    #[must_use]
    pub fn secured_methods(&self) -> Vec<SecuredMethod> {
        self.inner.read().secured_methods.values().cloned().collect()
    }

    /// Authorizers to consult when `type_name::method_name` is called.
    ///
    /// One authorizer per binding recorded for the method, in binding order.
    /// Bindings without a matching authorizer are skipped; unsecured methods
    /// yield an empty list.
    #[must_use]
    pub fn authorizers_for(&self, type_name: &str, method_name: &str) -> Vec<Authorizer> {
        let inner = self.inner.read();
        let Some(secured) = inner
            .secured_methods
            .get(&(type_name.to_owned(), method_name.to_owned()))
        else {
            return Vec::new();
        };

        secured
            .bindings
            .iter()
            .filter_map(|binding| {
                inner
                    .authorizers
                    .iter()
                    .find(|a| a.matches_binding(binding))
                    .cloned()
            })
            .collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;
    use crate::element::ReturnKind;

    fn requires_role() -> Annotation {
        Annotation::new(AnnotationKind::security_binding("app.RequiresRole"))
    }

    fn check_role() -> Authorizer {
        let method = MethodDescriptor::new("app.Checks", "checkRole", ReturnKind::Bool)
            .annotated(Annotation::new(AnnotationKind::secures()))
            .annotated(requires_role());
        Authorizer::try_from_method(&method).unwrap()
    }

    #[test]
    fn secured_types_keep_duplicates_and_reset_is_idempotent() {
        let storage = SecurityMetadataStorage::new();
        storage.add_secured_type(TypeDescriptor::new("app.Account"));
        storage.add_secured_type(TypeDescriptor::new("app.Account"));
        assert_eq!(storage.secured_types().len(), 2);

        storage.reset_secured_types();
        assert!(storage.secured_types().is_empty());
        storage.reset_secured_types();
        assert!(storage.secured_types().is_empty());
    }

    #[test]
    fn secured_method_registration_is_a_set() {
        let storage = SecurityMetadataStorage::new();
        let ty = TypeDescriptor::new("app.Account").method(
            "withdraw",
            ReturnKind::Void,
            [requires_role()],
        );
        let withdraw = ty.find_method("withdraw").unwrap();

        storage.register_secured_method(&ty, withdraw);
        storage.register_secured_method(&ty, withdraw);

        assert_eq!(storage.secured_methods().len(), 1);
        assert!(storage.is_secured_method("app.Account", "withdraw"));
        assert!(!storage.is_secured_method("app.Account", "deposit"));
    }

    #[test]
    fn authorizers_for_resolves_recorded_bindings() {
        let storage = SecurityMetadataStorage::new();
        storage.add_authorizer(check_role());

        let admin = Annotation::new(AnnotationKind::security_binding("app.RequiresAdmin"));
        let ty = TypeDescriptor::new("app.Account")
            .annotated(admin)
            .method("withdraw", ReturnKind::Void, [requires_role()]);
        storage.register_secured_method(&ty, ty.find_method("withdraw").unwrap());

        let secured = &storage.secured_methods()[0];
        assert_eq!(secured.bindings.len(), 2);
        assert_eq!(secured.bindings[0].name(), "app.RequiresAdmin");

        // RequiresAdmin has no authorizer, RequiresRole resolves to checkRole.
        let resolved = storage.authorizers_for("app.Account", "withdraw");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].method().name(), "checkRole");
        assert!(storage.authorizers_for("app.Account", "balance").is_empty());
    }

    #[test]
    fn find_authorizer_by_binding() {
        let storage = SecurityMetadataStorage::new();
        assert!(storage.find_authorizer(&requires_role()).is_none());

        storage.add_authorizer(check_role());
        assert!(storage.find_authorizer(&requires_role()).is_some());
    }
}
