//! Security binding classification.

use crate::annotation::{Annotated, Annotation, names};

/// Whether `annotation` is a security binding: its declaration is directly
/// meta-annotated with [`names::SECURITY_BINDING_TYPE`].
///
/// The lookup is one level deep; meta-annotations of meta-annotations are
/// not followed.
#[must_use]
#[inline]
pub fn is_security_binding(annotation: &Annotation) -> bool {
    annotation.kind().has_meta(names::SECURITY_BINDING_TYPE)
}

/// All security bindings on `element`, in declaration order.
pub fn security_bindings<E: Annotated + ?Sized>(element: &E) -> impl Iterator<Item = &Annotation> {
    element
        .annotations()
        .iter()
        .filter(|a| is_security_binding(a))
}

/// The first security binding on `element`, if any.
#[must_use]
pub fn first_security_binding<E: Annotated + ?Sized>(element: &E) -> Option<&Annotation> {
    security_bindings(element).next()
}

/// Whether `element` declares an authorizer.
#[must_use]
pub fn is_authorizer_declaration<E: Annotated + ?Sized>(element: &E) -> bool {
    element.is_annotation_present(names::SECURES)
}
