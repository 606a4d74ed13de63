//! Pure descriptor augmentation with the security interceptor binding.

use crate::annotation::{Annotated, Annotation, AnnotationKind, names};
use crate::element::TypeDescriptor;

/// Builds an augmented copy of a type descriptor.
///
/// The source descriptor is never modified; the container substitutes the
/// result returned by [`TypeAugmenter::build`].
#[derive(Debug)]
pub struct TypeAugmenter {
    descriptor: TypeDescriptor,
    changed: bool,
}

impl TypeAugmenter {
    #[must_use]
    pub fn read_from(descriptor: &TypeDescriptor) -> Self {
        Self {
            descriptor: descriptor.clone(),
            changed: false,
        }
    }

    /// Adds the interceptor binding to the type itself.
    pub fn add_to_type(&mut self) -> &mut Self {
        if !self
            .descriptor
            .is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING)
        {
            self.descriptor.push_annotation(interceptor_binding());
            self.changed = true;
        }
        self
    }

    /// Adds the interceptor binding to the named method.
    ///
    /// Unknown method names are ignored.
    pub fn add_to_method(&mut self, method: &str) -> &mut Self {
        if let Some(m) = self.descriptor.method_mut(method)
            && !m.is_annotation_present(names::SECURITY_INTERCEPTOR_BINDING)
        {
            m.push_annotation(interceptor_binding());
            self.changed = true;
        }
        self
    }

    /// Whether any binding was actually added.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

fn interceptor_binding() -> Annotation {
    Annotation::new(AnnotationKind::security_interceptor_binding())
}

/// Result of running discovery over one candidate type.
#[derive(Debug, Clone)]
pub struct Discovered {
    /// The descriptor the container must use from now on.
    pub descriptor: TypeDescriptor,
    /// Whether `descriptor` differs from the candidate.
    pub augmented: bool,
    /// Whether the type was registered as secured.
    pub secured: bool,
}

impl Discovered {
    pub(crate) fn unchanged(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            augmented: false,
            secured: false,
        }
    }
}
