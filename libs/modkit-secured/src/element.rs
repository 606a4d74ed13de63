//! Type and method descriptors handed over by the container.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotated, Annotation};

/// Declared return kind of a method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// Primitive boolean.
    Bool,
    /// Boxed (nullable) boolean.
    BoxedBool,
    Void,
    /// Any other type, by name.
    Other(String),
}

impl ReturnKind {
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Bool | Self::BoxedBool)
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("boolean"),
            Self::BoxedBool => f.write_str("Boolean"),
            Self::Void => f.write_str("void"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// A method together with its annotations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    declaring_type: String,
    name: String,
    return_kind: ReturnKind,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        return_kind: ReturnKind,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            return_kind,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn return_kind(&self) -> &ReturnKind {
        &self.return_kind
    }

    /// `Type.method`, as used in diagnostics.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }

    pub(crate) fn push_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }
}

impl Annotated for MethodDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// A candidate type: its own annotations and its methods.
///
/// Methods whose declaring type differs from `name` are inherited members.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    name: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a method declared on this type.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        return_kind: ReturnKind,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        let method = annotations
            .into_iter()
            .fold(MethodDescriptor::new(&*self.name, name, return_kind), |m, a| {
                m.annotated(a)
            });
        self.methods.push(method);
        self
    }

    /// Adds a fully built method descriptor.
    #[must_use]
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub(crate) fn push_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub(crate) fn method_mut(&mut self, name: &str) -> Option<&mut MethodDescriptor> {
        self.methods.iter_mut().find(|m| m.name == name)
    }
}

impl Annotated for TypeDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;

    #[test]
    fn boolean_return_kinds() {
        assert!(ReturnKind::Bool.is_boolean());
        assert!(ReturnKind::BoxedBool.is_boolean());
        assert!(!ReturnKind::Void.is_boolean());
        assert!(!ReturnKind::Other("java.lang.String".to_owned()).is_boolean());
    }

    #[test]
    fn type_builder_sets_declaring_type() {
        let ty = TypeDescriptor::new("app.Account").method(
            "withdraw",
            ReturnKind::Void,
            [Annotation::new(AnnotationKind::security_binding("app.RequiresRole"))],
        );

        let withdraw = ty.find_method("withdraw").unwrap();
        assert_eq!(withdraw.declaring_type(), "app.Account");
        assert_eq!(withdraw.qualified_name(), "app.Account.withdraw");
        assert!(withdraw.is_annotation_present("app.RequiresRole"));
        assert!(ty.find_method("deposit").is_none());
    }

    #[test]
    fn descriptor_deserializes_from_manifest() {
        let ty: TypeDescriptor = serde_json::from_value(serde_json::json!({
            "name": "app.Account",
            "annotations": [{ "kind": { "name": "app.Audited" } }],
            "methods": [{
                "declaring_type": "app.Account",
                "name": "balance",
                "return_kind": { "other": "long" }
            }]
        }))
        .unwrap();

        assert!(ty.is_annotation_present("app.Audited"));
        assert_eq!(
            ty.methods()[0].return_kind(),
            &ReturnKind::Other("long".to_owned())
        );
    }
}
