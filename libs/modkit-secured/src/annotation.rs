//! Annotation model: declarations, instances and the [`Annotated`] capability.
//!
//! Helpers that pick out security bindings from an [`Annotated`] element live
//! in [`crate::classifier`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known annotation names understood by the security extension.
pub mod names {
    /// Meta-annotation that designates an annotation type as a security binding.
    pub const SECURITY_BINDING_TYPE: &str = "modkit.security.SecurityBindingType";

    /// Marks a method as an authorizer (decision function) declaration.
    pub const SECURES: &str = "modkit.security.Secures";

    /// Interceptor binding attached to secured types and methods during discovery.
    pub const SECURITY_INTERCEPTOR_BINDING: &str = "modkit.security.SecurityInterceptorBinding";
}

/// The declaration of an annotation type.
///
/// Carries the meta-annotations applied to the declaration itself and the
/// names of attributes that do not take part in binding resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationKind {
    name: String,
    #[serde(default)]
    meta: BTreeSet<String>,
    #[serde(default)]
    nonbinding: BTreeSet<String>,
}

impl AnnotationKind {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta: BTreeSet::new(),
            nonbinding: BTreeSet::new(),
        }
    }

    /// Declares a security binding type (meta-annotated with
    /// [`names::SECURITY_BINDING_TYPE`]).
    #[must_use]
    pub fn security_binding(name: impl Into<String>) -> Self {
        Self::new(name).meta_annotated(names::SECURITY_BINDING_TYPE)
    }

    /// The authorizer declaration marker.
    #[must_use]
    pub fn secures() -> Self {
        Self::new(names::SECURES)
    }

    /// The interceptor binding attached by discovery.
    #[must_use]
    pub fn security_interceptor_binding() -> Self {
        Self::new(names::SECURITY_INTERCEPTOR_BINDING)
    }

    #[must_use]
    pub fn meta_annotated(mut self, meta: impl Into<String>) -> Self {
        self.meta.insert(meta.into());
        self
    }

    /// Excludes `attribute` from binding comparisons.
    #[must_use]
    pub fn nonbinding(mut self, attribute: impl Into<String>) -> Self {
        self.nonbinding.insert(attribute.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the declaration is directly annotated with `meta`.
    #[must_use]
    pub fn has_meta(&self, meta: &str) -> bool {
        self.meta.contains(meta)
    }

    #[must_use]
    pub fn is_nonbinding(&self, attribute: &str) -> bool {
        self.nonbinding.contains(attribute)
    }
}

/// A typed annotation attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Bool(bool),
    /// Enum constant, stored by its variant name.
    Enum(String),
    List(Vec<AttributeValue>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Enum(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for AttributeValue {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    #[inline]
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for AttributeValue {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// An annotation instance: its declaration plus attribute values.
///
/// Identity is the declaration name together with the attribute values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    kind: AnnotationKind,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl Annotation {
    /// Creates an instance without attributes.
    #[must_use]
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    /// Fully qualified name of the annotation type.
    #[must_use]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    #[must_use]
    pub fn attribute(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether `other` denotes the same binding as `self`.
    ///
    /// Both must be of the same annotation type and agree on every attribute
    /// not declared nonbinding on `self`'s declaration. An attribute present
    /// on only one side is a mismatch.
    #[must_use]
    pub fn binding_eq(&self, other: &Annotation) -> bool {
        if self.name() != other.name() {
            return false;
        }

        let kind = &self.kind;
        let ours = self.attributes().filter(|(name, _)| !kind.is_nonbinding(name));
        let theirs = other
            .attributes()
            .filter(|(name, _)| !kind.is_nonbinding(name));

        // Attributes iterate in name order, so pairwise comparison is exact.
        ours.eq(theirs)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())?;
        if self.attributes.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (k, v)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k} = {v}")?;
        }
        f.write_str(")")
    }
}

/// A program element that exposes its annotations.
pub trait Annotated {
    fn annotations(&self) -> &[Annotation];

    fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations().iter().find(|a| a.name() == name)
    }

    fn is_annotation_present(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}
