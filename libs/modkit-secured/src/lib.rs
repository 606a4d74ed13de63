#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Typesafe security bindings for `ModKit` applications.
//!
//! Application types declare access requirements with security binding
//! annotations (annotation types meta-annotated with
//! [`names::SECURITY_BINDING_TYPE`]); authorizer methods marked with
//! [`names::SECURES`] declare the decision logic for exactly one binding.
//! At bootstrap the [`SecurityExtension`] discovers both, and startup fails
//! if any binding in use has no authorizer.
//!
//! - [`SecurityBootstrap`] - discovery over all candidates, then validation
//! - [`SecurityExtension`] - the discovery and validation passes
//! - [`SecurityMetadataStorage`] - registry queried by the runtime interceptor
//! - [`Authorizer`] - a decision method and its binding

pub mod annotation;
pub mod augment;
pub mod authorizer;
pub mod bootstrap;
pub mod classifier;
pub mod config;
pub mod element;
pub mod error;
pub mod extension;
pub mod storage;

pub use annotation::{Annotated, Annotation, AnnotationKind, AttributeValue, names};
pub use augment::{Discovered, TypeAugmenter};
pub use authorizer::Authorizer;
pub use bootstrap::{BootstrapOutcome, SecurityBootstrap};
pub use classifier::is_security_binding;
pub use config::SecurityExtensionConfig;
pub use element::{MethodDescriptor, ReturnKind, TypeDescriptor};
pub use error::{ConfigError, DeploymentError, SecurityDefinitionError};
pub use extension::{DefinitionErrorSink, DefinitionErrors, SecurityExtension};
pub use storage::{SecuredMethod, SecurityMetadataStorage};
