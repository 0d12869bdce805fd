//! Error types for the inversion-of-control container.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::key::Key;

/// Container errors
///
/// Every public operation of the container is fallible and reports one of
/// these variants to its immediate caller. None of them are transient: a
/// failed registration or resolution fails the same way when retried against
/// the same bindings.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, Key};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let container = Container::new();
/// match container.invoke(|_clock: Arc<Clock>| {}) {
///     Err(DiError::UnresolvableType(key)) => assert_eq!(key, Key::of::<Clock>()),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
///
/// ```rust
/// use ferrous_ioc::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// More than one options value was passed to a registration
    MultipleOptionsNotAllowed(usize),
    /// A factory does not produce exactly one value (`()` or a tuple)
    InvalidConstructorShape(&'static str),
    /// A pointer-like target was registered without any interface
    InterfaceRequiredForIndirectTarget(&'static str),
    /// `invoke` was given something that cannot be called
    TargetMustBeCallable(&'static str),
    /// `invoke` was given a callable without parameters
    NoResolvableParameters,
    /// No binding for the type anywhere in the container chain
    UnresolvableType(Key),
    /// `verify` was called on a container with an empty registry
    NoRegistrationsToVerify,
    /// Circular dependency detected (includes path)
    Circular(Vec<&'static str>),
    /// Type downcast failed
    TypeMismatch(&'static str),
    /// The invoked target returned an error
    Invocation(Arc<dyn Error + Send + Sync>),
    /// Container options could not be read
    InvalidConfig(String),
}

impl DiError {
    /// Wraps the failure returned by an invocation target.
    ///
    /// A target that already failed with a `DiError` keeps its original
    /// variant instead of being nested inside `Invocation`.
    pub fn from_invocation(err: Box<dyn Error + Send + Sync>) -> Self {
        match err.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(other) => DiError::Invocation(Arc::from(other)),
        }
    }

    /// True for the failures `register`/`register_with` can report.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            DiError::MultipleOptionsNotAllowed(_)
                | DiError::InvalidConstructorShape(_)
                | DiError::InterfaceRequiredForIndirectTarget(_)
                | DiError::TypeMismatch(_)
        )
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::MultipleOptionsNotAllowed(count) => {
                write!(f, "Only a single options value is allowed, got {}", count)
            }
            DiError::InvalidConstructorShape(name) => {
                write!(f, "Constructor must return exactly one value: {}", name)
            }
            DiError::InterfaceRequiredForIndirectTarget(name) => {
                write!(f, "Registering an indirect target requires at least one interface: {}", name)
            }
            DiError::TargetMustBeCallable(name) => {
                write!(f, "Invocation target must be callable: {}", name)
            }
            DiError::NoResolvableParameters => {
                write!(f, "Invocation target has no parameters to resolve")
            }
            DiError::UnresolvableType(key) => {
                write!(f, "Cannot resolve type: {}", key.display_name())
            }
            DiError::NoRegistrationsToVerify => write!(f, "No registrations to verify"),
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::Invocation(err) => write!(f, "Invocation failed: {}", err),
            DiError::InvalidConfig(msg) => write!(f, "Invalid container options: {}", msg),
        }
    }
}

impl Error for DiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiError::Invocation(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
