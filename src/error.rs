//! Error types for the dependency injection container.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Dependency injection errors
///
/// Configuration errors (`MissingAnnotation`, `AmbiguousOptional`,
/// `InvalidDefault`) are raised when a derived factory is built. All other
/// variants are raised while resolving.
///
/// # Examples
///
/// ```rust
/// use strata_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get_required_service::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
///
/// // Optional resolution reports absence instead of failing
/// assert!(provider.get_service::<String>().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Required service not registered anywhere in the scope chain
    NotFound(&'static str),
    /// Type downcast failed
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    DepthExceeded(usize),
    /// A constructor parameter was declared without a type
    MissingAnnotation {
        service: &'static str,
        parameter: &'static str,
    },
    /// A nullable parameter names more than one candidate type
    AmbiguousOptional {
        service: &'static str,
        parameter: &'static str,
        alternatives: Vec<&'static str>,
    },
    /// A declared default does not match the parameter's type
    InvalidDefault {
        service: &'static str,
        parameter: &'static str,
    },
    /// The constructor consumed more arguments than it declared
    ArgumentOutOfRange {
        service: &'static str,
        index: usize,
    },
    /// The service's own constructor failed
    Construction {
        service: &'static str,
        source: Arc<dyn Error + Send + Sync>,
    },
    /// Resolution attempted on a disposed provider
    ScopeDisposed,
}

impl DiError {
    /// Wraps an arbitrary constructor failure for `service`.
    ///
    /// ```rust
    /// use strata_di::DiError;
    ///
    /// let err = DiError::construction("Database", std::io::Error::other("refused"));
    /// assert_eq!(err.to_string(), "Failed to construct Database: refused");
    /// ```
    pub fn construction<E>(service: &'static str, error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        DiError::Construction {
            service,
            source: Arc::from(error.into()),
        }
    }

    /// True for errors raised while building a factory rather than resolving.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DiError::MissingAnnotation { .. }
                | DiError::AmbiguousOptional { .. }
                | DiError::InvalidDefault { .. }
        )
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "Service not found: {}", name),
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::MissingAnnotation { service, parameter } => write!(
                f,
                "Parameter '{}' of {} has no type annotation",
                parameter, service
            ),
            DiError::AmbiguousOptional { service, parameter, alternatives } => write!(
                f,
                "Parameter '{}' of {} is optional over several types: {}",
                parameter,
                service,
                alternatives.join(" | ")
            ),
            DiError::InvalidDefault { service, parameter } => write!(
                f,
                "Default value of parameter '{}' of {} does not match its type",
                parameter, service
            ),
            DiError::ArgumentOutOfRange { service, index } => write!(
                f,
                "Constructor of {} requested argument {} beyond its parameter list",
                service, index
            ),
            DiError::Construction { service, source } => {
                write!(f, "Failed to construct {}: {}", service, source)
            }
            DiError::ScopeDisposed => write!(f, "Scope has already been disposed"),
        }
    }
}

impl Error for DiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiError::Construction { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout strata-di.
///
/// # Examples
///
/// ```rust
/// use strata_di::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::NotFound("some_service"))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
