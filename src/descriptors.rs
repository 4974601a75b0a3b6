//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Registration;

/// Describes one registration, for debugging and startup checks.
///
/// # Examples
///
/// ```rust
/// use strata_di::{ServiceCollection, Lifetime};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { name: String }
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<Repository, _>(|_| Repository { name: "UserRepo".to_string() });
/// services.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
/// services.add_named_singleton("config_value", 42u32);
///
/// let descriptors = services.get_service_descriptors();
/// assert_eq!(descriptors.len(), 4);
///
/// let db = descriptors.iter().find(|d| d.type_name().contains("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(!db.is_named());
///
/// let config = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(config.type_name(), "u32");
/// assert_eq!(config.service_name(), Some("config_value"));
///
/// let repo = descriptors.iter().find(|d| d.lifetime == Lifetime::Scoped).unwrap();
/// assert!(repo.type_name().contains("Repository"));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The service key
    pub key: Key,
    /// Lifetime reported by the registered factory
    pub lifetime: Lifetime,
    /// Implementation type name, when the registering helper knows it
    pub impl_type_name: Option<&'static str>,
    /// Layer index in the scope chain; 0 is the scope's own layer
    pub depth: usize,
}

impl ServiceDescriptor {
    pub(crate) fn from_registration(key: &Key, registration: &Registration, depth: usize) -> Self {
        Self {
            key: key.clone(),
            lifetime: registration.factory.lifetime(),
            impl_type_name: registration.impl_name,
            depth,
        }
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        self.key.service_name()
    }

    /// Get the type/trait name
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Check if this is a named service
    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }

    /// True when the registration belongs to an ancestor scope.
    pub fn is_inherited(&self) -> bool {
        self.depth > 0
    }
}
