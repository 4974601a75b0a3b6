//! Core traits for the dependency injection container.

mod dispose;
mod resolver;

pub use dispose::{AsyncDispose, BoxFutureUnit, Dispose};
pub use resolver::{Resolver, ResolverCore};
