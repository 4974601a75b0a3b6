//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::error::{DiError, DiResult};
use crate::key::Key;

const MAX_DEPTH: usize = 1024;

// Keys currently under construction on this thread, outermost first
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Key>> = const { RefCell::new(Vec::new()) };
}

/// Guard for managing the thread-local resolution stack.
///
/// Pops its key on drop, including during unwinding out of a panicking
/// factory.
pub(crate) struct StackGuard {
    // Must be dropped on the thread that pushed
    _not_send: PhantomData<*const ()>,
}

impl StackGuard {
    pub(crate) fn enter(key: &Key) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack.iter().position(|k| k == key) {
                let mut path: Vec<&'static str> =
                    stack[start..].iter().map(Key::display_name).collect();
                path.push(key.display_name());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(key.clone());
            Ok(StackGuard { _not_send: PhantomData })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Execute a closure with `key` pushed on the resolution stack.
pub(crate) fn with_circular_guard<T, F>(key: &Key, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _guard = StackGuard::enter(key)?;
    f()
}
