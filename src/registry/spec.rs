//! Collecting entries for a new registry scope.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Entry, Registry};

/// Collects entries for one registry scope.
///
/// Adding the same type twice keeps the last value.
#[derive(Default)]
pub struct RegistrySpec {
    entries: HashMap<TypeId, Entry>,
}

impl RegistrySpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an owned value under its own type.
    pub fn add<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add_arc(Arc::new(value))
    }

    /// Register a shared value; `T` may be a trait object such as `dyn Handler`.
    pub fn add_arc<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.entries.insert(TypeId::of::<T>(), Entry::new(value));
        self
    }

    /// Number of distinct types collected so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce a single-scope registry from the collected entries.
    ///
    /// The spec is left empty and may be reused.
    pub fn build(&mut self) -> Registry {
        Registry::from_entries(std::mem::take(&mut self.entries))
    }
}
