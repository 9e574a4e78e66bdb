//! Hierarchical, scope-aware instance lookup.
//!
//! A [`Registry`] is an immutable stack of scopes. Each scope maps a type key
//! to a shared instance; lookups search the nearest scope first, so a nested
//! scope overrides anything registered further out. Joining never mutates the
//! parent: it produces a new registry whose extra scope is only visible to
//! whoever holds the new value.
//!
//! ```rust,ignore
//! let app = Registry::single(Config::default());
//! let scoped = app.join(&Registry::single(UserRepo::new()));
//!
//! assert!(scoped.get::<UserRepo>().is_ok());
//! assert!(app.get::<UserRepo>().is_err());
//! ```

mod spec;

pub use spec::RegistrySpec;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::ResolutionError;

/// A stored instance. The concrete value is always an `Arc<T>` so that
/// unsized keys such as `dyn Handler` can be registered.
#[derive(Clone)]
pub(crate) struct Entry {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Entry {
    pub(crate) fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }
}

struct Scope {
    entries: HashMap<TypeId, Entry>,
    parent: Option<Arc<Scope>>,
}

/// Immutable, cheaply cloneable registry.
#[derive(Clone, Default)]
pub struct Registry {
    head: Option<Arc<Scope>>,
}

impl Registry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self { head: None }
    }

    /// A registry holding exactly one entry.
    pub fn single<T: Send + Sync + 'static>(value: T) -> Self {
        Self::builder().add(value).build()
    }

    /// A registry holding exactly one shared entry (may be a trait object).
    pub fn single_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::builder().add_arc(value).build()
    }

    /// Start collecting entries for a new single-scope registry.
    pub fn builder() -> RegistrySpec {
        RegistrySpec::new()
    }

    pub(crate) fn from_entries(entries: HashMap<TypeId, Entry>) -> Self {
        if entries.is_empty() {
            return Self::empty();
        }
        Self {
            head: Some(Arc::new(Scope {
                entries,
                parent: None,
            })),
        }
    }

    /// Look up the nearest entry for `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolutionError> {
        self.maybe_get::<T>().ok_or_else(ResolutionError::of::<T>)
    }

    /// Look up the nearest entry for `T`, if any.
    pub fn maybe_get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let key = TypeId::of::<T>();
        self.scopes()
            .find_map(|scope| scope.entries.get(&key))
            .and_then(Entry::downcast::<T>)
    }

    /// Look up the nearest entry for `T`, falling back to `default`.
    pub fn get_or_else<T, F>(&self, default: F) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        self.maybe_get::<T>().unwrap_or_else(default)
    }

    /// Whether any scope holds an entry for `T`.
    pub fn contains<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        let key = TypeId::of::<T>();
        self.scopes().any(|scope| scope.entries.contains_key(&key))
    }

    /// Create a registry where `child`'s entries shadow this registry's.
    ///
    /// `child` is flattened into a single scope (its own nearest-first order
    /// preserved) and pushed on top of `self`. Neither input is modified.
    pub fn join(&self, child: &Registry) -> Registry {
        if child.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return child.clone();
        }

        let mut entries = HashMap::new();
        for scope in child.scopes() {
            for (key, entry) in &scope.entries {
                entries.entry(*key).or_insert_with(|| entry.clone());
            }
        }

        Registry {
            head: Some(Arc::new(Scope {
                entries,
                parent: self.head.clone(),
            })),
        }
    }

    /// Whether the registry holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.scopes().all(|scope| scope.entries.is_empty())
    }

    /// Number of stacked scopes.
    pub fn depth(&self) -> usize {
        self.scopes().count()
    }

    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(self.head.as_deref(), |scope| scope.parent.as_deref())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scopes: Vec<Vec<&'static str>> = self
            .scopes()
            .map(|scope| scope.entries.values().map(|e| e.type_name).collect())
            .collect();
        f.debug_struct("Registry").field("scopes", &scopes).finish()
    }
}
