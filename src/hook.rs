//! Resolution Hook Chain
//!
//! An explicit, ordered registry of class resolvers. A host consults the
//! chain when code references a type it has no definition for; each resolver
//! gets a chance to supply it, in registration order.
//!
//! Resolvers are identified by [`HookId`], so registering the same resolver
//! twice is a no-op rather than a duplicate entry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::AutoloadResult;
use crate::loader::Resolution;

/// Unique identifier of a registered resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

impl HookId {
    /// Allocate a fresh, process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        HookId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook#{}", self.0)
    }
}

/// A callback that tries to make a class available.
pub trait ClassResolver: Send + Sync {
    /// Identity used for duplicate suppression on the chain.
    fn hook_id(&self) -> HookId;

    /// Attempt to resolve `class_name`.
    fn resolve_class(&self, class_name: &str) -> AutoloadResult<Resolution>;
}

/// Adapter turning a closure into a [`ClassResolver`].
pub struct FnResolver<F> {
    id: HookId,
    f: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str) -> AutoloadResult<Resolution> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            id: HookId::next(),
            f,
        }
    }
}

impl<F> ClassResolver for FnResolver<F>
where
    F: Fn(&str) -> AutoloadResult<Resolution> + Send + Sync,
{
    fn hook_id(&self) -> HookId {
        self.id
    }

    fn resolve_class(&self, class_name: &str) -> AutoloadResult<Resolution> {
        (self.f)(class_name)
    }
}

/// Ordered chain of resolvers.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: RwLock<Vec<Arc<dyn ClassResolver>>>,
}

impl ResolverChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide chain used by the singleton autoloader.
    pub fn global() -> Arc<ResolverChain> {
        static GLOBAL: OnceLock<Arc<ResolverChain>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ResolverChain::new())))
    }

    /// Append a resolver. Returns false if it was already registered.
    pub fn register(&self, resolver: Arc<dyn ClassResolver>) -> bool {
        let id = resolver.hook_id();
        let mut resolvers = self.resolvers.write();
        if resolvers.iter().any(|r| r.hook_id() == id) {
            trace!(%id, "resolver already registered");
            return false;
        }
        resolvers.push(resolver);
        debug!(%id, count = resolvers.len(), "resolver registered");
        true
    }

    /// Remove a resolver. Returns false if it was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut resolvers = self.resolvers.write();
        let before = resolvers.len();
        resolvers.retain(|r| r.hook_id() != id);
        let removed = resolvers.len() != before;
        if removed {
            debug!(%id, count = resolvers.len(), "resolver unregistered");
        }
        removed
    }

    pub fn contains(&self, id: HookId) -> bool {
        self.resolvers.read().iter().any(|r| r.hook_id() == id)
    }

    /// Registered ids, in consultation order.
    pub fn ids(&self) -> Vec<HookId> {
        self.resolvers.read().iter().map(|r| r.hook_id()).collect()
    }

    pub fn len(&self) -> usize {
        self.resolvers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.read().is_empty()
    }

    /// Consult resolvers in order until one succeeds.
    ///
    /// Resolver errors are not propagated: a failed resolver just hands the
    /// class on to the next one. `None` means nobody could supply it.
    pub fn resolve(&self, class_name: &str) -> Option<Resolution> {
        // Snapshot so resolvers may touch the chain while running.
        let resolvers: Vec<Arc<dyn ClassResolver>> = self.resolvers.read().clone();

        for resolver in resolvers {
            match resolver.resolve_class(class_name) {
                Ok(resolution) => return Some(resolution),
                Err(err) => {
                    debug!(id = %resolver.hook_id(), class = class_name, error = %err, "resolver declined");
                }
            }
        }
        None
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutoloadError;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    fn not_found(class: &str) -> AutoloadError {
        AutoloadError::ClassNotFound {
            class: class.to_string(),
            candidates: Vec::new(),
        }
    }

    #[test]
    fn test_hook_ids_are_unique() {
        let a = HookId::next();
        let b = HookId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_register_is_idempotent() {
        let chain = ResolverChain::new();
        let resolver: Arc<dyn ClassResolver> =
            Arc::new(FnResolver::new(|c: &str| Err(not_found(c))));

        assert!(chain.register(Arc::clone(&resolver)));
        assert!(!chain.register(Arc::clone(&resolver)));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let chain = ResolverChain::new();
        let resolver: Arc<dyn ClassResolver> =
            Arc::new(FnResolver::new(|c: &str| Err(not_found(c))));
        let id = resolver.hook_id();

        chain.register(resolver);
        assert!(chain.contains(id));
        assert!(chain.unregister(id));
        assert!(!chain.unregister(id));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_resolve_consults_in_order_and_stops_at_first_success() {
        let chain = ResolverChain::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&calls);
        chain.register(Arc::new(FnResolver::new(move |c: &str| {
            c1.fetch_add(1, Ordering::SeqCst);
            Err(not_found(c))
        })));
        let c2 = Arc::clone(&calls);
        chain.register(Arc::new(FnResolver::new(move |_: &str| {
            c2.fetch_add(1, Ordering::SeqCst);
            Ok(Resolution::Loaded(PathBuf::from("second/Foo.php")))
        })));
        let c3 = Arc::clone(&calls);
        chain.register(Arc::new(FnResolver::new(move |_: &str| {
            c3.fetch_add(1, Ordering::SeqCst);
            Ok(Resolution::Loaded(PathBuf::from("third/Foo.php")))
        })));

        let resolution = chain.resolve("Foo");
        assert_eq!(
            resolution,
            Some(Resolution::Loaded(PathBuf::from("second/Foo.php")))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolve_empty_chain() {
        let chain = ResolverChain::new();
        assert_eq!(chain.resolve("Foo"), None);
    }

    #[test]
    fn test_global_chain_is_shared() {
        assert!(Arc::ptr_eq(&ResolverChain::global(), &ResolverChain::global()));
    }
}
