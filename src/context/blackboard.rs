//! Type-keyed service store shared by one machine instance.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Lookup of a service that was never installed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Service '{service}' not found on blackboard")]
pub struct ServiceNotFound {
    /// Type name of the missing service
    pub service: &'static str,
}

type Service = Arc<dyn Any + Send + Sync>;

/// Typed map from service type to one shared instance.
///
/// Services are stored behind `Arc`, so every holder sees the same value.
/// Services that need to change over time carry their own interior
/// mutability; the blackboard only guards the map itself.
///
/// # Example
///
/// ```rust
/// use hsm_engine::context::Blackboard;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct Counter(AtomicU32);
///
/// let blackboard = Blackboard::new();
/// blackboard.set(Counter(AtomicU32::new(0)));
///
/// let a = blackboard.get::<Counter>().unwrap();
/// let b = blackboard.get::<Counter>().unwrap();
/// a.0.fetch_add(1, Ordering::SeqCst);
/// assert_eq!(b.0.load(Ordering::SeqCst), 1);
///
/// assert!(blackboard.get::<String>().is_err());
/// ```
#[derive(Default)]
pub struct Blackboard {
    services: RwLock<HashMap<TypeId, Service>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `service`, replacing any previous service of the same type.
    pub fn set<T: Send + Sync + 'static>(&self, service: T) {
        self.set_shared(Arc::new(service));
    }

    /// Install an already shared service.
    pub fn set_shared<T: Send + Sync + 'static>(&self, service: Arc<T>) {
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), service);
    }

    /// Look up the service of type `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ServiceNotFound> {
        let service = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .cloned();

        service
            .and_then(|s| s.downcast::<T>().ok())
            .ok_or(ServiceNotFound {
                service: type_name::<T>(),
            })
    }

    pub fn has<T: Send + Sync + 'static>(&self) -> bool {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blackboard")
            .field("services", &self.len())
            .finish()
    }
}
