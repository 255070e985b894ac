use std::sync::{Arc, Mutex, PoisonError};

/// Handle returned by `SessionManager::add_listener`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

/// Change listeners, notified in registration order.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    inner: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> ListenerId {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.entries.len();
        registry.entries.retain(|(entry_id, _)| *entry_id != id);
        registry.entries.len() != before
    }

    /// Call every listener registered at the time of the call.
    ///
    /// Iterates a snapshot with the lock released, so listeners may add or
    /// remove listeners (affecting later notifications) or call back into
    /// the manager.
    pub(crate) fn notify(&self) {
        let snapshot: Vec<Listener> = {
            let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in snapshot {
            listener();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
