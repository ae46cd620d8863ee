use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// A small subscribe/emit surface shared by the data-source and preview
/// loader event APIs.
///
/// Listeners are invoked synchronously, in registration order, on the
/// emitting thread.
pub struct EventEmitter<E> {
    listeners: Mutex<Vec<(ListenerId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener and return the id used to remove it.
    pub fn on(&self, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("event listener lock poisoned")
            .push((id, listener));
        id
    }

    /// Remove a listener. Returns false if the id was already removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("event listener lock poisoned");
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        let listeners = self.listeners.lock().expect("event listener lock poisoned");
        for (_, listener) in listeners.iter() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("event listener lock poisoned")
            .len()
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
