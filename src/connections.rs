use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Caps the number of live client connections.
///
/// A slot is taken with [`ConnectionLimiter::try_acquire`] and given back when
/// the returned [`ConnectionPermit`] is dropped, typically at the end of the
/// task serving that connection.
#[derive(Clone, Debug)]
pub struct ConnectionLimiter {
    active: Arc<AtomicUsize>,
    max_connections: usize,
}

impl ConnectionLimiter {
    pub fn new(max_connections: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max_connections,
        }
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Take a slot, or `None` when the limit is already reached.
    pub fn try_acquire(&self) -> Option<ConnectionPermit> {
        let max = self.max_connections;
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < max).then_some(current + 1)
            })
            .ok()
            .map(|_| ConnectionPermit {
                active: Arc::clone(&self.active),
            })
    }
}

#[derive(Debug)]
pub struct ConnectionPermit {
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
