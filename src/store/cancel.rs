//! Cancellation tokens for in-flight backend requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Fetch,
    /// Level of a same-BC hierarchy, 2 and deeper.
    DepthFetch(usize),
    RowMeta,
}

impl RequestKind {
    pub fn is_fetch(&self) -> bool {
        matches!(self, RequestKind::Fetch | RequestKind::DepthFetch(_))
    }
}

type RequestKey = (String, RequestKind);

/// Handle of one registered request.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    key: RequestKey,
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn bc_name(&self) -> &str {
        &self.key.0
    }
}

/// At most one live request per (BC, request kind).
#[derive(Debug, Default)]
pub struct CancelRegistry {
    requests: Mutex<HashMap<RequestKey, (u64, CancellationToken)>>,
    next_generation: AtomicU64,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request, cancelling the one it supersedes.
    pub fn begin(&self, bc_name: &str, kind: RequestKind) -> RequestTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let key = (bc_name.to_string(), kind);
        let previous = self
            .requests
            .lock()
            .insert(key.clone(), (generation, token.clone()));
        if let Some((_, superseded)) = previous {
            debug!(bc_name = %bc_name, kind = ?kind, "Superseding in-flight request");
            superseded.cancel();
        }
        RequestTicket {
            key,
            generation,
            token,
        }
    }

    /// Forgets a finished request unless a newer one took its slot.
    pub fn finish(&self, ticket: &RequestTicket) {
        let mut requests = self.requests.lock();
        if requests
            .get(&ticket.key)
            .is_some_and(|(generation, _)| *generation == ticket.generation)
        {
            requests.remove(&ticket.key);
        }
    }

    /// Whether some request currently owns the ticket's slot.
    pub fn has_pending(&self, ticket: &RequestTicket) -> bool {
        self.requests.lock().contains_key(&ticket.key)
    }

    /// Cancels every data fetch; returns how many were cancelled.
    pub fn cancel_fetches(&self) -> usize {
        let mut requests = self.requests.lock();
        let keys: Vec<RequestKey> = requests
            .keys()
            .filter(|(_, kind)| kind.is_fetch())
            .cloned()
            .collect();
        for key in &keys {
            if let Some((_, token)) = requests.remove(key) {
                token.cancel();
            }
        }
        keys.len()
    }

    /// Cancels everything in flight.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.requests.lock().drain().collect();
        for (_, (_, token)) in &drained {
            token.cancel();
        }
        drained.len()
    }

    pub fn in_flight(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_supersedes_same_slot() {
        let registry = CancelRegistry::new();
        let first = registry.begin("customer", RequestKind::Fetch);
        let second = registry.begin("customer", RequestKind::Fetch);
        let other = registry.begin("customer", RequestKind::DepthFetch(2));

        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
        assert!(!other.token().is_cancelled());

        registry.finish(&first);
        assert!(registry.has_pending(&second));
        registry.finish(&second);
        assert!(!registry.has_pending(&second));
    }

    #[test]
    fn cancel_fetches_spares_row_meta() {
        let registry = CancelRegistry::new();
        let fetch = registry.begin("customer", RequestKind::Fetch);
        let meta = registry.begin("customer", RequestKind::RowMeta);

        assert_eq!(registry.cancel_fetches(), 1);
        assert!(fetch.token().is_cancelled());
        assert!(!meta.token().is_cancelled());
        assert!(!registry.has_pending(&fetch));
        assert_eq!(registry.in_flight(), 1);

        assert_eq!(registry.cancel_all(), 1);
        assert!(meta.token().is_cancelled());
    }
}
