//! Shared server state handed to every handler.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use streamgrid_core::DocumentStore;
use tokio::sync::watch;
use tokio::task::{self, JoinError};

/// Identifier of one WebSocket connection, used in log fields.
pub type ClientId = u64;

/// Cheap to clone; every clone refers to the same store and counters.
#[derive(Clone)]
pub struct AppState {
    store: Arc<DocumentStore>,
    clients: Arc<AtomicUsize>,
    next_client_id: Arc<AtomicU64>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            clients: Arc::new(AtomicUsize::new(0)),
            next_client_id: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Number of open WebSocket connections.
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    pub(crate) fn register_client(&self) -> ClientId {
        self.clients.fetch_add(1, Ordering::Relaxed);
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn unregister_client(&self) {
        self.clients.fetch_sub(1, Ordering::Relaxed);
    }

    /// Run a store call on the blocking pool.
    ///
    /// Mutations write and fsync the document file while holding the store
    /// lock, which must not stall the async workers.
    pub async fn run_blocking<R, F>(&self, f: F) -> Result<R, JoinError>
    where
        F: FnOnce(&DocumentStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || f(&store)).await
    }

    /// Ask the server and every open socket to wind down.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`Self::begin_shutdown`] has been called.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            let _ = rx.wait_for(|stopping| *stopping).await;
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("clients", &self.client_count())
            .finish_non_exhaustive()
    }
}
