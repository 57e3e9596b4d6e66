use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

use lazymirror_core::error::{MirrorError, Result};
use lazymirror_core::protocol::ResourcePath;

use super::origin::{Origin, OriginFetch, OriginObject};
use super::store::LocalStore;

/// How a fill attempt ended, as far as the client is concerned.
#[derive(Debug, Clone)]
pub enum FillOutcome {
    /// Fetched from origin (and stored, unless the write failed).
    Filled(OriginObject),
    /// Origin answered 404. Nothing is stored; the next request asks again.
    NotFound,
    /// The entry was already on disk when the fill started; serve it from there.
    Local,
}

type SharedFill = Shared<BoxFuture<'static, Result<FillOutcome>>>;

/// Origin-pull fill with per-path coalescing.
///
/// The first miss for a path spawns the fill as its own task and registers a
/// shared handle to it; later misses for the same path await that handle
/// instead of calling the origin. The task runs to completion even if every
/// waiting client disconnects, and unregisters itself once the entry is on
/// disk (or the attempt failed).
pub struct OriginFillCache {
    store: Arc<LocalStore>,
    origin: Arc<dyn Origin>,
    in_flight: Arc<DashMap<String, SharedFill>>,
}

impl OriginFillCache {
    pub fn new(store: LocalStore, origin: Arc<dyn Origin>) -> Self {
        Self {
            store: Arc::new(store),
            origin,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Number of fills currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Fill `res` from origin, or join the fill already running for it.
    pub async fn fill(&self, res: &ResourcePath) -> Result<FillOutcome> {
        let key = res.key();

        let shared = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(e) => {
                tracing::debug!(key = %key, "joining in-flight fill");
                e.get().clone()
            }
            Entry::Vacant(v) => {
                let task = tokio::spawn(run_fill(
                    Arc::clone(&self.store),
                    Arc::clone(&self.origin),
                    Arc::clone(&self.in_flight),
                    res.clone(),
                    key,
                ));
                let shared = async move {
                    task.await
                        .unwrap_or_else(|e| Err(MirrorError::Internal(format!("fill task failed: {e}"))))
                }
                .boxed()
                .shared();
                v.insert(shared.clone());
                shared
            }
        };

        shared.await
    }
}

async fn run_fill(
    store: Arc<LocalStore>,
    origin: Arc<dyn Origin>,
    in_flight: Arc<DashMap<String, SharedFill>>,
    res: ResourcePath,
    key: String,
) -> Result<FillOutcome> {
    let outcome = fill_once(&store, origin.as_ref(), &res).await;
    in_flight.remove(&key);
    outcome
}

async fn fill_once(store: &LocalStore, origin: &dyn Origin, res: &ResourcePath) -> Result<FillOutcome> {
    // entries are write-once: an earlier fill may have landed since the caller looked
    if store.contains(res).await {
        tracing::debug!(path = %res.origin_path(), "entry already stored; skipping origin");
        return Ok(FillOutcome::Local);
    }

    tracing::debug!(path = %res.origin_path(), "cache miss; fetching from origin");

    match origin.fetch(res).await? {
        OriginFetch::NotFound => {
            tracing::debug!(path = %res.origin_path(), "origin has no such resource");
            Ok(FillOutcome::NotFound)
        }
        OriginFetch::Found(obj) => {
            match store.write(res, &obj.body).await {
                Ok(file) => tracing::info!(
                    path = %res.origin_path(),
                    bytes = obj.body.len(),
                    content_type = ?obj.content_type,
                    file = %file.display(),
                    "cache entry filled"
                ),
                // the client still gets the bytes; only durability is lost
                Err(e) => tracing::error!(
                    path = %res.origin_path(),
                    error = %e,
                    "cache entry write failed"
                ),
            }
            Ok(FillOutcome::Filled(obj))
        }
    }
}
