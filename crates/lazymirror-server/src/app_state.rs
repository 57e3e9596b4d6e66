//! Shared application state for the mirror server.
//!
//! Startup errors are returned, not panicked on, so `main` decides how to exit.

use std::sync::Arc;

use lazymirror_core::error::Result;

use crate::config::MirrorConfig;
use crate::fill::{HttpOrigin, LocalStore, Origin, OriginFillCache};
use crate::traffic::{PersistHandle, TrafficAccountant};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    traffic: TrafficAccountant,
    fill: Arc<OriginFillCache>,
}

struct AppStateInner {
    cfg: MirrorConfig,
}

impl AppState {
    /// Build state with the configured HTTP origin.
    /// Must run inside a tokio runtime (starts the traffic accountant).
    pub fn new(cfg: MirrorConfig) -> Result<(Self, PersistHandle)> {
        let origin = HttpOrigin::new(cfg.origin_url()?, cfg.origin.user_agent.as_deref())?;
        Self::with_origin(cfg, Arc::new(origin))
    }

    /// Build state around any origin implementation.
    pub fn with_origin(cfg: MirrorConfig, origin: Arc<dyn Origin>) -> Result<(Self, PersistHandle)> {
        let (traffic, persist) = TrafficAccountant::spawn(cfg.traffic.state_file.clone())?;
        let store = LocalStore::new(cfg.store.root.clone(), cfg.store.index_document.clone());
        let fill = Arc::new(OriginFillCache::new(store, origin));

        let state = Self {
            inner: Arc::new(AppStateInner { cfg }),
            traffic,
            fill,
        };
        Ok((state, persist))
    }

    pub fn cfg(&self) -> &MirrorConfig {
        &self.inner.cfg
    }

    pub fn traffic(&self) -> &TrafficAccountant {
        &self.traffic
    }

    pub fn fill(&self) -> Arc<OriginFillCache> {
        Arc::clone(&self.fill)
    }
}
