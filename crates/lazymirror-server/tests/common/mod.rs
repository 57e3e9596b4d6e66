//! Test harness shared by the mirror integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use tempfile::TempDir;
use tower::ServiceExt;

use lazymirror_core::error::{MirrorError, Result};
use lazymirror_core::protocol::ResourcePath;
use lazymirror_server::app_state::AppState;
use lazymirror_server::config::{self, MirrorConfig};
use lazymirror_server::fill::{Origin, OriginFetch, OriginObject};
use lazymirror_server::router::build_router;
use lazymirror_server::traffic::PersistHandle;

/// In-memory origin that counts fetches.
#[derive(Default)]
pub struct MockOrigin {
    objects: Mutex<HashMap<String, OriginObject>>,
    calls: AtomicU64,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl MockOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn insert(&self, path: &str, body: &'static [u8], content_type: Option<&'static str>) {
        let obj = OriginObject {
            body: Bytes::from_static(body),
            content_type: content_type.map(HeaderValue::from_static),
        };
        self.objects.lock().unwrap().insert(path.to_string(), obj);
    }

    /// Make every fetch fail as if the origin were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Origin for MockOrigin {
    async fn fetch(&self, path: &ResourcePath) -> Result<OriginFetch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MirrorError::OriginUnreachable("connection refused".into()));
        }
        let found = self.objects.lock().unwrap().get(path.origin_path()).cloned();
        Ok(match found {
            Some(obj) => OriginFetch::Found(obj),
            None => OriginFetch::NotFound,
        })
    }
}

/// Config rooted in `dir`: store at `dir/static`, counter at `dir/traffic.txt`.
pub fn config_in(dir: &Path, origin_base: &str) -> MirrorConfig {
    let yaml = format!(
        "version: 1\norigin:\n  base_url: '{origin_base}'\nstore:\n  root: '{}'\ntraffic:\n  state_file: '{}'\n",
        dir.join("static").display(),
        dir.join("traffic.txt").display(),
    );
    config::load_from_str(&yaml).unwrap()
}

/// Router over a mock origin and a temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub origin: Arc<MockOrigin>,
    pub state: AppState,
    pub app: Router,
    persist: PersistHandle,
}

impl Harness {
    pub fn new(origin: MockOrigin) -> Self {
        Self::in_dir(tempfile::tempdir().unwrap(), Arc::new(origin))
    }

    pub fn in_dir(dir: TempDir, origin: Arc<MockOrigin>) -> Self {
        let cfg = config_in(dir.path(), "https://origin.test");
        let (state, persist) = AppState::with_origin(cfg, origin.clone()).unwrap();
        let app = build_router(state.clone());
        Self { dir, origin, state, app, persist }
    }

    /// Drop the router and wait for the counter to be flushed; the directory survives.
    pub async fn shutdown(self) -> (TempDir, Arc<MockOrigin>) {
        let Harness { dir, origin, state, app, persist } = self;
        drop(app);
        drop(state);
        persist.finish().await;
        (dir, origin)
    }

    pub fn store_path(&self, rel: &str) -> PathBuf {
        self.dir.path().join("static").join(rel)
    }

    pub fn put_local(&self, rel: &str, data: &[u8]) {
        let p = self.store_path(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, data).unwrap();
    }

    pub fn persisted_total(&self) -> u64 {
        let s = std::fs::read_to_string(self.dir.path().join("traffic.txt")).unwrap();
        s.parse().unwrap()
    }

    pub async fn get(&self, uri: &str) -> Reply {
        self.send("GET", uri).await
    }

    pub async fn send(&self, method: &str, uri: &str) -> Reply {
        let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        // collecting the body also waits for the traffic counter write
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        Reply { status, headers, body }
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}
