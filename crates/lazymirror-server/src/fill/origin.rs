//! Upstream origin access.

use async_trait::async_trait;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use bytes::Bytes;
use url::Url;

use lazymirror_core::error::{MirrorError, Result};
use lazymirror_core::protocol::ResourcePath;

/// A resource as the origin served it.
#[derive(Debug, Clone)]
pub struct OriginObject {
    pub body: Bytes,
    /// `Content-Type` exactly as the origin sent it, if it sent one.
    pub content_type: Option<HeaderValue>,
}

/// Result of one origin request that the mirror knows how to answer.
#[derive(Debug, Clone)]
pub enum OriginFetch {
    Found(OriginObject),
    NotFound,
}

/// Source of truth the mirror fills from. One call is one attempt; no retries.
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, path: &ResourcePath) -> Result<OriginFetch>;
}

/// HTTP(S) origin: plain `GET <base><path>`.
pub struct HttpOrigin {
    client: reqwest::Client,
    base: Url,
}

impl HttpOrigin {
    pub fn new(base: Url, user_agent: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua);
        }
        let client = builder
            .build()
            .map_err(|e| MirrorError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self { client, base })
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, path: &ResourcePath) -> Result<OriginFetch> {
        let url = path.origin_url(&self.base)?;

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MirrorError::OriginUnreachable(format!("{url}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(OriginFetch::NotFound);
        }
        if !status.is_success() {
            return Err(MirrorError::OriginStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = resp.headers().get(CONTENT_TYPE).cloned();
        let body = resp
            .bytes()
            .await
            .map_err(|e| MirrorError::OriginUnreachable(format!("{url}: body read failed: {e}")))?;

        Ok(OriginFetch::Found(OriginObject { body, content_type }))
    }
}
