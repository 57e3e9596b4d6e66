use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

use lazymirror_core::error::{MirrorError, Result};
use lazymirror_core::protocol::resource::validate_index_document;
use lazymirror_core::protocol::DEFAULT_INDEX_DOCUMENT;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub origin: OriginSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub traffic: TrafficSection,
}

impl MirrorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MirrorError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.origin.validate()?;
        self.store.validate()?;
        self.traffic.validate()?;

        Ok(())
    }

    /// Parsed origin base URL. Valid once `validate` has passed.
    pub fn origin_url(&self) -> Result<Url> {
        self.origin.base_url()
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen_addr()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            MirrorError::BadRequest(format!(
                "server.listen must be a valid socket address: {}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginSection {
    pub base_url: String,

    #[serde(default)]
    pub user_agent: Option<String>,
}

impl OriginSection {
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if url.query().is_some() || url.fragment().is_some() {
            return Err(MirrorError::BadRequest(
                "origin.base_url must not carry a query or fragment".into(),
            ));
        }
        if let Some(ua) = &self.user_agent {
            if ua.trim().is_empty() {
                return Err(MirrorError::BadRequest("origin.user_agent must not be blank".into()));
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| MirrorError::BadRequest(format!("origin.base_url is invalid: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
            return Err(MirrorError::BadRequest(
                "origin.base_url must be an http(s) URL with a host".into(),
            ));
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default = "default_store_root")]
    pub root: PathBuf,

    #[serde(default = "default_index_document")]
    pub index_document: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            index_document: default_index_document(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(MirrorError::BadRequest("store.root must not be empty".into()));
        }
        validate_index_document(&self.index_document)
    }
}

fn default_store_root() -> PathBuf {
    PathBuf::from("static")
}
fn default_index_document() -> String {
    DEFAULT_INDEX_DOCUMENT.into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficSection {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for TrafficSection {
    fn default() -> Self {
        Self { state_file: default_state_file() }
    }
}

impl TrafficSection {
    pub fn validate(&self) -> Result<()> {
        if self.state_file.file_name().is_none() {
            return Err(MirrorError::BadRequest(
                "traffic.state_file must name a file".into(),
            ));
        }
        Ok(())
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("mini-cdn.txt")
}
