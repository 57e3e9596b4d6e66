//! Mirror config loader (strict parsing).

pub mod schema;

use std::fs;

use lazymirror_core::error::{MirrorError, Result};

pub use schema::{MirrorConfig, OriginSection, ServerSection, StoreSection, TrafficSection};

pub fn load_from_file(path: &str) -> Result<MirrorConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MirrorError::Storage(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MirrorConfig> {
    let cfg: MirrorConfig = serde_yaml::from_str(s)
        .map_err(|e| MirrorError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
