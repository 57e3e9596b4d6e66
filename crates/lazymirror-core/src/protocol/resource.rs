//! Request path resolution.
//!
//! A `ResourcePath` is the validated form of a request path. It knows where the
//! resource lives under the store root and which URL to ask the origin for.
//! Directory requests (`/`, `/docs/`) resolve to the index document inside them,
//! the same way the static-file stage looks them up.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{MirrorError, Result};

/// Document served for directory requests unless configured otherwise.
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// Validated request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    /// Path as forwarded to the origin (percent-encoding preserved).
    origin_path: String,
    /// Decoded segments relative to the store root.
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parse the path component of a request URI.
    ///
    /// Rejects parent (`..`) segments and segments that would not stay a single
    /// file name under the store root. Empty and `.` segments are dropped.
    pub fn parse(request_path: &str, index_document: &str) -> Result<Self> {
        if !request_path.starts_with('/') {
            return Err(MirrorError::BadRequest(format!(
                "path must start with '/': {request_path}"
            )));
        }

        let mut origin_path = request_path.to_string();
        if origin_path.ends_with('/') {
            origin_path.push_str(index_document);
        }

        let decoded = percent_decode_str(&origin_path)
            .decode_utf8()
            .map_err(|_| MirrorError::BadRequest("path is not valid utf-8".into()))?;

        let mut segments = Vec::new();
        for seg in decoded.split('/') {
            match seg {
                "" | "." => continue,
                ".." => {
                    return Err(MirrorError::BadRequest(
                        "parent segments are not allowed".into(),
                    ))
                }
                s => {
                    check_segment(s)?;
                    segments.push(s.to_string());
                }
            }
        }

        // e.g. "/." names the root directory itself
        if segments.is_empty() {
            segments.push(index_document.to_string());
            origin_path = format!("/{index_document}");
        }

        Ok(Self { origin_path, segments })
    }

    /// Store-relative key (`a/b/c.txt`). Distinct encodings of one file share a key.
    pub fn key(&self) -> String {
        self.segments.join("/")
    }

    /// Path forwarded to the origin.
    pub fn origin_path(&self) -> &str {
        &self.origin_path
    }

    /// Location of the cache entry under `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        let mut p = root.to_path_buf();
        for seg in &self.segments {
            p.push(seg);
        }
        p
    }

    /// Origin URL: the base URL with the request path appended verbatim.
    pub fn origin_url(&self, base: &Url) -> Result<Url> {
        let joined = format!("{}{}", base.as_str().trim_end_matches('/'), self.origin_path);
        Url::parse(&joined)
            .map_err(|e| MirrorError::BadRequest(format!("invalid origin url {joined}: {e}")))
    }
}

/// Validate a configured index document name (a single file name).
pub fn validate_index_document(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(MirrorError::BadRequest(format!(
            "index document must be a single file name: {name:?}"
        )));
    }
    check_segment(name)
}

fn check_segment(seg: &str) -> Result<()> {
    let mut comps = Path::new(seg).components();
    let single_normal = matches!(comps.next(), Some(Component::Normal(_))) && comps.next().is_none();
    // backslash is a separator on some platforms; refuse it everywhere
    if !single_normal || seg.contains(|c: char| c == '\0' || c == '\\') {
        return Err(MirrorError::BadRequest(format!("invalid path segment: {seg:?}")));
    }
    Ok(())
}
