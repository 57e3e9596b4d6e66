//! Request path resolution vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::Path;

use lazymirror_core::protocol::{ResourcePath, DEFAULT_INDEX_DOCUMENT};


#[test]
fn resource_path_vectors() {
    for v in vector_loader::load("resource_paths.json") {
        let index = v.index_document.as_deref().unwrap_or(DEFAULT_INDEX_DOCUMENT);
        let res = ResourcePath::parse(&v.path, index);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let p = res.expect("expected resolved path");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(p.key(), ex.key, "vector={}", v.description);
        assert_eq!(p.origin_path(), ex.origin_path, "vector={}", v.description);
    }
}

#[test]
fn local_path_stays_under_root() {
    let root = Path::new("/srv/mirror");
    for raw in ["/a/b/c.css", "/./a//b/", "/%2e%2e%2fsecret/", "/x/%2E/y.js"] {
        match ResourcePath::parse(raw, DEFAULT_INDEX_DOCUMENT) {
            Ok(p) => assert!(p.local_path(root).starts_with(root), "path={raw}"),
            Err(e) => assert_eq!(e.client_code().as_str(), "BAD_REQUEST", "path={raw}"),
        }
    }
}
