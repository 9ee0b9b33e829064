//! Reference resolution for `require()` specifiers.
//!
//! All lookups go through the [`Runtime`], relative to the project root:
//!
//! 1. **Scheme** (`pkg:/x.js`, `https://…`): remote, kept verbatim
//! 2. **Relative** (`./x`, `../x`): against the referrer's directory
//! 3. **Root-absolute** (`/lib/x`): against the project root
//! 4. **Bare** (`lodash`, `@scope/pkg/sub`): inside the dependency directory,
//!    honouring `package.json#main`
//!
//! Local candidates are probed as-is, then with `.js`, then as a directory
//! with `index.js`.

use std::path::PathBuf;
use std::sync::Arc;

use cube_graph::QueryPath;
use cube_graph::query_path::{normalize_local, scheme_of};
use serde_json::Value;

use crate::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// Found on disk under the project root.
    Local,
    /// Scheme-prefixed; never looked up locally.
    Remote,
    /// Looked like a local reference, but no file matched.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub query_path: QueryPath,
    pub kind: ResolutionKind,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    dependency_dir: String,
    runtime: Arc<dyn Runtime>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>, dependency_dir: &str, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            root: root.into(),
            dependency_dir: dependency_dir.trim_matches('/').to_string(),
            runtime,
        }
    }

    pub fn runtime(&self) -> &Arc<dyn Runtime> {
        &self.runtime
    }

    /// On-disk location of a root-relative path.
    pub fn fs_path(&self, rel_path: &str) -> PathBuf {
        self.root.join(rel_path.trim_start_matches('/'))
    }

    /// Resolve `specifier` as written in the module at `from`.
    ///
    /// Returns `None` only for blank specifiers.
    pub async fn resolve(&self, specifier: &str, from: &QueryPath) -> Option<Resolution> {
        let specifier = specifier.trim();
        if specifier.is_empty() {
            return None;
        }

        if scheme_of(specifier).is_some() {
            return Some(Resolution {
                query_path: QueryPath::new(specifier).ok()?,
                kind: ResolutionKind::Remote,
            });
        }

        let candidate = if specifier.starts_with('.') {
            let from = from.without_scheme();
            let dir = from.rsplit_once('/').map_or("", |(dir, _)| dir);
            normalize_local(&format!("{dir}/{specifier}"))
        } else if specifier.starts_with('/') {
            normalize_local(specifier)
        } else {
            return self.resolve_package(specifier).await;
        };

        self.settle(&candidate, self.probe(&candidate).await)
    }

    async fn resolve_package(&self, specifier: &str) -> Option<Resolution> {
        let (name, subpath) = split_package(specifier);
        let package_dir = normalize_local(&format!("{}/{}", self.dependency_dir, name));

        if !subpath.is_empty() {
            let candidate = normalize_local(&format!("{package_dir}/{subpath}"));
            return self.settle(&candidate, self.probe(&candidate).await);
        }

        if let Some(main) = self.package_main(&package_dir).await {
            let candidate = normalize_local(&format!("{package_dir}/{main}"));
            if let Some(found) = self.probe(&candidate).await {
                return self.settle(&candidate, Some(found));
            }
        }

        let candidate = format!("{package_dir}/index.js");
        self.settle(&candidate, self.probe(&candidate).await)
    }

    /// First existing file among the candidate and its `.js`/`index.js` forms.
    async fn probe(&self, candidate: &str) -> Option<String> {
        let forms = [
            candidate.to_string(),
            format!("{candidate}.js"),
            format!("{}/index.js", candidate.trim_end_matches('/')),
        ];

        for form in forms {
            let is_file = self
                .runtime
                .metadata(&self.fs_path(&form))
                .await
                .is_ok_and(|meta| meta.is_file());
            if is_file {
                return Some(form);
            }
        }
        None
    }

    async fn package_main(&self, package_dir: &str) -> Option<String> {
        let manifest = self.fs_path(&format!("{package_dir}/package.json"));
        if !self.runtime.exists(&manifest) {
            return None;
        }
        let bytes = self.runtime.read_file(&manifest).await.ok()?;
        let parsed: Value = serde_json::from_slice(&bytes).ok()?;
        parsed
            .get("main")
            .and_then(Value::as_str)
            .filter(|main| !main.trim().is_empty())
            .map(str::to_string)
    }

    fn settle(&self, candidate: &str, found: Option<String>) -> Option<Resolution> {
        let resolution = match found {
            Some(path) => Resolution {
                query_path: QueryPath::new(path).ok()?,
                kind: ResolutionKind::Local,
            },
            None => Resolution {
                query_path: QueryPath::new(candidate).ok()?,
                kind: ResolutionKind::Missing,
            },
        };
        Some(resolution)
    }
}

/// Split a bare specifier into package name and subpath.
fn split_package(specifier: &str) -> (&str, &str) {
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next().unwrap_or_default();

    if first.starts_with('@') {
        match (parts.next(), parts.next()) {
            (Some(name), rest) => {
                let end = first.len() + 1 + name.len();
                (&specifier[..end], rest.unwrap_or_default())
            }
            (None, _) => (specifier, ""),
        }
    } else {
        match specifier.split_once('/') {
            Some((name, rest)) => (name, rest),
            None => (specifier, ""),
        }
    }
}
