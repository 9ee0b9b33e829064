use std::fmt;

use serde::{Deserialize, Serialize};

use super::QueryPath;

/// The closed set of module kinds a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Script,
    Style,
    Template,
    /// Passed through untouched (no wrapping, no dependency extraction).
    Verbatim,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Template => "template",
            Self::Verbatim => "verbatim",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled source file: the unit of the module graph.
///
/// Produced by a transform engine; the graph only reads `query_path`,
/// `requires` and `requires_origin`. Both renderings of the compiled output are
/// carried so the emitter can pick one per module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedModule {
    pub query_path: QueryPath,
    /// Root-relative path of the on-disk source.
    pub real_path: String,
    pub module_type: ModuleType,
    /// Resolved dependency references, in declaration order.
    pub requires: Vec<QueryPath>,
    /// Root-relative on-disk paths of the references that resolved locally.
    pub requires_origin: Vec<String>,
    pub code: String,
    pub wrapped_code: String,
    /// `false` means the emitter writes `code` instead of `wrapped_code`.
    pub wrap: bool,
}

impl ProcessedModule {
    /// Create a new module builder with sensible defaults.
    pub fn builder(query_path: QueryPath, module_type: ModuleType) -> ProcessedModuleBuilder {
        let real_path = query_path.without_scheme().to_string();
        ProcessedModuleBuilder {
            module: Self {
                query_path,
                real_path,
                module_type,
                requires: Vec::new(),
                requires_origin: Vec::new(),
                code: String::new(),
                wrapped_code: String::new(),
                wrap: module_type != ModuleType::Verbatim,
            },
        }
    }

    /// The rendering the emitter should write for this module.
    pub fn output_code(&self) -> &str {
        if self.wrap {
            &self.wrapped_code
        } else {
            &self.code
        }
    }

    /// References into a root-relative directory, taken from `requires_origin`.
    pub fn origin_requires_within<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> {
        self.requires_origin
            .iter()
            .map(String::as_str)
            .filter(move |origin| crate::query_path::is_within(origin, dir))
    }
}

/// Builder for `ProcessedModule` to avoid long argument lists in constructors.
#[derive(Debug)]
pub struct ProcessedModuleBuilder {
    module: ProcessedModule,
}

impl ProcessedModuleBuilder {
    pub fn real_path(mut self, real_path: impl Into<String>) -> Self {
        self.module.real_path = real_path.into();
        self
    }

    pub fn requires(mut self, requires: Vec<QueryPath>) -> Self {
        self.module.requires = requires;
        self
    }

    pub fn requires_origin(mut self, requires_origin: Vec<String>) -> Self {
        self.module.requires_origin = requires_origin;
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.module.code = code.into();
        self
    }

    pub fn wrapped_code(mut self, wrapped_code: impl Into<String>) -> Self {
        self.module.wrapped_code = wrapped_code.into();
        self
    }

    pub fn wrap(mut self, wrap: bool) -> Self {
        self.module.wrap = wrap;
        self
    }

    pub fn build(self) -> ProcessedModule {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_modules_default_to_unwrapped_output() {
        let module = ProcessedModule::builder(QueryPath::new("/a.txt").unwrap(), ModuleType::Verbatim)
            .code("raw")
            .wrapped_code("wrapped")
            .build();
        assert_eq!(module.output_code(), "raw");
        assert_eq!(module.real_path, "/a.txt");
    }

    #[test]
    fn origin_requires_within_filters_dependency_dir() {
        let module = ProcessedModule::builder(QueryPath::new("/a.js").unwrap(), ModuleType::Script)
            .requires_origin(vec![
                "/b.js".to_string(),
                "/node_modules/x/index.js".to_string(),
            ])
            .build();
        let deps: Vec<_> = module.origin_requires_within("node_modules").collect();
        assert_eq!(deps, vec!["/node_modules/x/index.js"]);
    }
}
