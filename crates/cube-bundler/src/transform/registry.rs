use std::path::Path;

use cube_graph::ModuleType;
use rustc_hash::FxHashMap;

/// Maps file extensions (lower-case, with the leading dot) to module types.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    types: FxHashMap<String, ModuleType>,
}

impl ExtensionRegistry {
    /// An empty registry; every file is of unknown type.
    pub fn empty() -> Self {
        Self {
            types: FxHashMap::default(),
        }
    }

    /// Scripts, stylesheets and HTML-like templates.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for ext in [".js", ".mjs", ".cjs"] {
            registry.register(ext, ModuleType::Script);
        }
        registry.register(".css", ModuleType::Style);
        for ext in [".html", ".htm", ".tpl"] {
            registry.register(ext, ModuleType::Template);
        }
        registry
    }

    pub fn register(&mut self, ext: &str, module_type: ModuleType) -> &mut Self {
        let ext = if ext.starts_with('.') {
            ext.to_ascii_lowercase()
        } else {
            format!(".{}", ext.to_ascii_lowercase())
        };
        self.types.insert(ext, module_type);
        self
    }

    /// Module type for a path, by extension.
    pub fn lookup(&self, path: &str) -> Option<ModuleType> {
        let ext = Path::new(path).extension()?.to_str()?;
        self.types
            .get(&format!(".{}", ext.to_ascii_lowercase()))
            .copied()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
