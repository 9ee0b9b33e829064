//! Arena-backed set of processed modules.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::{GraphError, ProcessedModule, QueryPath};

/// Stable index of a module inside a [`ModuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdx(usize);

impl ModuleIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Flat, de-duplicated collection of processed modules.
///
/// Modules are stored in discovery order and addressed by [`ModuleIdx`]; edges
/// are the `requires` lists of the modules themselves, looked up through the
/// `QueryPath` index. Nothing here is mutated by graph algorithms.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    modules: Vec<ProcessedModule>,
    by_path: IndexMap<QueryPath, ModuleIdx, FxBuildHasher>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from modules in discovery order, keeping the first module
    /// seen for each query path.
    pub fn from_modules(modules: impl IntoIterator<Item = ProcessedModule>) -> Self {
        let mut set = Self::new();
        for module in modules {
            if let Err(err) = set.insert(module) {
                tracing::debug!("{err}");
            }
        }
        set
    }

    /// Insert a module. A module already present by query path is never
    /// replaced.
    pub fn insert(&mut self, module: ProcessedModule) -> Result<ModuleIdx, GraphError> {
        if self.by_path.contains_key(&module.query_path) {
            return Err(GraphError::DuplicateModule {
                query_path: module.query_path,
            });
        }

        let idx = ModuleIdx(self.modules.len());
        self.by_path.insert(module.query_path.clone(), idx);
        self.modules.push(module);
        Ok(idx)
    }

    pub fn get(&self, idx: ModuleIdx) -> &ProcessedModule {
        &self.modules[idx.0]
    }

    pub fn idx_of(&self, query_path: &QueryPath) -> Option<ModuleIdx> {
        self.by_path.get(query_path).copied()
    }

    pub fn get_by_path(&self, query_path: &QueryPath) -> Option<&ProcessedModule> {
        self.idx_of(query_path).map(|idx| self.get(idx))
    }

    pub fn contains(&self, query_path: &QueryPath) -> bool {
        self.by_path.contains_key(query_path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules with their indices, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleIdx, &ProcessedModule)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, module)| (ModuleIdx(i), module))
    }

    pub fn indices(&self) -> impl Iterator<Item = ModuleIdx> + use<> {
        (0..self.modules.len()).map(ModuleIdx)
    }

    /// Dependencies of a module that are present in the set, in `requires`
    /// order. References to unknown modules are treated as external.
    pub fn dependencies(&self, idx: ModuleIdx) -> impl Iterator<Item = ModuleIdx> + '_ {
        self.get(idx)
            .requires
            .iter()
            .filter_map(|req| self.idx_of(req))
    }

    /// Reverse index: for every module, the modules declaring it as a
    /// dependency. Scheme-prefixed references are remote and never counted.
    pub fn required_by(&self) -> Vec<Vec<ModuleIdx>> {
        let mut index = vec![Vec::new(); self.modules.len()];
        for (idx, module) in self.iter() {
            for req in &module.requires {
                if req.is_remote() {
                    continue;
                }
                if let Some(target) = self.idx_of(req) {
                    let parents: &mut Vec<ModuleIdx> = &mut index[target.0];
                    if !parents.contains(&idx) {
                        parents.push(idx);
                    }
                }
            }
        }
        index
    }
}

impl FromIterator<ProcessedModule> for ModuleSet {
    fn from_iter<T: IntoIterator<Item = ProcessedModule>>(iter: T) -> Self {
        Self::from_modules(iter)
    }
}
