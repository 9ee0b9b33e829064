use crate::{ModuleSet, ModuleType, ProcessedModule, QueryPath};

mod merge_tests;

pub(crate) fn qp(path: &str) -> QueryPath {
    QueryPath::new(path).unwrap()
}

/// A script module at `path` requiring `deps`, in declaration order.
pub(crate) fn script(path: &str, deps: &[&str]) -> ProcessedModule {
    ProcessedModule::builder(qp(path), ModuleType::Script)
        .requires(deps.iter().map(|dep| qp(dep)).collect())
        .code(format!("// {path}"))
        .build()
}

pub(crate) fn module_set(modules: Vec<ProcessedModule>) -> ModuleSet {
    modules.into_iter().collect()
}

pub(crate) fn paths(modules: &[QueryPath]) -> Vec<&str> {
    modules.iter().map(QueryPath::as_str).collect()
}
