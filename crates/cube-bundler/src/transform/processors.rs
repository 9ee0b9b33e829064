//! Per-type processors for the standard engine.

use std::sync::LazyLock;

use async_trait::async_trait;
use cube_graph::{ModuleType, ProcessedModule, QueryPath};
use regex::Regex;

use super::TransformError;
use super::resolve::{ResolutionKind, Resolver};

/// `require('x')` / `require("x")` with the specifier captured.
static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("require pattern is valid")
});

/// Source text plus what a processor needs to know about it.
pub struct SourceUnit<'a> {
    pub query_path: &'a QueryPath,
    pub real_path: &'a str,
    pub source: String,
    pub wrap: bool,
    pub resolver: &'a Resolver,
}

/// Compiles the source of one module type.
#[async_trait]
pub trait Processor: Send + Sync {
    fn module_type(&self) -> ModuleType;

    async fn process(&self, unit: SourceUnit<'_>) -> Result<ProcessedModule, TransformError>;
}

/// Wrap a module body in the loader's registration call.
pub fn wrap_module(query_path: &QueryPath, requires: &[QueryPath], body: &str) -> String {
    let name = serde_json::to_string(query_path.as_str()).unwrap_or_default();
    let deps = serde_json::to_string(requires).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Cube({name}, {deps}, function (module, exports, require, load, process, global) {{\n{body}\nreturn module.exports;}});"
    )
}

/// Specifiers of every `require()` call, with their byte ranges, in source
/// order.
pub fn extract_requires(source: &str) -> Vec<(std::ops::Range<usize>, &str)> {
    REQUIRE
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .map(|m| (m.range(), m.as_str()))
        .collect()
}

fn string_module(text: &str) -> String {
    let literal = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
    format!("module.exports = {literal};")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptProcessor;

#[async_trait]
impl Processor for ScriptProcessor {
    fn module_type(&self) -> ModuleType {
        ModuleType::Script
    }

    async fn process(&self, unit: SourceUnit<'_>) -> Result<ProcessedModule, TransformError> {
        let mut requires: Vec<QueryPath> = Vec::new();
        let mut requires_origin: Vec<String> = Vec::new();
        let mut code = String::with_capacity(unit.source.len());
        let mut last = 0;

        for (range, specifier) in extract_requires(&unit.source) {
            let Some(resolution) = unit.resolver.resolve(specifier, unit.query_path).await else {
                continue;
            };

            match resolution.kind {
                ResolutionKind::Local => {
                    let origin = resolution.query_path.as_str().to_string();
                    if !requires_origin.contains(&origin) {
                        requires_origin.push(origin);
                    }
                }
                ResolutionKind::Missing => {
                    tracing::warn!(
                        "{}: cannot resolve require('{}')",
                        unit.real_path,
                        specifier
                    );
                }
                ResolutionKind::Remote => {}
            }

            code.push_str(&unit.source[last..range.start]);
            code.push_str(resolution.query_path.as_str());
            last = range.end;

            if !requires.contains(&resolution.query_path) {
                requires.push(resolution.query_path);
            }
        }
        code.push_str(&unit.source[last..]);

        let wrapped_code = wrap_module(unit.query_path, &requires, &code);
        Ok(
            ProcessedModule::builder(unit.query_path.clone(), ModuleType::Script)
                .real_path(unit.real_path)
                .requires(requires)
                .requires_origin(requires_origin)
                .code(code)
                .wrapped_code(wrapped_code)
                .wrap(unit.wrap)
                .build(),
        )
    }
}

/// Stylesheets: raw CSS as `code`, a string module as the wrapped form.
#[derive(Debug, Default, Clone, Copy)]
pub struct StyleProcessor;

#[async_trait]
impl Processor for StyleProcessor {
    fn module_type(&self) -> ModuleType {
        ModuleType::Style
    }

    async fn process(&self, unit: SourceUnit<'_>) -> Result<ProcessedModule, TransformError> {
        let wrapped_code = wrap_module(unit.query_path, &[], &string_module(&unit.source));
        Ok(
            ProcessedModule::builder(unit.query_path.clone(), ModuleType::Style)
                .real_path(unit.real_path)
                .code(unit.source)
                .wrapped_code(wrapped_code)
                .wrap(unit.wrap)
                .build(),
        )
    }
}

/// Templates export their markup as a string.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateProcessor;

#[async_trait]
impl Processor for TemplateProcessor {
    fn module_type(&self) -> ModuleType {
        ModuleType::Template
    }

    async fn process(&self, unit: SourceUnit<'_>) -> Result<ProcessedModule, TransformError> {
        let code = string_module(&unit.source);
        let wrapped_code = wrap_module(unit.query_path, &[], &code);
        Ok(
            ProcessedModule::builder(unit.query_path.clone(), ModuleType::Template)
                .real_path(unit.real_path)
                .code(code)
                .wrapped_code(wrapped_code)
                .wrap(unit.wrap)
                .build(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::NativeRuntime;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn qp(path: &str) -> QueryPath {
        QueryPath::new(path).unwrap()
    }

    #[test]
    fn extract_requires_finds_both_quote_styles() {
        let source = r#"var a = require('./a'); var b = require ( "b/c" ); notrequire('x');"#;
        let specs: Vec<_> = extract_requires(source).into_iter().map(|(_, s)| s).collect();
        assert_eq!(specs, vec!["./a", "b/c"]);
    }

    #[test]
    fn wrap_module_escapes_names() {
        let wrapped = wrap_module(&qp("/a.js"), &[qp("/b.js")], "exports.x = 1;");
        assert!(wrapped.starts_with(r#"Cube("/a.js", ["/b.js"], function (module, exports, require, load, process, global) {"#));
        assert!(wrapped.ends_with("return module.exports;});"));
    }

    #[tokio::test]
    async fn script_rewrites_specifiers_to_query_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/dep")).unwrap();
        fs::write(dir.path().join("node_modules/dep/index.js"), "").unwrap();
        fs::write(dir.path().join("util.js"), "").unwrap();

        let resolver = Resolver::new(dir.path(), "node_modules", Arc::new(NativeRuntime));
        let query_path = qp("/app.js");
        let unit = SourceUnit {
            query_path: &query_path,
            real_path: "/app.js",
            source: "require('./util');require('dep');require('./util');require('cdn:/x.js');require('./gone');".to_string(),
            wrap: true,
            resolver: &resolver,
        };

        let module = ScriptProcessor.process(unit).await.unwrap();

        assert_eq!(
            module.code,
            "require('/util.js');require('/node_modules/dep/index.js');require('/util.js');require('cdn:/x.js');require('/gone');"
        );
        assert_eq!(
            module.requires,
            vec![
                qp("/util.js"),
                qp("/node_modules/dep/index.js"),
                qp("cdn:/x.js"),
                qp("/gone")
            ]
        );
        assert_eq!(
            module.requires_origin,
            vec!["/util.js", "/node_modules/dep/index.js"]
        );
        assert!(module.wrapped_code.contains(r#"["/util.js","/node_modules/dep/index.js","cdn:/x.js","/gone"]"#));
    }

    #[tokio::test]
    async fn style_keeps_raw_css_as_code() {
        let dir = TempDir::new().unwrap();
        let resolver = Resolver::new(dir.path(), "node_modules", Arc::new(NativeRuntime));
        let query_path = qp("/a.css");
        let unit = SourceUnit {
            query_path: &query_path,
            real_path: "/a.css",
            source: "body { color: \"red\"; }".to_string(),
            wrap: true,
            resolver: &resolver,
        };

        let module = StyleProcessor.process(unit).await.unwrap();
        assert_eq!(module.code, "body { color: \"red\"; }");
        assert!(module.wrapped_code.contains(r#"module.exports = "body { color: \"red\"; }";"#));
        assert_eq!(module.output_code(), module.wrapped_code);
    }
}
