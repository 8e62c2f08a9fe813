//! Tool extension system.
//!
//! Every operation the HTTP server exposes is a [`Tool`]: an object with a
//! name, a JSON Schema for its parameters, and an async `execute`. The
//! built-in resolver tools and any tools an embedding binary adds are kept in
//! one [`ToolRegistry`] and dispatched through the same `POST /tools/{name}`
//! handler.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌────────────────────┐ ┌─────────────┐  │
//! │  │ Built-in           │ │  Custom     │  │
//! │  │ resolve-library-id │ │  (Rust)     │  │
//! │  │ get-library        │ │             │  │
//! │  │ list-libraries     │ │             │  │
//! │  └────────────────────┘ └─────────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!          run_server() → HTTP tool API
//! ```
//!
//! Parameters are checked against [`Tool::parameters_schema`] by
//! [`validate_params`] before `execute` is called, so tools can index into
//! the params object without re-checking types.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use c7_resolver_core::models::{LibraryFilter, LibraryStatus};
use c7_resolver_core::resolver::LibraryResolver;
use c7_resolver_core::store::MetadataStore;

/// Client errors raised by tool implementations.
///
/// The server downcasts these to pick a status code; any other error is
/// reported as a tool failure.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("{0} not found")]
    NotFound(String),
}

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use c7_resolver::traits::{Tool, ToolContext};
///
/// pub struct CountTool;
///
/// #[async_trait]
/// impl Tool for CountTool {
///     fn name(&self) -> &str { "count-libraries" }
///     fn description(&self) -> &str { "Count known libraries" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         let all = ctx.store().list_libraries(&Default::default()).await?;
///         Ok(json!({ "count": all.len() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name, used as `POST /tools/{name}`.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Marked `"builtin": true` in `GET /tools/list`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool.
    ///
    /// # Arguments
    ///
    /// * `params`: JSON object that has passed [`validate_params`], with
    ///   schema defaults filled in.
    /// * `ctx`: resolver and store handles.
    ///
    /// # Returns
    ///
    /// A JSON value wrapped in `{ "result": ... }` by the server. Return a
    /// [`ToolError`] or [`ResolveError`](c7_resolver_core::resolver::ResolveError)
    /// to get a 400 or 404; any other error is a 500.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared handles passed to every tool invocation.
///
/// Created once by the server and borrowed by each call. Cloning is cheap:
/// the resolver holds its store behind an `Arc`.
#[derive(Clone)]
pub struct ToolContext {
    /// Resolver configured from `[resolver]` and `[scoring]`.
    resolver: LibraryResolver,
}

impl ToolContext {
    /// Create a context around a configured resolver.
    pub fn new(resolver: LibraryResolver) -> Self {
        Self { resolver }
    }

    /// The resolver behind `resolve-library-id`.
    pub fn resolver(&self) -> &LibraryResolver {
        &self.resolver
    }

    /// The catalog the resolver reads from.
    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        self.resolver.store()
    }
}

/// Tool metadata as listed by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Tool name, also its route.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// `true` for the tools registered by [`ToolRegistry::with_builtins`].
    pub builtin: bool,
    /// JSON Schema for the parameters.
    pub parameters: Value,
}

impl ToolInfo {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Resolves a library name to its canonical id.
pub struct ResolveLibraryTool;

#[async_trait]
impl Tool for ResolveLibraryTool {
    fn name(&self) -> &str {
        "resolve-library-id"
    }

    fn description(&self) -> &str {
        "Resolve a library name to a canonical library id, using the query to pick between same-named libraries"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "library_name": { "type": "string", "description": "Library name as the user wrote it" },
                "query": { "type": "string", "description": "The user's question, used as context", "default": "" },
                "explain": { "type": "boolean", "description": "Include the scored candidate list", "default": false }
            },
            "required": ["library_name"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let library_name = params["library_name"].as_str().unwrap_or("");
        let query = params["query"].as_str().unwrap_or("");

        if params["explain"].as_bool().unwrap_or(false) {
            let ranking = ctx.resolver.rank(library_name, query).await?;
            return Ok(json!({
                "canonical_id": ranking.best(),
                "tier": ranking.tier,
                "candidates": ranking.candidates,
            }));
        }

        let canonical_id = ctx.resolver.resolve(library_name, query).await?;
        Ok(json!({ "canonical_id": canonical_id }))
    }
}

/// Fetches the full record for a canonical id.
pub struct GetLibraryTool;

#[async_trait]
impl Tool for GetLibraryTool {
    fn name(&self) -> &str {
        "get-library"
    }

    fn description(&self) -> &str {
        "Get library metadata by canonical id"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "canonical_id": { "type": "string", "description": "e.g. /pypi/requests" }
            },
            "required": ["canonical_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let canonical_id = params["canonical_id"].as_str().unwrap_or("").trim();
        if canonical_id.is_empty() {
            return Err(ToolError::InvalidParams("canonical_id must not be empty".into()).into());
        }

        match ctx.store().get_by_canonical_id(canonical_id).await? {
            Some(record) => Ok(serde_json::to_value(&record)?),
            None => Err(ToolError::NotFound(format!("library {}", canonical_id)).into()),
        }
    }
}

/// Lists catalog records, optionally filtered.
pub struct ListLibrariesTool;

#[async_trait]
impl Tool for ListLibrariesTool {
    fn name(&self) -> &str {
        "list-libraries"
    }

    fn description(&self) -> &str {
        "List known libraries, optionally filtered by language, ecosystem, or status"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "language": { "type": "string" },
                "ecosystem": { "type": "string" },
                "status": { "type": "string", "enum": ["active", "deprecated", "archived"] }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let mut filter = LibraryFilter::none();
        if let Some(language) = params["language"].as_str() {
            filter = filter.with_language(language);
        }
        if let Some(ecosystem) = params["ecosystem"].as_str() {
            filter = filter.with_ecosystem(ecosystem);
        }
        if let Some(status) = params["status"].as_str() {
            let status: LibraryStatus = status
                .parse()
                .map_err(|e: anyhow::Error| ToolError::InvalidParams(e.to_string()))?;
            filter = filter.with_status(status);
        }

        let libraries = ctx.store().list_libraries(&filter).await?;
        Ok(json!({ "libraries": libraries }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of tools served over HTTP.
///
/// ```rust
/// use c7_resolver::traits::ToolRegistry;
///
/// let mut tools = ToolRegistry::with_builtins();
/// // tools.register(Box::new(MyTool));
/// assert!(tools.find("resolve-library-id").is_some());
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding `resolve-library-id`, `get-library`, and
    /// `list-libraries`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ResolveLibraryTool));
        registry.register(Box::new(GetLibraryTool));
        registry.register(Box::new(ListLibrariesTool));
        registry
    }

    /// Register a tool. A tool whose name is already taken is ignored, so
    /// built-ins cannot be shadowed.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if self.find(tool.name()).is_some() {
            tracing::warn!(tool = tool.name(), "duplicate tool name; ignoring registration");
            return;
        }
        self.tools.push(tool);
    }

    /// Move every tool from `other` into this registry.
    pub fn extend(&mut self, other: ToolRegistry) {
        for tool in other.tools {
            self.register(tool);
        }
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's JSON Schema and fill in defaults.
///
/// Supports the subset the built-in schemas use: `required`, primitive
/// `type` checks, `enum`, and `default`. Unknown properties pass through.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be a JSON object, got {}", json_type_name(other)),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for field in &required {
        if !params_obj.contains_key(*field) {
            bail!("missing required parameter: {}", field);
        }
    }

    let mut result = params_obj.clone();

    for (prop_name, prop_schema) in &properties {
        let Some(value) = params_obj.get(prop_name) else {
            if let Some(default) = prop_schema.get("default") {
                result.insert(prop_name.clone(), default.clone());
            }
            continue;
        };

        if let Some(expected) = prop_schema.get("type").and_then(|t| t.as_str()) {
            let type_ok = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !type_ok {
                bail!(
                    "parameter '{}' must be of type '{}', got {}",
                    prop_name,
                    expected,
                    json_type_name(value)
                );
            }
        }

        if let Some(allowed) = prop_schema.get("enum").and_then(|e| e.as_array()) {
            if !allowed.contains(value) {
                bail!("parameter '{}' must be one of {:?}", prop_name, allowed);
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c7_resolver_core::models::LibraryRecord;
    use c7_resolver_core::resolver::ResolveError;
    use c7_resolver_core::store::memory::InMemoryStore;

    fn lib(name: &str, canonical_id: &str, language: &str, ecosystem: &str, pop: u8) -> LibraryRecord {
        LibraryRecord {
            id: format!("lib-{}", canonical_id.trim_start_matches('/').replace('/', "-")),
            name: name.into(),
            canonical_id: canonical_id.into(),
            aliases: vec![],
            language: language.into(),
            ecosystem: ecosystem.into(),
            keywords: vec![],
            description: String::new(),
            popularity_score: pop,
            status: LibraryStatus::Active,
        }
    }

    fn context() -> ToolContext {
        let store = InMemoryStore::with_records(vec![
            lib("requests", "/pypi/requests", "Python", "PyPI", 95),
            lib("requests", "/npm/requests", "JavaScript", "npm", 10),
        ]);
        ToolContext::new(LibraryResolver::with_defaults(Arc::new(store)))
    }

    async fn call(tool: &dyn Tool, params: Value) -> Result<Value> {
        let params = validate_params(&tool.parameters_schema(), &params)?;
        tool.execute(params, &context()).await
    }

    #[test]
    fn test_validate_params_required_and_defaults() {
        let schema = ResolveLibraryTool.parameters_schema();

        let err = validate_params(&schema, &json!({})).unwrap_err();
        assert!(err.to_string().contains("missing required parameter: library_name"));

        let filled = validate_params(&schema, &json!({ "library_name": "x" })).unwrap();
        assert_eq!(filled["query"], "");
        assert_eq!(filled["explain"], false);

        let err = validate_params(&schema, &json!({ "library_name": 3 })).unwrap_err();
        assert!(err.to_string().contains("must be of type 'string', got number"));

        assert!(validate_params(&schema, &json!(["x"])).is_err());
    }

    #[test]
    fn test_validate_params_enum() {
        let schema = ListLibrariesTool.parameters_schema();
        assert!(validate_params(&schema, &json!({ "status": "deprecated" })).is_ok());
        assert!(validate_params(&schema, &json!({ "status": "gone" })).is_err());
    }

    #[test]
    fn test_registry_builtins_and_duplicates() {
        let mut registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        registry.register(Box::new(GetLibraryTool));
        assert_eq!(registry.len(), 3);
        assert!(registry.tools().iter().all(|t| t.is_builtin()));
        assert!(registry.find("nope").is_none());
    }

    #[tokio::test]
    async fn test_resolve_tool_uses_query() {
        let out = call(
            &ResolveLibraryTool,
            json!({ "library_name": "requests", "query": "npm install requests" }),
        )
        .await
        .unwrap();
        assert_eq!(out, json!({ "canonical_id": "/npm/requests" }));
    }

    #[tokio::test]
    async fn test_resolve_tool_explain() {
        let out = call(
            &ResolveLibraryTool,
            json!({ "library_name": "requests", "query": "", "explain": true }),
        )
        .await
        .unwrap();
        assert_eq!(out["canonical_id"], "/pypi/requests");
        assert_eq!(out["tier"], "exact");
        assert_eq!(out["candidates"].as_array().unwrap().len(), 2);
        assert_eq!(out["candidates"][0]["score"]["popularity"], 4.75);
    }

    #[tokio::test]
    async fn test_resolve_tool_propagates_typed_errors() {
        let err = call(&ResolveLibraryTool, json!({ "library_name": "flask" }))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::NotFound { library_name }) if library_name == "flask"
        ));

        let err = call(&ResolveLibraryTool, json!({ "library_name": "  " }))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_get_library_tool() {
        let out = call(&GetLibraryTool, json!({ "canonical_id": "/npm/requests" }))
            .await
            .unwrap();
        assert_eq!(out["language"], "JavaScript");

        let err = call(&GetLibraryTool, json!({ "canonical_id": "/npm/none" }))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<ToolError>(), Some(ToolError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_libraries_tool_filters() {
        let out = call(&ListLibrariesTool, json!({})).await.unwrap();
        assert_eq!(out["libraries"].as_array().unwrap().len(), 2);

        let out = call(&ListLibrariesTool, json!({ "ecosystem": "pypi" }))
            .await
            .unwrap();
        let libs = out["libraries"].as_array().unwrap();
        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0]["canonical_id"], "/pypi/requests");
    }
}
