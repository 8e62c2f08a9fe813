//! HTTP tool server.
//!
//! Exposes the resolver and catalog lookups as JSON tools. All tools,
//! built-in and custom, live in one [`ToolRegistry`] and are dispatched
//! through the same `POST /tools/{name}` handler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "...", "library_name": "flask" } }
//! ```
//!
//! | Code | Status | Raised by |
//! |------|--------|-----------|
//! | `bad_request` | 400 | parameter validation, empty library name |
//! | `not_found` | 404 | unknown tool, unresolvable library, unknown canonical id |
//! | `store_error` | 500 | catalog store failure during resolution |
//! | `tool_error` | 500 | any other tool failure |
//!
//! `library_name` is present only on resolution misses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use c7_resolver_core::resolver::{LibraryResolver, ResolveError};

use crate::config::Config;
use crate::seed::seed_catalog;
use crate::sqlite_store::SqliteStore;
use crate::traits::{validate_params, ToolContext, ToolError, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Built-in and custom tools, looked up by name on every call.
    tools: Arc<ToolRegistry>,
    /// Resolver and store handles handed to each tool invocation.
    ctx: ToolContext,
}

/// Start the server with the built-in tools only.
///
/// Opens the SQLite catalog at `[db].path`, seeds it from
/// `[catalog].seed_path` when set, and serves on `[server].bind` until the
/// process is terminated.
///
/// # Arguments
///
/// - `config`: database path, resolver tuning, seed file, and bind address.
///
/// # Returns
///
/// `Ok(())` when the server shuts down, or an error if opening the database,
/// seeding, or binding fails.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extensions(config, ToolRegistry::new()).await
}

/// Like [`run_server`], but also serves the tools in `extra_tools`.
///
/// Extra tools whose names collide with a built-in are ignored. They appear
/// in `GET /tools/list` after the built-ins and are called through the same
/// `POST /tools/{name}` route.
///
/// # Arguments
///
/// - `config`: as for [`run_server`].
/// - `extra_tools`: custom tools to serve alongside the built-ins.
///
/// ```rust,no_run
/// use c7_resolver::server::run_server_with_extensions;
/// use c7_resolver::traits::ToolRegistry;
///
/// # async fn example(config: &c7_resolver::config::Config) -> anyhow::Result<()> {
/// let mut tools = ToolRegistry::new();
/// // tools.register(Box::new(MyTool));
/// run_server_with_extensions(config, tools).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_extensions(
    config: &Config,
    extra_tools: ToolRegistry,
) -> anyhow::Result<()> {
    let store = SqliteStore::open(config).await?;
    if let Some(ref seed_path) = config.catalog.seed_path {
        seed_catalog(&store, seed_path).await?;
    }

    let resolver = LibraryResolver::new(Arc::new(store), config.resolver_params());

    let mut registry = ToolRegistry::with_builtins();
    registry.extend(extra_tools);
    for t in registry.tools() {
        debug!(tool = t.name(), builtin = t.is_builtin(), "registered tool");
    }

    let app = router(resolver, registry);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "tool server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the axum router serving `tools` against `resolver`.
///
/// Exposed so callers can mount the API under their own listener or nest it
/// in a larger router.
pub fn router(resolver: LibraryResolver, tools: ToolRegistry) -> Router {
    let state = AppState {
        tools: Arc::new(tools),
        ctx: ToolContext::new(resolver),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message, prefixed with the tool name.
    message: String,
    /// The requested library name, on resolution misses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    library_name: Option<String>,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    library_name: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                library_name: self.library_name,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
        library_name: None,
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn not_found(message: impl Into<String>) -> AppError {
    app_error(StatusCode::NOT_FOUND, "not_found", message)
}

fn tool_error(message: impl Into<String>) -> AppError {
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "tool_error", message)
}

/// Map a tool failure to a status code by downcasting to the known typed
/// errors. Anything untyped is a 500.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let message = format!("{}: {}", tool_name, err);

    if let Some(e) = err.downcast_ref::<ResolveError>() {
        let (status, library_name) = match e {
            ResolveError::InvalidInput(_) => (StatusCode::BAD_REQUEST, None),
            ResolveError::NotFound { library_name } => {
                (StatusCode::NOT_FOUND, Some(library_name.clone()))
            }
            ResolveError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        return AppError {
            library_name,
            ..app_error(status, e.code(), message)
        };
    }

    match err.downcast_ref::<ToolError>() {
        Some(ToolError::InvalidParams(_)) => bad_request(message),
        Some(ToolError::NotFound(_)) => not_found(message),
        None => tool_error(message),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo::from_tool(t.as_ref()))
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Look up the tool, validate parameters against its schema, execute it.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    let result = tool
        .execute(params, &state.ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_resolve_errors() {
        let e = classify_tool_error(
            "resolve-library-id",
            ResolveError::NotFound {
                library_name: "flask".into(),
            }
            .into(),
        );
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.code, "not_found");
        assert_eq!(e.library_name.as_deref(), Some("flask"));

        let e = classify_tool_error(
            "resolve-library-id",
            ResolveError::InvalidInput("library_name must not be empty".into()).into(),
        );
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "bad_request");
        assert!(e.library_name.is_none());

        let e = classify_tool_error(
            "resolve-library-id",
            ResolveError::Store(anyhow::anyhow!("disk gone")).into(),
        );
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "store_error");
        assert!(e.message.contains("disk gone"));
    }

    #[test]
    fn test_classify_tool_errors() {
        let e = classify_tool_error("get-library", ToolError::NotFound("library /x/y".into()).into());
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e = classify_tool_error("custom", anyhow::anyhow!("library not found"));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "tool_error");
    }
}
