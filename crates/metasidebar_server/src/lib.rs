//! HTTP server wiring for the metadata service (API, handlers, and shared state).

/// Embedded server helper for tests and local tooling.
pub mod embedded;
/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for file and metadata endpoints.
pub mod handlers;

pub use embedded::EmbeddedServer;
pub use error::{HttpError, ServerError};
pub use metasidebar_core::{config, memory, models, ApiError, Config, MemoryMetadataApi, DEFAULT_PORT};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer}, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Largest accepted request body (patch lists are small).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: MemoryMetadataApi,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `api`: Metadata service answering the routes.
    pub fn new(config: Config, api: MemoryMetadataApi) -> Self {
        Self {
            api,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let requested = std::env::var("BIND").ok();
    bind_address_from(requested.as_deref(), config.port, allow_public_access)
}

fn bind_address_from(requested: Option<&str>, port: u16, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], port));
    let requested = match requested {
        Some(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn cors_layer(allow_public_access: bool, cors_port: u16) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PATCH, Method::DELETE];
    if allow_public_access {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any);
    }
    let origins: Vec<HeaderValue> = [
        format!("http://localhost:{}", cors_port),
        format!("http://127.0.0.1:{}", cors_port),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::CACHE_CONTROL])
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    use handlers::{file, metadata};

    Router::new()
        .route("/api/templates", get(file::list_templates))
        .route("/api/files/:file_id", get(file::get_file))
        .route(
            "/api/files/:file_id/metadata",
            get(metadata::list_metadata).post(metadata::create_metadata),
        )
        .route(
            "/api/files/:file_id/metadata/:scope/:template_key",
            axum::routing::patch(metadata::update_metadata).delete(metadata::delete_metadata),
        )
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer(allow_public_access, cors_port))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::{bind_address_from, listener_cors_port};
    use metasidebar_core::DEFAULT_PORT;
    use std::net::SocketAddr;

    #[tokio::test]
    async fn listener_cors_port_uses_bound_listener_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");
        let expected = listener.local_addr().expect("listener addr").port();
        assert_eq!(listener_cors_port(&listener, DEFAULT_PORT), expected);
    }

    #[test]
    fn bind_address_enforces_loopback_when_public_access_disabled() {
        let forced = bind_address_from(Some("0.0.0.0:4040"), 4040, false);
        assert_eq!(forced, SocketAddr::from(([127, 0, 0, 1], 4040)));

        let public = bind_address_from(Some("0.0.0.0:4040"), 4040, true);
        assert_eq!(public.ip().to_string(), "0.0.0.0");
    }

    #[test]
    fn bind_address_defaults_and_falls_back_on_invalid_values() {
        assert_eq!(
            bind_address_from(None, 4041, false),
            SocketAddr::from(([127, 0, 0, 1], 4041))
        );
        assert_eq!(
            bind_address_from(Some("bad:host"), 4041, false),
            SocketAddr::from(([127, 0, 0, 1], 4041))
        );
    }
}
