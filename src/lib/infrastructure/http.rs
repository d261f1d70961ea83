//! HTTP Server

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use axum_server::Handle;
use clap::{Parser, ValueEnum};
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};
use tracing::{debug, info, info_span};

use crate::domain::communication::emails::EmailService;

use handlers::{docs, root, v1};
use state::{AppConfig, AppState};

mod errors;
mod handlers;
mod open_api;
pub mod state;
mod validation;

/// Largest accepted request body; attachments travel inline.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Origins allowed to call the API from a browser in development
const DEVELOPMENT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
];

/// Whether the service runs for local development or in production
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Error details are returned to callers and browser origins on localhost are allowed
    #[default]
    Development,

    /// Error details are only logged
    Production,
}

impl RunMode {
    /// Whether internal error details may be returned to callers
    pub fn exposes_error_details(self) -> bool {
        self == RunMode::Development
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
pub struct HttpServerConfig {
    /// The port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// The API version segment in `/api/{version}/email`
    #[arg(long, env = "API_VERSION", default_value = "v1")]
    pub api_version: String,

    /// The runtime mode
    #[arg(long = "app-env", env = "APP_ENV", value_enum, default_value = "development")]
    pub mode: RunMode,
}

/// The application's HTTP server
#[derive(Debug)]
pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(email_service: impl EmailService, config: HttpServerConfig) -> Result<Self> {
        let state = AppState::new(
            AppConfig {
                api_version: config.api_version.clone(),
                mode: config.mode,
            },
            email_service,
        );

        let router = router(state);

        let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
        let listener = TcpListener::bind(address)
            .with_context(|| format!("failed to listen on {}", config.port))?;

        listener
            .set_nonblocking(true)
            .context("failed to make listener non-blocking")?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server until a shutdown signal arrives.
    #[mutants::skip]
    pub async fn run(self) -> Result<()> {
        info!(
            "HTTP server listening on {}",
            self.listener
                .local_addr()
                .context("failed to get local address")?
        );

        let handle = Handle::new();

        let server = axum_server::from_tcp(self.listener)
            .handle(handle.clone())
            .serve(self.router.into_make_service());

        tokio::select! {
            result = server => result.context("server error")?,
            _ = shutdown_signal(Some(handle)) => {
                info!("Shutting down HTTP server");
            }
        }

        Ok(())
    }
}

/// Create the application's router
pub fn router<E: EmailService>(state: AppState<E>) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        let uri = request.uri().to_string();
        info_span!("http_request", method = ?request.method(), uri)
    });

    let email_base = format!("/api/{}/email", state.config.api_version);
    let cors = cors_layer(state.config.mode);

    Router::new()
        .route("/", get(root::service_info::<E>))
        .route("/api", get(root::api_info::<E>))
        .route("/api-docs", get(docs::stoplight))
        .route("/api-docs/openapi.json", get(docs::openapi))
        .nest(&email_base, v1::router::<E>())
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(handlers::panic_handler))
        .layer(trace_layer)
        .with_state(state)
}

fn cors_layer(mode: RunMode) -> CorsLayer {
    match mode {
        RunMode::Development => CorsLayer::new()
            .allow_origin(DEVELOPMENT_ORIGINS.map(HeaderValue::from_static))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        RunMode::Production => CorsLayer::new(),
    }
}

#[mutants::skip]
async fn shutdown_signal(handle: Option<Handle>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if let Some(handle) = handle {
        debug!("shutting down gracefully");
        handle.graceful_shutdown(Some(Duration::from_secs(10)));
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use clap::Parser;
    use serde_json::Value;
    use testresult::TestResult;

    use super::{router, state::test_state, HttpServerConfig, RunMode};

    #[test]
    fn test_config_from_arguments() -> TestResult {
        let config = HttpServerConfig::try_parse_from([
            "server",
            "--port",
            "8080",
            "--api-version",
            "v2",
            "--app-env",
            "production",
        ])?;

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.mode, RunMode::Production);
        assert!(!config.mode.exposes_error_details());

        Ok(())
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        let result = HttpServerConfig::try_parse_from(["server", "--app-env", "staging"]);

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404_envelope() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .get("/nope?x=1")
            .await;

        let json = response.json::<Value>();

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Endpoint not found");
        assert_eq!(json["path"], "/nope?x=1");
        assert_eq!(json["method"], "GET");

        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_method_returns_404_envelope() -> TestResult {
        let server = TestServer::new(router(test_state(None)))?;

        let cases = [
            (server.get("/api/v1/email/send").await, "GET", "/api/v1/email/send"),
            (server.delete("/api/v1/email/send").await, "DELETE", "/api/v1/email/send"),
            (server.post("/api/v1/email/test").await, "POST", "/api/v1/email/test"),
            (server.put("/api/v1/email/health").await, "PUT", "/api/v1/email/health"),
        ];

        for (response, method, path) in cases {
            let json = response.json::<Value>();

            assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{method} {path}");
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "Endpoint not found");
            assert_eq!(json["path"], path);
            assert_eq!(json["method"], method);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_api_version_changes_base_path() -> TestResult {
        let mut state = test_state(None);
        state.config.api_version = "v2".to_string();

        let server = TestServer::new(router(state))?;

        server.get("/api/v2/email/health").await.assert_status_ok();
        server
            .get("/api/v1/email/health")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        Ok(())
    }
}
