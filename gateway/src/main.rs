use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use mimalloc::MiMalloc;
use std::fmt::Display;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

use mutawwif_internal::auth::require_pro_subscriber;
use mutawwif_internal::config::Config;
use mutawwif_internal::endpoints;
use mutawwif_internal::gateway_util;
use mutawwif_internal::observability::{self, LogFormat};
use mutawwif_internal::rate_limit::middleware::basic_rate_limit_middleware;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Sets the log format used for all gateway logs.
    #[arg(long)]
    #[arg(value_enum)]
    #[clap(default_value_t = LogFormat::default())]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    // Set up logs immediately, so that we can use `tracing`.
    observability::setup_observability(args.log_format).expect_pretty("Failed to set up logs");

    tracing::info!("Starting {}", endpoints::status::SERVICE_NAME);

    let config = Arc::new(
        Config::load_and_verify_from_env()
            .ok() // Don't print the error here, since it was already printed when it was constructed
            .expect_pretty("Failed to load config"),
    );

    // Initialize AppState
    let app_state = gateway_util::AppStateData::new(config.clone())
        .await
        .expect_pretty("Failed to initialize AppState");

    // Free-tier routes, gated by the per-client daily usage limit
    let basic_routes = Router::new()
        .route(
            "/api/mutawwif/basic",
            post(endpoints::chat::basic_chat_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            app_state.usage_limiter.clone(),
            basic_rate_limit_middleware,
        ));

    // Pro routes, gated by token verification and entitlement checks
    let pro_routes = Router::new()
        .route("/api/mutawwif/pro", post(endpoints::chat::pro_chat_handler))
        .layer(axum::middleware::from_fn_with_state(
            app_state.auth.clone(),
            require_pro_subscriber,
        ));

    // Routes that don't require authentication
    let public_routes = Router::new()
        .route("/", get(endpoints::status::status_handler))
        .route(
            "/api/languages",
            get(endpoints::status::list_languages_handler),
        )
        .route(
            "/api/mutawwif/translate",
            post(endpoints::translate::translate_handler),
        )
        .route(
            "/api/mutawwif/guide/{key}",
            get(endpoints::guide::guide_handler),
        )
        .route(
            "/api/admin/issue-pro-token",
            post(endpoints::admin::issue_pro_token_handler),
        );

    let router = Router::new()
        .merge(basic_routes)
        .merge(pro_routes)
        .merge(public_routes)
        .fallback(endpoints::fallback::handle_404)
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        // We log failed requests at 'DEBUG', since we already have our own error-logging code
        .layer(TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::DEBUG)))
        .with_state(app_state);

    let bind_address = config.bind_address;
    let listener = match tokio::net::TcpListener::bind(bind_address).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            tracing::error!(
                "Failed to bind to socket address {bind_address}: {e}. Tip: Ensure no other process is using port {} or try a different port.",
                bind_address.port()
            );
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Failed to bind to socket address {bind_address}: {e}");
            std::process::exit(1);
        }
    };
    // This will give us the chosen port if the user specified a port of 0
    let actual_bind_address = listener
        .local_addr()
        .expect_pretty("Failed to get bind address from listener");

    tracing::info!(
        "{} is listening on {actual_bind_address}.",
        endpoints::status::SERVICE_NAME
    );

    // `ConnectInfo` is how the usage limiter identifies clients without an
    // x-forwarded-for header
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect_pretty("Failed to start server");
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect_pretty("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect_pretty("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        }
    };
}

/// ┌──────────────────────────────────────────────────────────────────────────┐
/// │                           MAIN.RS ESCAPE HATCH                           │
/// └──────────────────────────────────────────────────────────────────────────┘
///
/// We don't allow panic, escape, unwrap, or similar methods in the codebase,
/// except for the private `expect_pretty` method, which is to be used only in
/// main.rs during initialization. After initialization, we expect all code to
/// handle errors gracefully.
///
/// We use `expect_pretty` for better DX when handling errors in main.rs.
/// `expect_pretty` will print an error message and exit with a status code of 1.
trait ExpectPretty<T> {
    fn expect_pretty(self, msg: &str) -> T;
}

impl<T, E: Display> ExpectPretty<T> for Result<T, E> {
    fn expect_pretty(self, msg: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("{msg}: {err}");
                std::process::exit(1);
            }
        }
    }
}

impl<T> ExpectPretty<T> for Option<T> {
    fn expect_pretty(self, msg: &str) -> T {
        match self {
            Some(value) => value,
            None => {
                tracing::error!("{msg}");
                std::process::exit(1);
            }
        }
    }
}
