use std::{fs::OpenOptions, path::Path, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{Method, header},
    middleware,
};
use axum_server::Handle;
use clap::{CommandFactory, Parser, error::ErrorKind};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, AuthConfig, ServerConfig, Stores, build_router, graceful_shutdown,
    logging_middleware,
};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    if let Err(error) = config.validate() {
        ServerConfig::command()
            .error(ErrorKind::ValueValidation, error)
            .exit();
    }

    setup_logging(&config.log_path);

    let stores = Stores::connect(config.db_path.as_deref());
    let auth_config =
        AuthConfig::for_store(&config.jwt_secret, config.token_duration(), stores.kind);
    let state = AppState::new(auth_config, stores);

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_cors_layer(router, &config);
    let router = add_tracing_layer(router);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = config.socket_addr();
    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped with an error: {error}");
        std::process::exit(1);
    }
}

fn setup_logging(log_path: &Path) {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(filter::LevelFilter::INFO);

    let debug_log = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(log_file) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file))
                .with_filter(filter::LevelFilter::DEBUG),
        ),
        Err(error) => {
            eprintln!("Could not open log file {}: {error}", log_path.display());
            None
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_cors_layer(router: Router, config: &ServerConfig) -> Router {
    let origins = match config.cors_origins() {
        Ok(origins) if !origins.is_empty() => AllowOrigin::list(origins),
        _ => AllowOrigin::from(Any),
    };

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    router.layer(cors)
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
