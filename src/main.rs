mod cache;
mod config;
mod constants;
mod error;
mod filters;
mod gravatar;
mod html;
mod models;
mod params;
mod probe;

use std::{env, sync::Arc};

use axum::{
    Json, Router,
    body::Body,
    extract::{RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use cache::MemoryStore;
use config::GravatarConfig;
use constants::{DEFAULT_PORT, STALE_WHILE_REVALIDATE, URL_CACHE_MAX_CAPACITY};
use error::ServiceError;
use filters::{FilterRegistry, TAG_FILTER, URL_FILTER};
use gravatar::GravatarService;
use params::ParsedParams;
use probe::GravatarProbe;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    filters: Arc<FilterRegistry>,
    probe: GravatarProbe,
    max_age: u64,
}

#[derive(Debug, Serialize)]
struct ExistsResponse {
    email_hash: String,
    exists: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gravatar_rs=info,tower_http=info".into()),
        )
        .compact()
        .init();

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let config = GravatarConfig::from_env().inspect_err(|err| {
        error!("refusing to start: {err}");
    })?;
    let store = Arc::new(MemoryStore::new(URL_CACHE_MAX_CAPACITY));
    let service = Arc::new(GravatarService::new(config, store));
    let config = service.config();
    info!(
        "gravatar config size={} expiration={}s default_image={}",
        config.size(),
        config.expiration().as_secs(),
        config.default_image().value().unwrap_or("none")
    );

    let probe = GravatarProbe::new(config.expiration())?;
    let max_age = config.expiration().as_secs();

    let mut filters = FilterRegistry::new();
    filters::install(&mut filters, service);
    info!("installed template filters: {}", filters.names().join(", "));

    let state = AppState {
        filters: Arc::new(filters),
        probe,
        max_age,
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port)).await?;
    info!("listening on 0.0.0.0:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/url", get(url_handler))
        .route("/tag", get(tag_handler))
        .route("/avatar", get(avatar_handler))
        .route("/exists", get(exists_handler))
        .route("/healthz", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn url_handler(State(state): State<AppState>, RawQuery(raw_query): RawQuery) -> Response {
    match apply_filter(&state, URL_FILTER, raw_query.as_deref()) {
        Ok(url) => text_response(url, "text/plain; charset=utf-8", state.max_age),
        Err(err) => error_response(err),
    }
}

async fn tag_handler(State(state): State<AppState>, RawQuery(raw_query): RawQuery) -> Response {
    match apply_filter(&state, TAG_FILTER, raw_query.as_deref()) {
        Ok(tag) => text_response(tag, "text/html; charset=utf-8", state.max_age),
        Err(err) => error_response(err),
    }
}

async fn avatar_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    match apply_filter(&state, URL_FILTER, raw_query.as_deref()) {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(err) => error_response(err),
    }
}

async fn exists_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    let request = match ParsedParams::from_raw(raw_query.as_deref()).to_request() {
        Ok(request) => request,
        Err(err) => return error_response(err),
    };

    let email_hash = match gravatar::email_hash(&request.email) {
        Ok(hash) => hash,
        Err(err) => return error_response(err),
    };

    match state.probe.exists(&request.email).await {
        Ok(exists) => Json(ExistsResponse { email_hash, exists }).into_response(),
        Err(err) => {
            error!("gravatar probe error for hash='{email_hash}': {err}");
            error_response(err)
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    "ok"
}

fn apply_filter(
    state: &AppState,
    filter: &str,
    raw_query: Option<&str>,
) -> Result<String, ServiceError> {
    let request = ParsedParams::from_raw(raw_query).to_request()?;
    state.filters.apply(filter, &request)
}

/// URLs stay valid for as long as the URL cache keeps them.
fn cache_control_header(max_age: u64) -> String {
    format!(
        "public, max-age={max_age}, s-maxage={max_age}, stale-while-revalidate={STALE_WHILE_REVALIDATE}"
    )
}

fn text_response(body: String, content_type: &'static str, max_age: u64) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::OK;

    let cache_control = cache_control_header(max_age);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    response
}

fn error_response(error: ServiceError) -> Response {
    let body = html::error_page(&error);
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_REQUEST);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
