//! Purpose: Provide the HTTP/JSON server for flashcard sets and the browser entry page.
//! Exports: `ServeConfig`, `serve`, `validate_config`, `DEFAULT_MAX_BODY_BYTES`.
//! Role: Axum router over a single `FlashcardService`; owns store open/close around the listener.
//! Invariants: Error bodies are `{"error": <message>}`; fault details never reach callers.
//! Invariants: Set bodies may be JSON or urlencoded form posts; both validate identically.
//! Invariants: The store is opened before binding and closed after the server drains.
//! Invariants: Shutdown on SIGINT/SIGTERM is graceful and bounded.

use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Path as AxumPath, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use std::error::Error as StdError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flashdeck::api::{
    Error, ErrorKind, FlashcardService, LIST_FAILED, ListParams, ListQuery, SetId, form_fields,
    id_json, page_json, set_json,
};
use flashdeck::store::{SetStore, StoreBackend, StoreConfig};
use flashdeck::ui::{API_BASE, INDEX_HTML};

pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub max_body_bytes: u64,
}

struct AppState {
    service: FlashcardService,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;

    let store = SetStore::open(&config.store).await?;
    info!(backend = store.backend().as_str(), "store ready");
    let service = FlashcardService::new(store);

    let outcome = run_server(config.bind, service.clone(), max_body_bytes).await;

    info!("closing store");
    service.into_store().close().await;
    outcome
}

async fn run_server(
    bind: SocketAddr,
    service: FlashcardService,
    max_body_bytes: usize,
) -> Result<(), Error> {
    let app = router(Arc::new(AppState { service }), max_body_bytes);

    let listener = tokio::net::TcpListener::bind(bind).await.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to bind server")
            .with_source(err)
    })?;
    info!(%bind, "listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            info!("shutdown requested");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route(API_BASE, get(list_sets).post(create_set))
        .route(
            &format!("{API_BASE}/:id"),
            get(get_set).patch(update_set).delete(delete_set),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn validate_config(config: &ServeConfig) -> Result<StoreBackend, Error> {
    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }

    if config.max_body_bytes > usize::MAX as u64 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory."));
    }

    config.store.validate()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

/// A set body from either `application/json` or `application/x-www-form-urlencoded`.
struct SetBody(Value);

#[axum::async_trait]
impl<S> FromRequest<S> for SetBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form_post(&req) {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| body_rejection(rejection.status(), rejection))?;
            return Ok(SetBody(form_fields(pairs)));
        }
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| body_rejection(rejection.status(), rejection))?;
        Ok(SetBody(body))
    }
}

fn is_form_post(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

async fn create_set(
    State(state): State<Arc<AppState>>,
    payload: Result<SetBody, Response>,
) -> Response {
    let body = match payload {
        Ok(SetBody(body)) => body,
        Err(rejection) => return rejection,
    };
    match state.service.create(&body).await {
        Ok(id) => (StatusCode::CREATED, Json(id_json(id))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_sets(
    State(state): State<Arc<AppState>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let params = pairs
        .map(|Query(pairs)| ListParams::from_pairs(pairs))
        .unwrap_or_default();
    let query = ListQuery::from_params(&params);
    let rendered = state.service.list(&query).await.and_then(|page| {
        page_json(&page).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message(LIST_FAILED)
                .with_source(err)
        })
    });
    match rendered {
        Ok(body) => Json(body).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_set(State(state): State<Arc<AppState>>, AxumPath(id): AxumPath<String>) -> Response {
    match state.service.get(&id).await {
        Ok(set) => Json(set_json(&set)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_set(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
    payload: Result<SetBody, Response>,
) -> Response {
    let body = match payload {
        Ok(SetBody(body)) => body,
        // An unusable body must not mask a malformed id.
        Err(rejection) => match SetId::parse(&id) {
            Ok(_) => return rejection,
            Err(err) => return error_response(err),
        },
    };
    match state.service.update(&id, &body).await {
        Ok(id) => Json(id_json(id)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_set(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    match state.service.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn body_rejection(status: StatusCode, source: impl StdError + Send + Sync + 'static) -> Response {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return error_body(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
    }
    error_response(
        Error::new(ErrorKind::Validation)
            .with_message("request body must be JSON or form data")
            .with_source(source),
    )
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidId | ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal | ErrorKind::Store | ErrorKind::Io => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: Error) -> Response {
    let status = status_for(err.kind());
    let message = match err.message() {
        Some(message) => message,
        None if err.kind().is_fault() => "internal error",
        None => "bad request",
    };
    error_body(status, message)
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
