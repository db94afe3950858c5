use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::Config;
use crate::downloader::{self, ExportFormat};
use crate::error::Error;
use crate::inventory::Inventory;
use crate::item::DraftPatch;
use crate::login::LoginRequest;
use crate::saving::FileStorage;

pub struct AppState {
    inventory: Mutex<Inventory>,
}

impl AppState {
    pub fn new(inventory: Inventory) -> Self {
        AppState {
            inventory: Mutex::new(inventory),
        }
    }

    /// Each handler runs its whole read-modify-write under this lock. State is
    /// only committed after the slot write, so a poisoned lock is still usable.
    fn inventory(&self) -> MutexGuard<'_, Inventory> {
        self.inventory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    term: String,
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if matches!(self, Error::UploadTooLarge) {
            StatusCode::PAYLOAD_TOO_LARGE
        } else if self.is_user_error() {
            StatusCode::BAD_REQUEST
        } else {
            log::error!("request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, Error>;

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(serve_page))
        .route("/api/state", get(get_state))
        .route("/api/search", put(set_search))
        .route("/api/draft", put(update_draft))
        .route("/api/draft/image", post(upload_image))
        .route("/api/submit", post(submit))
        .route("/api/cancel", post(cancel_edit))
        .route("/api/items/:id/edit", post(start_edit))
        .route("/api/items/:id", delete(remove_item))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/login/open", post(open_login))
        .route("/api/login/close", post(close_login))
        .route("/api/export", get(export))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = FileStorage::open(&config.data_dir)?;
    log::info!("data directory {}", storage.dir().display());

    let inventory = Inventory::open(storage)?;
    let app_state = Arc::new(AppState::new(inventory));
    let app = router(app_state, config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

fn snapshot(inventory: &Inventory) -> Response {
    Json(inventory.snapshot()).into_response()
}

async fn serve_page() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn get_state(State(state): State<Arc<AppState>>) -> Response {
    snapshot(&state.inventory())
}

async fn set_search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Response {
    let mut inventory = state.inventory();
    inventory.set_search(payload.term);
    snapshot(&inventory)
}

async fn update_draft(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<DraftPatch>,
) -> Response {
    let mut inventory = state.inventory();
    inventory.update_draft(patch);
    snapshot(&inventory)
}

async fn upload_image(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> ApiResult {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(upload_error)?;
        upload = Some((bytes, content_type));
    }

    let mut inventory = state.inventory();
    if let Some((bytes, content_type)) = upload {
        inventory.attach_image(&bytes, content_type.as_deref())?;
    }
    Ok(snapshot(&inventory))
}

/// Bodies without a `Content-Length` hit the limit mid-stream, surfacing here.
fn upload_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::UploadTooLarge
    } else {
        Error::Upload(e.body_text())
    }
}

async fn submit(State(state): State<Arc<AppState>>) -> ApiResult {
    let mut inventory = state.inventory();
    inventory.submit()?;
    Ok(snapshot(&inventory))
}

async fn cancel_edit(State(state): State<Arc<AppState>>) -> Response {
    let mut inventory = state.inventory();
    inventory.cancel_edit();
    snapshot(&inventory)
}

async fn start_edit(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> ApiResult {
    let mut inventory = state.inventory();
    inventory.start_edit(&id)?;
    Ok(snapshot(&inventory))
}

async fn remove_item(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> ApiResult {
    let mut inventory = state.inventory();
    if !inventory.remove_item(&id)? {
        log::debug!("delete of unknown item {} ignored", id);
    }
    Ok(snapshot(&inventory))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<LoginRequest>,
) -> ApiResult {
    let mut inventory = state.inventory();
    inventory.login(&credentials.name, &credentials.email)?;
    Ok(snapshot(&inventory))
}

async fn logout(State(state): State<Arc<AppState>>) -> ApiResult {
    let mut inventory = state.inventory();
    inventory.logout()?;
    Ok(snapshot(&inventory))
}

async fn open_login(State(state): State<Arc<AppState>>) -> Response {
    let mut inventory = state.inventory();
    inventory.open_login_panel();
    snapshot(&inventory)
}

async fn close_login(State(state): State<Arc<AppState>>) -> Response {
    let mut inventory = state.inventory();
    inventory.close_login_panel();
    snapshot(&inventory)
}

async fn export(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportQuery>,
) -> ApiResult {
    let table = state.inventory().export_table();

    let body = downloader::render(&table, params.format)?;
    let filename = downloader::export_filename(params.format);
    log::info!("exported {} rows to {}", table.len() - 1, filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, params.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
