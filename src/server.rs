//! HTTP surface: public site endpoints plus the bearer-gated admin API.
//!
//! The public side serves translations and published content and accepts
//! intake submissions. The admin side drives the content repository and the
//! intake inbox; every admin route requires either the configured service
//! key or a session token the auth backend vouches for.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::AuthClient;
use crate::config::Config;
use crate::content::ContentRepository;
use crate::error::{AppError, AppResult};
use crate::i18n::{Language, Translations};
use crate::intake::{status_counts, AppointmentStatus, Intake, NewAppointment};
use crate::security::constant_time_compare;
use crate::store::StoreClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Arc<RwLock<ContentRepository>>,
    pub intake: Intake,
    pub auth: AuthClient,
    pub translations: Arc<Translations>,
    /// Raised while a content mutation (including its trailing refetch) is
    /// in flight. Lives outside the repository lock so the overview
    /// endpoint can observe it; mutation serialization itself comes from
    /// the write lock.
    saving: Arc<AtomicBool>,
}

/// Raises the saving flag for the guard's lifetime.
struct SavingGuard(Arc<AtomicBool>);

impl SavingGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = StoreClient::new(&config.store_url, &config.store_api_key);
        let auth = AuthClient::new(&config.auth_url, &config.store_api_key);
        let default_language =
            Language::from_code(&config.default_language).unwrap_or_default();
        let translations = Translations::load(default_language)?;

        Ok(Self {
            repo: Arc::new(RwLock::new(ContentRepository::new(store.clone()))),
            intake: Intake::new(store),
            auth,
            translations: Arc::new(translations),
            config: Arc::new(config),
            saving: Arc::new(AtomicBool::new(false)),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Public site
        .route("/api/languages", get(list_languages))
        .route("/api/translations/:lang", get(get_dictionary))
        .route("/api/translations/:lang/:key", get(translate_key))
        .route("/api/sections", get(list_sections))
        .route("/api/content", get(get_content))
        .route("/api/messages", post(submit_message))
        .route("/api/appointments", post(submit_appointment))
        // Sessions
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/logout", post(logout))
        // Admin: content management
        .route("/api/admin/content", get(admin_content_overview))
        .route("/api/admin/content/refresh", post(refresh_content))
        .route("/api/admin/content/value", put(set_content_value))
        .route("/api/admin/content/save", post(save_entry))
        .route(
            "/api/admin/content/entries",
            post(add_entry).delete(delete_entry),
        )
        .route("/api/admin/content/rename", post(rename_key))
        .route("/api/admin/content/sections", post(add_section))
        .route("/api/admin/content/sections/:name/save", post(bulk_save))
        // Admin: intake inbox
        .route("/api/admin/messages", get(list_messages))
        .route("/api/admin/appointments", get(list_appointments))
        .route(
            "/api/admin/appointments/:id",
            axum::routing::patch(set_appointment_status),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the state, warm the content cache and serve until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let port = config.port;
    let state = AppState::from_config(config)?;

    // Best effort: the site can come up with an empty cache and recover on
    // the next refresh.
    if let Err(e) = state.repo.write().await.fetch_all().await {
        warn!("Initial content fetch failed: {}", e);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

// ==================== Public: i18n ====================

async fn list_languages(State(state): State<AppState>) -> impl IntoResponse {
    let default = state.translations.language();
    let languages: Vec<_> = Language::ALL
        .iter()
        .map(|lang| {
            json!({
                "code": lang.code(),
                "name": lang.native_name(),
                "default": *lang == default,
            })
        })
        .collect();
    Json(json!({ "languages": languages }))
}

fn parse_language(code: &str) -> AppResult<Language> {
    Language::from_code(code)
        .ok_or_else(|| AppError::NotFound(format!("unsupported language '{code}'")))
}

async fn get_dictionary(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> AppResult<impl IntoResponse> {
    let language = parse_language(&lang)?;
    Ok(Json(state.translations.dictionary(language).clone()))
}

async fn translate_key(
    State(state): State<AppState>,
    Path((lang, key)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let language = parse_language(&lang)?;
    let value = state.translations.translate_in(language, &key);
    Ok(Json(json!({ "key": key, "value": value })))
}

// ==================== Public: content ====================

#[derive(Debug, Deserialize)]
struct ContentQuery {
    section: Option<String>,
    lang: Option<String>,
}

async fn list_sections(State(state): State<AppState>) -> impl IntoResponse {
    let repo = state.repo.read().await;
    Json(json!({ "sections": repo.sections() }))
}

/// The published content view. With no filters the whole grouped index is
/// returned; `?section=` narrows to one section; adding `&lang=` flattens
/// to per-key values in that language, empty string where a translation is
/// missing. A language filter on its own is rejected: the flattened view
/// only exists per section.
async fn get_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> AppResult<impl IntoResponse> {
    let repo = state.repo.read().await;

    let body = match (query.section.as_deref(), query.lang.as_deref()) {
        (None, Some(_)) => {
            return Err(AppError::ValidationFailed(
                "lang filter requires a section filter".to_string(),
            ));
        }
        (None, None) => json!({ "content": repo.grouped() }),
        (Some(section), None) => {
            let keys = repo.grouped().get(section).cloned().unwrap_or_default();
            json!({ "section": section, "content": keys })
        }
        (Some(section), Some(lang)) => {
            parse_language(lang)?;
            json!({
                "section": section,
                "lang": lang,
                "entries": repo.entries_for(section, lang),
            })
        }
    };
    Ok(Json(body))
}

// ==================== Public: intake ====================

#[derive(Debug, Deserialize)]
struct NewMessage {
    name: String,
    email: String,
    message: String,
}

async fn submit_message(
    State(state): State<AppState>,
    Json(body): Json<NewMessage>,
) -> AppResult<impl IntoResponse> {
    state
        .intake
        .submit_message(&body.name, &body.email, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "received" }))))
}

async fn submit_appointment(
    State(state): State<AppState>,
    Json(body): Json<NewAppointment>,
) -> AppResult<impl IntoResponse> {
    let stored = state.intake.submit_appointment(body).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// ==================== Sessions ====================

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = state.auth.sign_in(&body.email, &body.password).await?;
    Ok(Json(session))
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = state.auth.sign_up(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::AuthFailed("missing bearer token".to_string()))?;
    state.auth.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Admin gate ====================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Accept either the configured service key (constant-time comparison) or
/// a session token the auth backend recognizes.
async fn require_admin(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::AuthFailed("missing bearer token".to_string()))?;

    if let Some(key) = &state.config.admin_api_key {
        if constant_time_compare(token, key) {
            return Ok(());
        }
    }

    state.auth.current_user(token).await.map(|_| ())
}

// ==================== Admin: content ====================

/// Full editing view: the grouped index including staged (unsaved) edits,
/// the section set and whether a save is in flight.
async fn admin_content_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let repo = state.repo.read().await;
    Ok(Json(json!({
        "sections": repo.sections(),
        "saving": state.saving.load(Ordering::SeqCst),
        "content": repo.grouped(),
    })))
}

async fn refresh_content(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let mut repo = state.repo.write().await;
    repo.fetch_all().await?;
    Ok(Json(json!({ "rows": repo.content().len() })))
}

#[derive(Debug, Deserialize)]
struct ValueChange {
    section: String,
    key: String,
    lang: String,
    value: String,
}

async fn set_content_value(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ValueChange>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let mut repo = state.repo.write().await;
    repo.set_local_value(&body.section, &body.key, &body.lang, &body.value)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct EntryRef {
    section: String,
    key: String,
}

async fn save_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EntryRef>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let _saving = SavingGuard::raise(&state.saving);
    let mut repo = state.repo.write().await;
    repo.save_entry(&body.section, &body.key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct NewEntry {
    section: String,
    key: String,
    values: HashMap<String, String>,
}

async fn add_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewEntry>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let _saving = SavingGuard::raise(&state.saving);
    let mut repo = state.repo.write().await;
    repo.add_entry(&body.section, &body.key, &body.values).await?;
    Ok(StatusCode::CREATED)
}

async fn delete_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EntryRef>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let _saving = SavingGuard::raise(&state.saving);
    let mut repo = state.repo.write().await;
    repo.delete_entry(&body.section, &body.key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RenameRequest {
    section: String,
    old_key: String,
    new_key: String,
}

async fn rename_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RenameRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let _saving = SavingGuard::raise(&state.saving);
    let mut repo = state.repo.write().await;
    repo.rename_key(&body.section, &body.old_key, &body.new_key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct NewSection {
    name: String,
}

async fn add_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewSection>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let mut repo = state.repo.write().await;
    repo.add_section(&body.name)?;
    Ok((StatusCode::CREATED, Json(json!({ "sections": repo.sections() }))))
}

async fn bulk_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let _saving = SavingGuard::raise(&state.saving);
    let mut repo = state.repo.write().await;
    repo.bulk_save(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Admin: intake inbox ====================

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let messages = state.intake.list_messages().await?;
    Ok(Json(json!({ "messages": messages })))
}

async fn list_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    let appointments = state.intake.list_appointments().await?;
    let counts = status_counts(&appointments);
    let per_status = |status: AppointmentStatus| counts.get(&status).copied().unwrap_or(0);
    Ok(Json(json!({
        "appointments": appointments,
        "counts": {
            "pending": per_status(AppointmentStatus::Pending),
            "confirmed": per_status(AppointmentStatus::Confirmed),
            "cancelled": per_status(AppointmentStatus::Cancelled),
        },
    })))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: AppointmentStatus,
}

async fn set_appointment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusChange>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers).await?;
    state.intake.set_appointment_status(&id, body.status).await?;
    Ok(StatusCode::NO_CONTENT)
}
