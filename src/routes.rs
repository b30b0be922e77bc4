use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;
use chrono::Utc;

use crate::gemini::GeminiClient;
use crate::models::{ImageUpload, LoadingState, ProductData, Session, VisualRequest};

const PERSONA_FAILURE_MESSAGE: &str =
    "Failed to generate personas. Please verify your API key and try again.";
const ANALYZE_FAILURE_MESSAGE: &str =
    "Failed to analyze the product. Fill in the details manually and try again.";
const VISUAL_FAILURE_MESSAGE: &str = "Failed to generate the creative image. Please try again.";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub gemini: Arc<GeminiClient>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session/:id", get(get_session))
        .route("/api/session/:id/product", put(update_product))
        .route("/api/session/:id/analyze", post(analyze_product))
        .route("/api/session/:id/personas", post(generate_personas))
        .route("/api/session/:id/visual", post(generate_visual))
        .with_state(state)
}

pub async fn create_session(State(state): State<AppState>) -> Json<Session> {
    let session = Session::new(Uuid::new_v4());
    tracing::info!("🆕 Created session {}", session.id);
    state.store.write().insert(session.id, session.clone());
    Json(session)
}

pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Session>, StatusCode> {
    state.store.read().get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Manual form edits. The stored image (if any) survives a JSON update;
/// it can only be replaced through the analyze upload.
pub async fn update_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ProductData>,
) -> Result<Json<Session>, StatusCode> {
    let mut guard = state.store.write();
    let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let image = session.product.image.take();
    session.product = ProductData { image, ..body };
    session.updated_at = Utc::now();
    Ok(Json(session.clone()))
}

/// Auto-fill from a URL and optional image upload. A partial result is
/// merged field by field; whatever the model did not return keeps its
/// manually entered value.
pub async fn analyze_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Session>, StatusCode> {
    let mut url = String::new();
    let mut image: Option<ImageUpload> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("url") => url = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?,
            Some("image") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                if !bytes.is_empty() {
                    image = Some(ImageUpload { bytes, content_type });
                }
            }
            _ => {}
        }
    }

    {
        let mut guard = state.store.write();
        let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
        session.state = LoadingState::Analyzing;
        session.error = None;
        session.product.url = Some(url.clone()).filter(|u| !u.is_empty());
        if let Some(upload) = &image {
            session.product.image = Some(upload.clone());
        }
        session.updated_at = Utc::now();
    }

    tracing::info!("🔍 Analyzing product for session {}: {}", id, url);
    let result = state.gemini.analyze(&url, image.as_ref()).await;

    let mut guard = state.store.write();
    let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    match result {
        Ok(patch) => {
            session.product.merge_patch(patch);
            session.state = LoadingState::Idle;
            tracing::info!("✅ Analysis merged into session {}", id);
        }
        Err(e) => {
            tracing::error!("❌ Analysis failed for session {}: {}", id, e);
            session.state = LoadingState::Error;
            session.error = Some(ANALYZE_FAILURE_MESSAGE.to_string());
        }
    }
    session.updated_at = Utc::now();
    Ok(Json(session.clone()))
}

/// One persona batch per submission; a new submission clears previous
/// results and error state before going in-flight.
pub async fn generate_personas(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Session>, StatusCode> {
    let product = {
        let mut guard = state.store.write();
        let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
        session.state = LoadingState::GeneratingPersonas;
        session.error = None;
        session.personas.clear();
        session.creatives.clear();
        session.updated_at = Utc::now();
        session.product.clone()
    };

    tracing::info!("🚀 Generating personas for session {}: {}", id, product.title);
    let result = state.gemini.generate_personas(&product).await;

    let mut guard = state.store.write();
    let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    match result {
        Ok(batch) => {
            tracing::info!(
                "✅ Session {} received {} personas",
                id,
                batch.generated_personas.len()
            );
            session.personas = batch.generated_personas;
            session.state = LoadingState::Success;
        }
        Err(e) => {
            tracing::error!("❌ Persona generation failed for session {}: {}", id, e);
            session.state = LoadingState::Error;
            session.error = Some(PERSONA_FAILURE_MESSAGE.to_string());
        }
    }
    session.updated_at = Utc::now();
    Ok(Json(session.clone()))
}

/// On-demand creative for one persona. A failed image leaves the persona
/// batch intact; only the error message is surfaced.
pub async fn generate_visual(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<VisualRequest>,
) -> Result<Json<Session>, StatusCode> {
    {
        let mut guard = state.store.write();
        let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
        session.state = LoadingState::GeneratingImage;
        session.error = None;
        session.updated_at = Utc::now();
    }

    tracing::info!("🎨 Generating creative for session {} persona {}", id, body.persona_id);
    let result = state.gemini.generate_visual(&body.prompt).await;

    let mut guard = state.store.write();
    let session = guard.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    match result {
        Ok(data_uri) => {
            tracing::info!(
                "✅ Creative for persona {} ({} chars)",
                body.persona_id,
                data_uri.len()
            );
            session.creatives.insert(body.persona_id, data_uri);
            session.state = LoadingState::Success;
        }
        Err(e) => {
            tracing::error!("❌ Creative generation failed for session {}: {}", id, e);
            session.state = LoadingState::Success;
            session.error = Some(VISUAL_FAILURE_MESSAGE.to_string());
        }
    }
    session.updated_at = Utc::now();
    Ok(Json(session.clone()))
}
