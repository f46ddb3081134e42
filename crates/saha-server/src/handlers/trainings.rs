use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use saha_shared::api::{CreateTrainingRequest, TrainingContent, UpdateTrainingRequest};
use saha_shared::models::{Training, Viewer};
use saha_shared::{reader, trainings};
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::AppState;

fn require_author(viewer: &Viewer) -> Result<(), AppError> {
    if !viewer.role.can_manage_trainings() {
        return Err(AppError::forbidden(format!(
            "{} cannot manage trainings",
            viewer.role.as_str()
        )));
    }
    Ok(())
}

/// GET /api/v1/trainings
pub async fn list_trainings(
    State(state): State<AppState>,
) -> Result<Json<Vec<Training>>, AppError> {
    Ok(Json(trainings::list(state.store.as_ref()).await?))
}

/// POST /api/v1/trainings
pub async fn create_training(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateTrainingRequest>,
) -> Result<(StatusCode, Json<Training>), AppError> {
    require_author(&viewer)?;
    let training = trainings::create(state.store.as_ref(), &viewer, req).await?;
    Ok((StatusCode::CREATED, Json(training)))
}

/// GET /api/v1/trainings/:id
pub async fn get_training(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<Training>, AppError> {
    Ok(Json(trainings::load(state.store.as_ref(), training_id).await?))
}

/// GET /api/v1/trainings/page/:page_url
pub async fn get_training_by_page(
    State(state): State<AppState>,
    Path(page_url): Path<String>,
) -> Result<Json<Training>, AppError> {
    Ok(Json(
        trainings::find_by_page_url(state.store.as_ref(), &page_url).await?,
    ))
}

/// GET /api/v1/trainings/:id/content
///
/// The slides a learner sees, falling back to a bundled set when nothing
/// has been authored yet.
pub async fn get_training_content(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<TrainingContent>, AppError> {
    let training = trainings::load(state.store.as_ref(), training_id).await?;
    let resolved = reader::resolve_content(&training);
    Ok(Json(TrainingContent {
        source: resolved.source,
        slides: resolved.slides,
    }))
}

/// PATCH /api/v1/trainings/:id
pub async fn update_training(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(training_id): Path<Uuid>,
    Json(req): Json<UpdateTrainingRequest>,
) -> Result<Json<Training>, AppError> {
    require_author(&viewer)?;
    let training = trainings::update(state.store.as_ref(), training_id, req).await?;
    tracing::info!(training_id = %training_id, editor = %viewer.uid, "training updated");
    Ok(Json(training))
}

/// DELETE /api/v1/trainings/:id
pub async fn delete_training(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(training_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_author(&viewer)?;
    trainings::delete(state.store.as_ref(), training_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
