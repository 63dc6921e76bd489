//! Medication endpoints.
//!
//! - `POST   /api/medications`  create
//! - `GET    /api/medications`  list the caller's medications
//! - `PATCH  /api/medications/:id/taken`  mark one slot taken
//! - `DELETE /api/medications/:id`  delete

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::error::{ApiError, NOT_FOUND_MESSAGE};
use crate::api::types::{ApiContext, MedicationView, MessageResponse, OwnerContext, TakeSlotRequest};
use crate::schedule::{NewMedication, StoreError};

/// Run a blocking store call off the async executor.
async fn run_store<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Malformed ids get the same answer as unknown ones.
fn parse_medication_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(NOT_FOUND_MESSAGE.into()))
}

/// `POST /api/medications`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<OwnerContext>,
    body: Result<Json<NewMedication>, JsonRejection>,
) -> Result<(StatusCode, Json<MedicationView>), ApiError> {
    let Json(input) = body?;
    let store = ctx.store.clone();
    let med = run_store(move || store.create(&caller.owner_id, input)).await?;
    Ok((StatusCode::CREATED, Json(MedicationView::from(med))))
}

/// `GET /api/medications`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<OwnerContext>,
) -> Result<Json<Vec<MedicationView>>, ApiError> {
    let store = ctx.store.clone();
    let meds = run_store(move || store.list_by_owner(&caller.owner_id)).await?;
    Ok(Json(meds.iter().map(MedicationView::from).collect()))
}

/// `PATCH /api/medications/:id/taken`
pub async fn mark_taken(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<OwnerContext>,
    Path(medication_id): Path<String>,
    body: Result<Json<TakeSlotRequest>, JsonRejection>,
) -> Result<Json<MedicationView>, ApiError> {
    let medication_id = parse_medication_id(&medication_id)?;
    let Json(request) = body?;
    let store = ctx.store.clone();
    let med = run_store(move || {
        store.mark_slot_taken(&caller.owner_id, &medication_id, request.slot_index())
    })
    .await?;
    Ok(Json(MedicationView::from(med)))
}

/// `DELETE /api/medications/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<OwnerContext>,
    Path(medication_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let medication_id = parse_medication_id(&medication_id)?;
    let store = ctx.store.clone();
    run_store(move || store.delete(&caller.owner_id, &medication_id)).await?;
    Ok(Json(MessageResponse {
        message: "Medication deleted successfully".into(),
    }))
}
