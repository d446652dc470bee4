use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_store::records::{Account, BusyInterval, ProfileUpdate};
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token;

use crate::models::{
    BusyRequest, DoctorError, PatientProfile, PractitionerProfile, SortCriteria,
    SortedDoctorsQuery,
};
use crate::services::availability::AvailabilityService;
use crate::services::directory::DirectoryService;
use crate::DoctorState;

fn map_error(error: DoctorError) -> AppError {
    let message = error.to_string();
    match error {
        DoctorError::NotFound => AppError::NotFound(message),
        DoctorError::InvalidSortCriteria | DoctorError::InvalidSortOrder => {
            AppError::BadRequest(message)
        }
        DoctorError::Store(_) => AppError::Store(message),
    }
}

/// Resolve the caller from an optional Authorization header. Invalid or
/// expired tokens degrade to anonymous rather than failing the request.
fn optional_viewer(state: &DoctorState, headers: &HeaderMap) -> Option<String> {
    let token = bearer_token(headers.get("Authorization"))?;
    validate_token(token, &state.config.jwt_secret)
        .ok()
        .map(|user| user.id)
}

pub async fn list_doctors(State(state): State<DoctorState>) -> Result<impl IntoResponse, AppError> {
    let doctors = DirectoryService::new(state.store.clone())
        .list()
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "doctors": doctors })))
}

pub async fn sorted_doctors(
    State(state): State<DoctorState>,
    Query(query): Query<SortedDoctorsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let criteria = match query.sort_by.as_deref() {
        Some(raw) => serde_json::from_str::<SortCriteria>(raw)
            .map_err(|_| map_error(DoctorError::InvalidSortCriteria))?,
        None => SortCriteria::default(),
    };
    let order = query
        .order
        .ok_or_else(|| map_error(DoctorError::InvalidSortOrder))?;

    let doctors = DirectoryService::new(state.store.clone())
        .search(criteria, &order)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "doctors": doctors })))
}

pub async fn get_profile(
    State(state): State<DoctorState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    profile_response(&state, &user_id, optional_viewer(&state, &headers)).await
}

/// `GET /user` without an id serves the caller's own profile.
pub async fn get_own_profile(
    State(state): State<DoctorState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let viewer = optional_viewer(&state, &headers)
        .ok_or_else(|| AppError::Auth("Unauthorized".to_string()))?;
    let user_id = viewer.clone();
    profile_response(&state, &user_id, Some(viewer)).await
}

async fn profile_response(
    state: &DoctorState,
    user_id: &str,
    viewer: Option<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let account = state
        .store
        .find_account_by_id(user_id)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    match account {
        Account::Practitioner(record) => {
            let profile = PractitionerProfile {
                user_id: record.account_id,
                name: record.display_name,
                description: record.description,
                profile_photo: record.profile_photo,
                help_options: record.help_options,
                language_options: record.language_options,
                rates: record.rates,
                average_rating: record.average_rating,
                workday_hours: record.workday_hours,
                weekend_hours: record.weekend_hours,
                email: record.email,
                phone_number: record.phone_number,
            };
            Ok(Json(serde_json::to_value(profile).map_err(|e| {
                AppError::Internal(e.to_string())
            })?))
        }
        Account::Patient(record) => {
            // Patient profiles are private to their owner.
            if viewer.as_deref() != Some(user_id) {
                return Err(AppError::Auth("Unauthorized".to_string()));
            }
            let profile = PatientProfile {
                user_id: record.account_id,
                name: record.display_name,
                description: record.description,
                profile_photo: record.profile_photo,
                language_options: record.language_options,
            };
            Ok(Json(serde_json::to_value(profile).map_err(|e| {
                AppError::Internal(e.to_string())
            })?))
        }
    }
}

pub async fn edit_profile(
    State(state): State<DoctorState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .update_profile(&user.id, update)
        .await
        .map_err(|e| match e {
            shared_store::StoreError::NotFound => AppError::NotFound("User not found".to_string()),
            other => AppError::Store(other.to_string()),
        })?;
    Ok(Json(json!({ "message": "Profile updated" })))
}

pub async fn declare_busy(
    State(state): State<DoctorState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BusyRequest>,
) -> Result<impl IntoResponse, AppError> {
    AvailabilityService::new(state.store.clone())
        .declare_busy(
            &user.id,
            BusyInterval {
                start: request.start,
                end: request.end,
            },
        )
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "status": "success" })))
}

pub async fn calendar(
    State(state): State<DoctorState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let viewer = optional_viewer(&state, &headers);
    let response = AvailabilityService::new(state.store.clone())
        .calendar(&user_id, viewer.as_deref())
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}
