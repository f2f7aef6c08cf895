// handlers/actions.rs - POST /api/actions/:action endpoints
//
// Each handler resolves the acting user, decodes the JSON body into the
// action's input type and wraps the result in the success envelope.

use axum::{body::Bytes, extract::State, Extension};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::actions::{self, parse_input};
use crate::auth::{require_user, AuthUser};
use crate::database::models::{CourseItemProgress, CourseProgress};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

type Identity = Option<Extension<AuthUser>>;

/// Guard, then decode. An empty body or a JSON `null` counts as `{}`.
fn prepare<T: DeserializeOwned>(identity: &Identity, body: &Bytes) -> Result<(AuthUser, T), ApiError> {
    let user = require_user(identity.as_ref().map(|Extension(user)| user))?.clone();

    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))?
    };
    let payload = match payload {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };

    Ok((user, parse_input(payload)?))
}

/// POST /api/actions/createCourse
pub async fn create_course(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::CourseOutput> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::create_course(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::created(output))
}

/// POST /api/actions/updateCourse
pub async fn update_course(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::CourseOutput> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::update_course(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/listMyCourses
pub async fn list_my_courses(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::CoursesOutput> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::list_my_courses(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/getCourseWithItems
pub async fn get_course_with_items(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::CourseWithItemsOutput> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::get_course_with_items(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/saveCourseItem
pub async fn save_course_item(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::ItemOutput> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::save_course_item(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/deleteCourseItem
pub async fn delete_course_item(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::ItemOutput> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::delete_course_item(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/upsertCourseProgress
pub async fn upsert_course_progress(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::ProgressOutput<CourseProgress>> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::upsert_course_progress(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/updateCourseItemProgress
pub async fn update_course_item_progress(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::ProgressOutput<CourseItemProgress>> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::update_course_item_progress(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}

/// POST /api/actions/getCourseProgress
pub async fn get_course_progress(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<actions::ProgressOutput<Option<CourseProgress>>> {
    let (user, input) = prepare(&identity, &body)?;
    let output = actions::get_course_progress(state.store.as_ref(), &user, input).await?;
    Ok(ApiResponse::success(output))
}
