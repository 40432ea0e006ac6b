use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{
    Caller, CriteriaId, JobRoleId, NewUser, Position, ReviewId, ReviewPatch, ReviewerGroup, Score,
    SelfReviewPatch, SheetId, SheetPatch, SheetWeight, UserId, UserPatch, UserRole,
};
use super::error::ServiceError;
use super::service::ReviewService;

/// Router builder exposing the review intents over HTTP. Pure transport:
/// every rule lives in [`ReviewService`].
pub fn review_router(service: Arc<ReviewService>) -> Router {
    Router::new()
        .route("/api/v1/job-roles", post(create_job_role))
        .route("/api/v1/job-roles/:id/criteria", post(create_criteria))
        .route("/api/v1/criteria/:id/archived", put(set_criteria_archived))
        .route("/api/v1/criteria/:id/expectations", put(save_expectation))
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/:id", get(get_user).patch(update_user))
        .route("/api/v1/reviews", post(create_review))
        .route(
            "/api/v1/reviews/:id",
            get(get_review).patch(update_review).delete(delete_review),
        )
        .route("/api/v1/reviews/:id/self-review", put(update_self_review))
        .route("/api/v1/reviews/:id/weights", put(set_weights))
        .route("/api/v1/reviews/:id/sheets", post(create_sheet))
        .route("/api/v1/sheets/:id", patch(update_sheet))
        .route("/api/v1/sheets/:id/answers/:criteria_id", put(save_answer))
        .route("/api/v1/sheets/:id/answer", put(save_sheet_answer))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct CreateJobRoleRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateCriteriaRequest {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ArchiveRequest {
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct ExpectationRequest {
    position: Position,
    description: String,
}

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    user_id: UserId,
    period: String,
}

#[derive(Debug, Deserialize)]
struct CreateSheetRequest {
    reviewer_id: UserId,
    due_date: NaiveDate,
    #[serde(default)]
    reviewer_group: ReviewerGroup,
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    score: Option<Score>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SheetAnswerRequest {
    total_score: Option<Score>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeightsRequest {
    weights: Vec<SheetWeight>,
}

/// Caller identity carried in headers by the fronting layer. Defaults to a
/// plain user when absent.
fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let username = headers
        .get("x-caller-username")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();
    let user_role = headers
        .get("x-caller-role")
        .and_then(|value| value.to_str().ok())
        .map(|value| match value.to_ascii_uppercase().as_str() {
            "ADMIN" => UserRole::Admin,
            "HEAD" => UserRole::Head,
            _ => UserRole::User,
        })
        .unwrap_or(UserRole::User);
    Caller {
        username,
        user_role,
    }
}

async fn create_job_role(
    State(service): State<Arc<ReviewService>>,
    Json(request): Json<CreateJobRoleRequest>,
) -> Result<Response, ServiceError> {
    let role = service.create_job_role(&request.name)?;
    Ok((StatusCode::CREATED, Json(role)).into_response())
}

async fn create_criteria(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(request): Json<CreateCriteriaRequest>,
) -> Result<Response, ServiceError> {
    let criteria =
        service.create_criteria(JobRoleId(id), &request.name, &request.description)?;
    Ok((StatusCode::CREATED, Json(criteria)).into_response())
}

async fn set_criteria_archived(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(request): Json<ArchiveRequest>,
) -> Result<Response, ServiceError> {
    let criteria = service.set_criteria_archived(CriteriaId(id), request.archived)?;
    Ok(Json(criteria).into_response())
}

async fn save_expectation(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(request): Json<ExpectationRequest>,
) -> Result<Response, ServiceError> {
    let expectation =
        service.save_expectation(CriteriaId(id), request.position, &request.description)?;
    Ok(Json(expectation).into_response())
}

async fn create_user(
    State(service): State<Arc<ReviewService>>,
    Json(request): Json<NewUser>,
) -> Result<Response, ServiceError> {
    let user = service.create_user(request)?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

async fn get_user(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
) -> Result<Response, ServiceError> {
    let view = service.get_user(UserId(id))?;
    Ok(Json(view).into_response())
}

async fn update_user(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(patch): Json<UserPatch>,
) -> Result<Response, ServiceError> {
    let caller = caller_from_headers(&headers);
    let user = service.update_user(&caller, UserId(id), patch)?;
    Ok(Json(user).into_response())
}

async fn create_review(
    State(service): State<Arc<ReviewService>>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Response, ServiceError> {
    let review = service.create_review(request.user_id, &request.period)?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

async fn get_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
) -> Result<Response, ServiceError> {
    let view = service.get_review(ReviewId(id))?;
    Ok(Json(view).into_response())
}

async fn update_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Response, ServiceError> {
    let review = service.update_review(ReviewId(id), patch)?;
    Ok(Json(review).into_response())
}

async fn delete_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
) -> Result<Response, ServiceError> {
    service.delete_review(ReviewId(id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn update_self_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(patch): Json<SelfReviewPatch>,
) -> Result<Response, ServiceError> {
    let self_review = service.update_self_review(ReviewId(id), patch)?;
    Ok(Json(self_review).into_response())
}

async fn set_weights(
    State(service): State<Arc<ReviewService>>,
    Path(_review_id): Path<u64>,
    Json(request): Json<WeightsRequest>,
) -> Result<Response, ServiceError> {
    service.set_weights(&request.weights)?;
    Ok(StatusCode::OK.into_response())
}

async fn create_sheet(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(request): Json<CreateSheetRequest>,
) -> Result<Response, ServiceError> {
    let sheet = service.create_sheet(
        ReviewId(id),
        request.reviewer_id,
        request.due_date,
        request.reviewer_group,
    )?;
    Ok((StatusCode::CREATED, Json(sheet)).into_response())
}

async fn update_sheet(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(patch): Json<SheetPatch>,
) -> Result<Response, ServiceError> {
    let sheet = service.update_sheet(SheetId(id), patch)?;
    Ok(Json(sheet).into_response())
}

async fn save_answer(
    State(service): State<Arc<ReviewService>>,
    Path((id, criteria_id)): Path<(u64, u64)>,
    Json(request): Json<AnswerRequest>,
) -> Result<Response, ServiceError> {
    let answer = service.save_answer(
        SheetId(id),
        CriteriaId(criteria_id),
        request.score,
        request.comment,
    )?;
    Ok(Json(answer).into_response())
}

async fn save_sheet_answer(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<u64>,
    Json(request): Json<SheetAnswerRequest>,
) -> Result<Response, ServiceError> {
    let sheet_answer =
        service.save_sheet_answer(SheetId(id), request.total_score, request.comment)?;
    Ok(Json(sheet_answer).into_response())
}
