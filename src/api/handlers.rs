//! HTTP request handlers for the stay engine API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::{BookingOutcome, BookingSubmission};
use crate::models::Promotion;
use crate::store::{CreditOutcome, RewardRejection};

use super::request::{CreditRewardRequest, EnrollRequest, SubmitBookingRequest};
use super::response::{ApiError, ApiErrorResponse, CreditResponse, RejectedBookingBody};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/bookings", post(submit_booking_handler))
        .route("/bookings/:booking_id/confirm", post(confirm_booking_handler))
        .route("/bookings/:booking_id/complete", post(complete_stay_handler))
        .route("/promotions", post(create_promotion_handler))
        .route("/promotions/:code/deactivate", post(deactivate_promotion_handler))
        .route("/rewards/enroll", post(enroll_handler))
        .route("/rewards/credit", post(credit_handler))
        .route("/rewards/:user_id", get(reward_state_handler))
        .with_state(state)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(error: ApiErrorResponse) -> Response {
    json_response(error.status, error.error)
}

/// Maps a body extraction failure to a 400 or 422 response.
fn json_rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let (status, error) = match rejection {
        JsonRejection::JsonDataError(err) => {
            // Well-formed JSON whose content failed validation.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::validation_error(body_text),
            )
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            (
                StatusCode::BAD_REQUEST,
                ApiError::malformed_json(format!("Invalid JSON syntax: {}", err)),
            )
        }
        JsonRejection::MissingJsonContentType(_) => (
            StatusCode::BAD_REQUEST,
            ApiError::new(
                "MISSING_CONTENT_TYPE",
                "Content-Type must be application/json",
            ),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            ApiError::malformed_json("Failed to parse request body"),
        ),
    };
    json_response(status, error)
}

/// Handler for POST /bookings.
///
/// 201 with the accepted booking, 409 for conflicts, 422 for validation
/// and promotion rejections.
async fn submit_booking_handler(
    State(state): State<AppState>,
    payload: Result<Json<SubmitBookingRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing booking request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let submission: BookingSubmission = request.into();
    let listing_id = submission.listing.id.clone();
    let start_time = Instant::now();

    match state.orchestrator().submit(submission) {
        Ok(BookingOutcome::Accepted(booking)) => {
            info!(
                correlation_id = %correlation_id,
                booking_id = %booking.booking_id,
                listing_id = %listing_id,
                total = booking.priced.total,
                duration_us = start_time.elapsed().as_micros(),
                "Booking created"
            );
            json_response(StatusCode::CREATED, booking)
        }
        Ok(BookingOutcome::Rejected {
            rejection,
            audit_trail,
        }) => {
            info!(
                correlation_id = %correlation_id,
                listing_id = %listing_id,
                kind = ?rejection.kind,
                reason = ?rejection.reason,
                "Booking rejected"
            );
            let body = RejectedBookingBody {
                code: rejection.kind,
                rejection,
                audit_trail,
            };
            json_response(body.status(), body)
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Booking submission failed"
            );
            error_response(err.into())
        }
    }
}

/// Handler for POST /bookings/:booking_id/confirm.
async fn confirm_booking_handler(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, booking_id = %booking_id, "Confirming booking");

    match state.orchestrator().confirm_booking(booking_id) {
        Ok(booking) => json_response(StatusCode::OK, booking),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Confirmation failed");
            error_response(err.into())
        }
    }
}

/// Handler for POST /bookings/:booking_id/complete.
async fn complete_stay_handler(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, booking_id = %booking_id, "Completing stay");

    match state.orchestrator().complete_stay(booking_id) {
        Ok(completed) => {
            let reward = completed.reward.map(|outcome| match outcome {
                CreditOutcome::Credited(receipt) => serde_json::json!({
                    "credited": true,
                    "receipt": receipt
                }),
                CreditOutcome::Rejected(rejection) => serde_json::json!({
                    "credited": false,
                    "rejection": rejection
                }),
            });
            json_response(
                StatusCode::OK,
                serde_json::json!({
                    "booking_id": completed.booking_id,
                    "reward": reward
                }),
            )
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Completion failed");
            error_response(err.into())
        }
    }
}

/// Handler for POST /promotions.
async fn create_promotion_handler(
    State(state): State<AppState>,
    payload: Result<Json<Promotion>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let promotion = match payload {
        Ok(Json(promotion)) => promotion,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let code = Promotion::normalize_code(&promotion.code);
    match state.orchestrator().promotions().insert(promotion) {
        Ok(()) => {
            info!(correlation_id = %correlation_id, code = %code, "Promotion registered");
            json_response(StatusCode::CREATED, serde_json::json!({ "code": code }))
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Promotion rejected");
            error_response(err.into())
        }
    }
}

/// Handler for POST /promotions/:code/deactivate.
async fn deactivate_promotion_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    if state.orchestrator().promotions().deactivate(&code) {
        info!(code = %code, "Promotion deactivated");
        json_response(
            StatusCode::OK,
            serde_json::json!({
                "code": Promotion::normalize_code(&code),
                "is_active": false
            }),
        )
    } else {
        json_response(
            StatusCode::NOT_FOUND,
            ApiError::new(
                "PROMOTION_NOT_FOUND",
                format!("Promotion code '{}' was not found", code),
            ),
        )
    }
}

/// Handler for POST /rewards/enroll.
async fn enroll_handler(
    State(state): State<AppState>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };
    let reward_state = state.orchestrator().ledger().enroll(&request.user_id);
    json_response(StatusCode::OK, reward_state)
}

/// Handler for POST /rewards/credit.
///
/// 200 when credited, 200 with `duplicate: true` when the reference was
/// already credited, 404 for an unknown user, 422 otherwise.
async fn credit_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreditRewardRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing reward credit");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let metadata = if request.metadata.is_null() {
        serde_json::json!({})
    } else {
        request.metadata
    };

    match state.orchestrator().ledger().credit_points(
        &request.user_id,
        &request.action_slug,
        request.reference_id.as_deref(),
        metadata,
    ) {
        CreditOutcome::Credited(receipt) => {
            info!(
                correlation_id = %correlation_id,
                user_id = %request.user_id,
                points = receipt.transaction.points,
                "Reward credited"
            );
            json_response(
                StatusCode::OK,
                CreditResponse {
                    duplicate: false,
                    transaction_id: receipt.transaction.id,
                    receipt: Some(receipt),
                },
            )
        }
        CreditOutcome::Rejected(RewardRejection::Duplicate {
            existing_transaction_id,
        }) => {
            info!(
                correlation_id = %correlation_id,
                user_id = %request.user_id,
                existing_transaction_id = %existing_transaction_id,
                "Duplicate reward credit"
            );
            json_response(
                StatusCode::OK,
                CreditResponse {
                    duplicate: true,
                    transaction_id: existing_transaction_id,
                    receipt: None,
                },
            )
        }
        CreditOutcome::Rejected(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                user_id = %request.user_id,
                rejection = %rejection,
                "Reward credit rejected"
            );
            error_response(rejection.into())
        }
    }
}

/// Handler for GET /rewards/:user_id.
async fn reward_state_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let ledger = state.orchestrator().ledger();
    match ledger.state(&user_id) {
        Some(reward_state) => json_response(
            StatusCode::OK,
            serde_json::json!({
                "state": reward_state,
                "history": ledger.history(&user_id)
            }),
        ),
        None => error_response(
            RewardRejection::UserNotFound { user_id }.into(),
        ),
    }
}
