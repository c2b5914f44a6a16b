//! Response types for the stay engine API.
//!
//! This module defines the response bodies and the mapping from engine
//! errors and business rejections to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{AuditStep, BookingRejection, RejectionKind};
use crate::store::{CreditReceipt, RewardRejection};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::InvalidDateRange { .. }
            | EngineError::UnknownStatus { .. }
            | EngineError::ListingMismatch { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::validation_error(message),
            ),
            EngineError::DuplicatePromotionCode { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("DUPLICATE_PROMOTION_CODE", message),
            ),
            EngineError::BookingNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("BOOKING_NOT_FOUND", message),
            ),
            EngineError::BookingStatusConflict { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("BOOKING_STATUS_CONFLICT", message),
            ),
            EngineError::InvalidTransition { .. } | EngineError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details(
                    "INTERNAL_ERROR",
                    "Internal error; the request may be retried",
                    message,
                ),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

/// Body returned when a booking is refused.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedBookingBody {
    /// `VALIDATION`, `CONFLICT` or `PROMOTION_INELIGIBLE`.
    pub code: RejectionKind,
    /// The rejection itself.
    #[serde(flatten)]
    pub rejection: BookingRejection,
    /// Steps run before the refusal.
    pub audit_trail: Vec<AuditStep>,
}

impl RejectedBookingBody {
    /// HTTP status for the rejection: 409 for conflicts, 422 otherwise.
    pub fn status(&self) -> StatusCode {
        match self.rejection.kind {
            RejectionKind::Conflict => StatusCode::CONFLICT,
            RejectionKind::Validation | RejectionKind::PromotionIneligible => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

/// Body returned for a credit attempt that changed nothing or credited points.
#[derive(Debug, Clone, Serialize)]
pub struct CreditResponse {
    /// True when the reference had already been credited.
    pub duplicate: bool,
    /// The new transaction, or the one that already holds the reference.
    pub transaction_id: Uuid,
    /// Credit details. Absent for duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<CreditReceipt>,
}

impl From<RewardRejection> for ApiErrorResponse {
    fn from(rejection: RewardRejection) -> Self {
        let message = rejection.to_string();
        let (status, code) = match rejection {
            RewardRejection::UserNotFound { .. } => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            RewardRejection::UnknownAction { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNKNOWN_ACTION")
            }
            RewardRejection::ActionInactive { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ACTION_INACTIVE")
            }
            RewardRejection::AlreadyEarned { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ALREADY_EARNED")
            }
            RewardRejection::CooldownActive { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "COOLDOWN_ACTIVE")
            }
            RewardRejection::WeeklyLimitReached { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "WEEKLY_LIMIT_REACHED")
            }
            RewardRejection::Duplicate { .. } => (StatusCode::OK, "DUPLICATE_REWARD"),
        };
        ApiErrorResponse {
            status,
            error: ApiError::new(code, message),
        }
    }
}
