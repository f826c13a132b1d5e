//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::db::RepositoryError;
use crate::pending::PendingStateError;
use crate::services::ServiceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout step failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::BadRequest(msg),
            ServiceError::NotFound(what) => Self::NotFound(what.to_string()),
            ServiceError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<PendingStateError> for AppError {
    fn from(err: PendingStateError) -> Self {
        Self::Checkout(CheckoutError::PendingState(err))
    }
}

impl AppError {
    /// Whether this is a server-side failure worth reporting.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Session(_)
                | Self::Checkout(
                    CheckoutError::Store(_)
                        | CheckoutError::OrderIncomplete { .. }
                        | CheckoutError::PendingState(_)
                )
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                CheckoutError::ProductUnavailable { .. }
                | CheckoutError::PriceChanged { .. }
                | CheckoutError::SubmissionInProgress
                | CheckoutError::WrongStage { .. } => StatusCode::CONFLICT,
                CheckoutError::Store(RepositoryError::Unavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                CheckoutError::Store(_)
                | CheckoutError::OrderIncomplete { .. }
                | CheckoutError::PendingState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code for the client.
    const fn code(&self) -> &'static str {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => "validation",
                CheckoutError::ProductUnavailable { .. } => "product_unavailable",
                CheckoutError::PriceChanged { .. } => "price_changed",
                CheckoutError::Store(_) | CheckoutError::PendingState(_) => "store_error",
                CheckoutError::OrderIncomplete { .. } => "order_incomplete",
                CheckoutError::SubmissionInProgress => "submission_in_progress",
                CheckoutError::WrongStage { .. } => "wrong_stage",
            },
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => "not_found",
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => "internal",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                "Internal server error".to_string()
            }
            Self::Checkout(err) => match err {
                CheckoutError::Validation(msg) => msg.clone(),
                CheckoutError::ProductUnavailable { .. } => {
                    "Some items are no longer available. Please review your order.".to_string()
                }
                CheckoutError::PriceChanged { .. } => {
                    "Prices have changed since you confirmed. Please review your order."
                        .to_string()
                }
                CheckoutError::Store(_) | CheckoutError::PendingState(_) => {
                    "We could not place your order. Please try again.".to_string()
                }
                CheckoutError::OrderIncomplete { order_id } => format!(
                    "Your order {order_id} could not be completed. Please contact support."
                ),
                CheckoutError::SubmissionInProgress => {
                    "Your order is already being placed.".to_string()
                }
                CheckoutError::WrongStage { .. } => err.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut body = json!({
            "error": self.code(),
            "message": self.public_message(),
        });
        if let Self::Checkout(CheckoutError::ProductUnavailable { missing }) = &self {
            body["missing"] = json!(missing);
        }
        if let Self::Checkout(CheckoutError::PriceChanged { confirmed, current }) = &self {
            body["confirmed_total"] = json!(confirmed);
            body["current_total"] = json!(current);
        }

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use kirana_core::{OrderId, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order".to_string());
        assert_eq!(err.to_string(), "Not found: order");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_checkout_error_status_codes() {
        assert_eq!(
            get_status(CheckoutError::Validation("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CheckoutError::ProductUnavailable {
                    missing: vec![ProductId::new()]
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CheckoutError::PriceChanged {
                    confirmed: Decimal::from(200),
                    current: Decimal::from(240)
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::SubmissionInProgress.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CheckoutError::OrderIncomplete {
                    order_id: OrderId::new()
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "bad status 'refunded'".to_string(),
        ));
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_service_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(ServiceError::Validation("bad".to_string())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::NotFound("order")),
            AppError::NotFound(_)
        ));
    }
}
