// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::chain::ChainClientError;
use crate::coordinator::CoordinatorError;
use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match &error {
            StoreError::NotFound(_) => ApiError::not_found(error.to_string()),
            StoreError::DuplicateValue(_) | StoreError::InvalidTransition { .. } => {
                ApiError::conflict(error.to_string())
            }
            _ => {
                tracing::error!(error = %error, "store failure");
                ApiError::internal("storage failure")
            }
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(error: CoordinatorError) -> Self {
        match error {
            CoordinatorError::Validation(message) => ApiError::bad_request(message),
            CoordinatorError::Conflict(message) => ApiError::conflict(message),
            CoordinatorError::NotFound(message) => ApiError::not_found(message),
            CoordinatorError::Forbidden(message) => ApiError::forbidden(message),
            CoordinatorError::NonTransferable(id) => {
                ApiError::conflict(format!("token {id} is non-transferable"))
            }
            CoordinatorError::ChainSubmission(e) | CoordinatorError::ChainConfirmation(e) => {
                tracing::error!(error = %e, "chain dependency failure");
                ApiError::bad_gateway(e.to_string())
            }
            CoordinatorError::ChainQuery(e) => {
                tracing::error!(error = %e, "chain query failure");
                match e {
                    ChainClientError::Unavailable(_) => {
                        ApiError::service_unavailable(e.to_string())
                    }
                    other => ApiError::bad_gateway(other.to_string()),
                }
            }
            CoordinatorError::Store(e) => ApiError::from(e),
        }
    }
}
