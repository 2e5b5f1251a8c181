/**
 * Backend Error Types
 *
 * This module defines the HTTP-facing error type of the gateway.
 *
 * # Error Categories
 *
 * ## Handshake Errors
 *
 * A missing, invalid or expired credential on the upgrade request. These are
 * rejected before any connection resources exist and surface as `401`.
 *
 * ## Handler Errors
 *
 * Any other request-level failure with an explicit status code.
 *
 * ## State Errors
 *
 * Failures while building or reading application state.
 *
 * Transport, backpressure and registry errors never reach this type: they are
 * handled inside the connection that produced them.
 */

use crate::shared::SharedError;
use axum::http::StatusCode;
use thiserror::Error;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handshake rejected; the reason stays in the server log
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Internal reason, never sent to the client
        reason: String,
    },

    /// Handler error with an explicit status
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// State management error
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a handshake rejection
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// - `Unauthorized` - 401 Unauthorized
    /// - `HandlerError` - Uses the status code from the error
    /// - `StateError` - 500 Internal Server Error
    /// - `SharedError` - 400 for validation, 500 for serialization
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::HandlerError { status, .. } => *status,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Message safe to show to the client
    ///
    /// Handshake and state failures collapse to their status text so no
    /// internals leak into the response body.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => "Unauthorized".to_string(),
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { .. } => "Internal Server Error".to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}
