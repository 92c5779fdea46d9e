//! Unified application error types for Tollgate.
//!
//! Every crate maps its failures into [`AppError`] so that the boundary
//! layer (not part of this workspace) can translate an [`ErrorKind`] into a
//! status code without inspecting messages.

use std::fmt;
use thiserror::Error;

/// Error categorisation shared by every crate.
///
/// The first group are terminal business failures of the credential core.
/// They are never retried. The second group are ambient failures; the
/// transient ones are eligible for a bounded retry (see [`AppError::is_transient`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No user owns the requested email, id, or refresh token.
    UserNotFound,
    /// Refresh token is missing, expired, or revoked.
    InvalidToken,
    /// Presented password does not match the stored digest.
    InvalidCredentials,
    /// The organization does not exist.
    OrganizationNotFound,
    /// The requested access level is not a known capability.
    AccessLevelForbidden,
    /// No invitation carries the presented token.
    InvitationTokenNotFound,
    /// The invitation is past its token expiration time.
    InvitationTokenExpired,
    /// The invitation was already accepted.
    InvitationTokenAlreadyUsed,

    /// The caller's capabilities do not satisfy a guard.
    Authorization,
    /// Input validation failed.
    Validation,
    /// A conditional write lost against a concurrent writer, or a unique key clashed.
    Conflict,
    /// The persistence layer failed.
    Database,
    /// An outbound collaborator (mail relay) failed.
    ExternalService,
    /// An operation exceeded its deadline.
    ServiceUnavailable,
    /// Configuration is missing or invalid.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserNotFound => write!(f, "USER_NOT_FOUND"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::OrganizationNotFound => write!(f, "ORGANIZATION_NOT_FOUND"),
            Self::AccessLevelForbidden => write!(f, "ACCESS_LEVEL_FORBIDDEN"),
            Self::InvitationTokenNotFound => write!(f, "INVITATION_TOKEN_NOT_FOUND"),
            Self::InvitationTokenExpired => write!(f, "INVITATION_TOKEN_EXPIRED"),
            Self::InvitationTokenAlreadyUsed => write!(f, "INVITATION_TOKEN_ALREADY_USED"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Tollgate.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserNotFound, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials, message)
    }

    pub fn organization_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OrganizationNotFound, message)
    }

    pub fn access_level_forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessLevelForbidden, message)
    }

    pub fn invitation_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvitationTokenNotFound, message)
    }

    pub fn invitation_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvitationTokenExpired, message)
    }

    pub fn invitation_already_used(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvitationTokenAlreadyUsed, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the failure may succeed if the whole operation is re-run.
    ///
    /// Business failures are terminal; only I/O, deadline, and stale-write
    /// failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Conflict
                | ErrorKind::Database
                | ErrorKind::ExternalService
                | ErrorKind::ServiceUnavailable
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
