/// Domain error taxonomy
///
/// Every service operation returns `Result<T, KanbanError>`. The variants map
/// one-to-one onto the outcomes a client can observe:
///
/// - `Validation`: malformed or inconsistent input, with field-scoped messages
/// - `NotFound`: the referenced entity does not exist
/// - `PermissionDenied`: the entity exists but the requester lacks the relationship
/// - `Unauthenticated`: no valid token was presented
///
/// Store and hashing failures are carried separately and surface as internal errors.
///
/// # Example
///
/// ```
/// use kanmind_shared::error::{FieldError, KanbanError};
///
/// let err = KanbanError::field("title", "This field may not be blank.");
/// match err {
///     KanbanError::Validation(fields) => assert_eq!(fields[0].field, "title"),
///     _ => unreachable!(),
/// }
/// ```

use serde::{Deserialize, Serialize};

use crate::auth::authorization::AuthzError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Result alias used by the service layer
pub type KanbanResult<T> = Result<T, KanbanError>;

/// A single validation failure tied to an input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation (`non_field_errors` for cross-field checks)
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field name used for failures that are not tied to one input field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Error type for all domain operations
#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    /// Input failed validation
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity exists but the requester may not act on it
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Missing or invalid credentials
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing failure
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl KanbanError {
    /// Shorthand for a validation error on a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        KanbanError::Validation(vec![FieldError::new(field, message)])
    }

    /// Shorthand for a validation error not tied to one field
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }
}

impl From<AuthzError> for KanbanError {
    fn from(err: AuthzError) -> Self {
        KanbanError::PermissionDenied(err.to_string())
    }
}

impl From<validator::ValidationErrors> for KanbanError {
    fn from(errors: validator::ValidationErrors) -> Self {
        KanbanError::Validation(field_errors(&errors))
    }
}

/// Flattens `validator` output into field-scoped messages
///
/// Fields are reported in name order so responses are stable.
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        title: String,

        #[validate(email(message = "Enter a valid email address."))]
        email: String,
    }

    #[test]
    fn test_field_errors_from_validator() {
        let probe = Probe {
            title: String::new(),
            email: "not-an-email".to_string(),
        };

        let err: KanbanError = probe.validate().unwrap_err().into();
        match err {
            KanbanError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "email");
                assert_eq!(fields[0].message, "Enter a valid email address.");
                assert_eq!(fields[1].field, "title");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_authz_error_becomes_permission_denied() {
        let err: KanbanError = AuthzError::NotBoardOwner(7).into();
        assert!(matches!(err, KanbanError::PermissionDenied(_)));
    }

    #[test]
    fn test_error_display() {
        let err = KanbanError::field("title", "blank");
        assert_eq!(err.to_string(), "Validation failed: 1 error(s)");

        let err = KanbanError::NotFound("Board not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found.");
    }
}
