mod api;
mod extract;

pub use api::{
    ApiError, CONNECTIVITY_MESSAGE, GENERIC_FAILURE_MESSAGE, SERVER_FAILURE_MESSAGE,
};

/// Key under which the server reports errors not tied to a single form field.
pub const NON_FIELD_ERRORS_KEY: &str = "non_field_errors";

/// Result type alias for every remote-call operation.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
