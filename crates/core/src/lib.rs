pub mod error;
pub mod models;
pub mod validation;

pub use error::{ApiError, ApiResult, NON_FIELD_ERRORS_KEY};

// Re-export commonly used models for convenience
pub use models::{
    address::{Address, NewAddress},
    auth::{LoginResponse, StoredSession, TokenPair},
    courier::CourierProfile,
    order::{Order, OrderSummary},
    user::{ProfileSummary, UserProfile, UserStatistics},
};
