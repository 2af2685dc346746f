use axum::{http::StatusCode, Json};
use thiserror::Error;

use crate::models::ApiError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("segment store unavailable: {0}")]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            message: message.into(),
        }),
    )
}

impl From<SearchError> for (StatusCode, Json<ApiError>) {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidInput(_) => api_error(StatusCode::BAD_REQUEST, err.to_string()),
            SearchError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for (StatusCode, Json<ApiError>) {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound { .. } | StoreError::UnknownUser(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidStatus(_) | StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        api_error(status, err.to_string())
    }
}
