//! Handler error type and its mapping to an HTTP status + JSON body.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] loadbench_store::Error),
    #[error(transparent)]
    Core(#[from] loadbench_core::Error),
    #[error("validation failure: {0}")]
    Validation(String),
    #[error("broker failure: {0}")]
    Broker(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for (StatusCode, Json<ErrorBody>) {
    fn from(err: ApiError) -> Self {
        let status = match &err {
            ApiError::Store(loadbench_store::Error::Core(loadbench_core::Error::JobNotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(loadbench_store::Error::NoData(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(loadbench_core::Error::JobNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(loadbench_core::Error::IllegalTransition(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(loadbench_core::Error::ValidationFailure(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(loadbench_core::Error::UnsupportedFormat(_)) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Broker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { detail: err.to_string() }))
    }
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;
