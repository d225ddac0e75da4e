use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{models::Message, schedule::ScheduleError};

const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Movie {0} already exists.")]
    DuplicateIdentifier(i32),
    #[error("Movie {0} does not exist.")]
    NotFound(i32),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: jiff::Error,
    },
    #[error("{0}")]
    BadRequest(String),
    /// A request axum could not extract, keeping the status axum chose.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            // The published API reports missing movies as 409 as well.
            AppError::DuplicateIdentifier(_) | AppError::NotFound(_) => StatusCode::CONFLICT,
            AppError::Schedule(_) | AppError::InvalidDate { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        };
        (status, Json(Message { message })).into_response()
    }
}

macro_rules! from_rejection {
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::Rejected { status: rejection.status(), message: rejection.body_text() }
                }
            }
        )+
    };
}

from_rejection!(JsonRejection, QueryRejection, PathRejection);

pub type AppResult<T> = Result<T, AppError>;
