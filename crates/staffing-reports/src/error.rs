use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::board::BoardError;
use crate::workflows::hiring::ImportError;
use crate::workflows::reports::{PipelineError, ReportError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Board(BoardError),
    Report(ReportError),
    Pipeline(PipelineError),
    Import(ImportError),
    Serialize(serde_json::Error),
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Board(
                BoardError::Json(_)
                | BoardError::InvalidField { .. }
                | BoardError::InvalidAction { .. },
            )
            | AppError::Report(_)
            | AppError::Import(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Board(_) | AppError::Pipeline(PipelineError::Snapshot(_)) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Pipeline(_)
            | AppError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Board(err) => write!(f, "board error: {}", err),
            AppError::Report(err) => write!(f, "report error: {}", err),
            AppError::Pipeline(err) => write!(f, "pipeline error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Serialize(err) => write!(f, "serialization error: {}", err),
            AppError::BadRequest(reason) => write!(f, "bad request: {}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Board(err) => Some(err),
            AppError::Report(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Serialize(err) => Some(err),
            AppError::BadRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<BoardError> for AppError {
    fn from(value: BoardError) -> Self {
        Self::Board(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_maps_to_client_errors() {
        let err = AppError::BadRequest("unknown report kind 'weekly'".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = AppError::Board(BoardError::ListNotFound("Lab".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = AppError::Config(ConfigError::Missing("TRELLO_KEY"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "configuration error: TRELLO_KEY must be set to talk to the board"
        );
    }
}
