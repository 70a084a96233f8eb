use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::StoreError;

/// Body returned for unexpected faults.
pub const SERVER_ERROR_BODY: &str = "SERVER ERROR";

pub const WELCOME_MESSAGE: &str = "Welcome to my simple RESTful movie API.";

pub const ENDPOINTS: &[(&str, &str)] = &[
    ("/movies", "Generates a random movie."),
    (
        "/movies/title/title",
        "Selects specific movie using title. Title can include letters, numbers and dots.",
    ),
    (
        "/movies/id/id",
        "Selects specific movie using ID, ID must only consist of positive integers.",
    ),
    (
        "/movies/rating/rating",
        "Selects random movie above the specified rating.",
    ),
    (
        "/movies/rating/range/range",
        "Selects random movie within the specified rating range.",
    ),
    (
        "/movies/year/year",
        "Selects random movie released in specified year.",
    ),
    (
        "/movies/decade/decade",
        "Selects random movie released in specified decade. Input is any year within the desired decade. 2010s = 2010-2019",
    ),
    (
        "/credits/title/title",
        "Selects specific movie credits using movie title. Title can include letters, numbers and dots.",
    ),
    (
        "/credits/id/id",
        "Selects specific movie credits using movie ID, ID must only consist of positive integers.",
    ),
    (
        "/actors/name/name",
        "Selects specific actor details using name. Name can include letters, numbers and dots.",
    ),
    (
        "/actors/id/id",
        "Selects specific actor details using ID, ID must only consist of positive integers.",
    ),
];

#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointIndex {
    /// Listed in declaration order.
    pub endpoints: Map<String, Value>,
}

/// Serialized as `[message, {"endpoints": {...}}]`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Welcome(pub String, pub EndpointIndex);

impl Welcome {
    pub fn new() -> Self {
        let endpoints = ENDPOINTS
            .iter()
            .map(|(path, description)| (path.to_string(), Value::from(*description)))
            .collect();
        Self(WELCOME_MESSAGE.to_string(), EndpointIndex { endpoints })
    }
}

impl Default for Welcome {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Failure signals never change the HTTP status; they are told apart by body.
#[derive(Debug)]
pub enum ApiError {
    Validation(&'static str),
    NotFound {
        message: &'static str,
        cause: Option<StoreError>,
    },
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(message: &'static str) -> Self {
        ApiError::Validation(message)
    }

    pub fn not_found(message: &'static str) -> Self {
        ApiError::NotFound {
            message,
            cause: None,
        }
    }

    pub fn store_fault(message: &'static str, cause: StoreError) -> Self {
        ApiError::NotFound {
            message,
            cause: Some(cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => error_json(message),
            ApiError::NotFound { message, cause } => {
                if let Some(cause) = cause {
                    tracing::warn!(error = ?cause, "store lookup failed");
                }
                error_json(message)
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = ?detail, "unhandled fault");
                (StatusCode::OK, SERVER_ERROR_BODY).into_response()
            }
        }
    }
}

fn error_json(message: &str) -> Response {
    let body = Json(ErrorBody {
        error: message.to_string(),
    });
    (StatusCode::OK, body).into_response()
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        ApiError::Internal(value)
    }
}
