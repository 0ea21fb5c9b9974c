use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;

use crate::entity::{characters, planets, users};

/// Users serialize through an explicit allow-list; `password` never leaves
/// the process.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub is_active: bool,
}

impl From<users::Model> for UserResponse {
    fn from(m: users::Model) -> Self {
        UserResponse {
            id: m.id,
            email: m.email,
            is_active: m.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanetResponse {
    pub id: i32,
    pub name: String,
    pub climate: Option<String>,
    pub terrain: Option<String>,
}

impl From<planets::Model> for PlanetResponse {
    fn from(m: planets::Model) -> Self {
        PlanetResponse {
            id: m.id,
            name: m.name,
            climate: m.climate,
            terrain: m.terrain,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub id: i32,
    pub name: String,
    pub height: Option<String>,
    pub mass: Option<String>,
}

impl From<characters::Model> for CharacterResponse {
    fn from(m: characters::Model) -> Self {
        CharacterResponse {
            id: m.id,
            name: m.name,
            height: m.height,
            mass: m.mass,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorite_planets: Vec<PlanetResponse>,
    pub favorite_characters: Vec<CharacterResponse>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Single error shape for every failure path; handlers build these instead
/// of ad-hoc status/body tuples.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    /// Logs the real error, hands the client a generic message.
    pub fn internal(err: anyhow::Error) -> Self {
        error!("internal error: {err:#}");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
