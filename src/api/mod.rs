//! REST API module.
//!
//! Public routes serve the scoreboard, gallery, venue board and unit self-service; admin
//! routes sit behind the pre-shared key.

mod admin;
mod events;
mod gallery;
mod scoreboard;
mod session;
mod units;
mod venue;

pub use admin::*;
pub use events::*;
pub use gallery::*;
pub use scoreboard::*;
pub use session::*;
pub use units::*;
pub use venue::*;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// JSON body extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}
