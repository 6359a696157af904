//! API request and response models

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope shared by every API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Build a `{ success: false, message }` response with `status`
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ApiResponse::failure(message))).into_response()
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub version: &'static str,
}

/// A point on the map
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Request to book a ride
#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    #[serde(default = "default_passengers")]
    pub passengers: u8,
}

fn default_passengers() -> u8 {
    1
}

/// Accepted ride request
#[derive(Debug, Serialize)]
pub struct RideCreated {
    pub ride_id: Uuid,
    pub status: &'static str,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub passengers: u8,
}
