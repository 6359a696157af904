//! Ride request endpoint

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::presentation::models::{ApiResponse, CreateRideRequest, RideCreated, error_response};

const MAX_PASSENGERS: u8 = 6;

/// Accept a ride request.
///
/// Runs behind the idempotency middleware, so a retried submission with the
/// same key never reaches this handler twice. The key is claimed before the
/// body is validated, so clients must mint a new key after a 4xx.
pub async fn create_ride(Json(request): Json<CreateRideRequest>) -> Response {
    if !request.pickup.is_valid() || !request.dropoff.is_valid() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid coordinates");
    }

    if request.passengers == 0 || request.passengers > MAX_PASSENGERS {
        return error_response(StatusCode::BAD_REQUEST, "Invalid passenger count");
    }

    let ride = RideCreated {
        ride_id: Uuid::new_v4(),
        status: "requested",
        pickup: request.pickup,
        dropoff: request.dropoff,
        passengers: request.passengers,
    };

    tracing::info!(ride_id = %ride.ride_id, passengers = ride.passengers, "Ride requested");

    (
        StatusCode::CREATED,
        Json(ApiResponse::ok("Ride requested", ride)),
    )
        .into_response()
}
