//! Trip REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{ScheduleTripRequest, TripDto, UpdateTripRequest};
use crate::application::TripScheduler;
use crate::domain::{DomainError, Trip};
use crate::interfaces::http::common::{
    domain_error, not_found, ok, ApiError, ApiResponse, ApiResult, EmptyData, ValidatedJson,
};

#[derive(Clone)]
pub struct TripState {
    pub trips: Arc<TripScheduler>,
}

/// Re-read a freshly written trip so the response carries live seat figures.
async fn view_of(scheduler: &TripScheduler, trip: Trip) -> Result<TripDto, ApiError> {
    scheduler
        .get(trip.id)
        .await
        .map_err(domain_error)?
        .map(Into::into)
        .ok_or_else(|| domain_error(DomainError::not_found("Trip", "id", trip.id)))
}

#[utoipa::path(
    post,
    path = "/api/v1/trips",
    tag = "Trips",
    request_body = ScheduleTripRequest,
    responses(
        (status = 201, description = "Trip scheduled", body = ApiResponse<TripDto>),
        (status = 400, description = "Invalid times, route or price"),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle busy in that window")
    )
)]
pub async fn schedule_trip(
    State(state): State<TripState>,
    ValidatedJson(request): ValidatedJson<ScheduleTripRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TripDto>>), ApiError> {
    let trip = state
        .trips
        .schedule(
            request.vehicle_id,
            &request.origin,
            &request.destination,
            request.departure_at,
            request.arrival_at,
            request.price,
        )
        .await
        .map_err(domain_error)?;
    let dto = view_of(&state.trips, trip).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

#[utoipa::path(
    get,
    path = "/api/v1/trips",
    tag = "Trips",
    responses(
        (status = 200, description = "All trips with seat availability", body = ApiResponse<Vec<TripDto>>)
    )
)]
pub async fn list_trips(State(state): State<TripState>) -> ApiResult<Vec<TripDto>> {
    let trips = state.trips.list().await.map_err(domain_error)?;
    ok(trips.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/trips/{id}",
    tag = "Trips",
    params(("id" = i32, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip details", body = ApiResponse<TripDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_trip(State(state): State<TripState>, Path(id): Path<i32>) -> ApiResult<TripDto> {
    match state.trips.get(id).await.map_err(domain_error)? {
        Some(view) => ok(view.into()),
        None => Err(not_found(format!("Trip {} not found", id))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/trips/{id}",
    tag = "Trips",
    params(("id" = i32, Path, description = "Trip ID")),
    request_body = UpdateTripRequest,
    responses(
        (status = 200, description = "Trip updated", body = ApiResponse<TripDto>),
        (status = 400, description = "Invalid times, route or price"),
        (status = 404, description = "Trip or vehicle not found"),
        (status = 409, description = "Departed, reserved or overlapping")
    )
)]
pub async fn update_trip(
    State(state): State<TripState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateTripRequest>,
) -> ApiResult<TripDto> {
    let trip = state
        .trips
        .update(id, request.into())
        .await
        .map_err(domain_error)?;
    ok(view_of(&state.trips, trip).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/trips/{id}",
    tag = "Trips",
    params(("id" = i32, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip cancelled", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Departed or has active reservations")
    )
)]
pub async fn cancel_trip(
    State(state): State<TripState>,
    Path(id): Path<i32>,
) -> ApiResult<EmptyData> {
    state.trips.cancel(id).await.map_err(domain_error)?;
    ok(EmptyData {})
}
