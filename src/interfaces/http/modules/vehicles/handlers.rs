//! Vehicle REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{RegisterVehicleRequest, UpdateVehicleRequest, VehicleDto};
use crate::application::VehicleManager;
use crate::interfaces::http::common::{
    domain_error, not_found, ok, ApiError, ApiResponse, ApiResult, EmptyData, ValidatedJson,
};

#[derive(Clone)]
pub struct VehicleState {
    pub vehicles: Arc<VehicleManager>,
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    tag = "Vehicles",
    request_body = RegisterVehicleRequest,
    responses(
        (status = 201, description = "Vehicle registered", body = ApiResponse<VehicleDto>),
        (status = 400, description = "Invalid data"),
        (status = 409, description = "Plate already registered")
    )
)]
pub async fn register_vehicle(
    State(state): State<VehicleState>,
    ValidatedJson(request): ValidatedJson<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleDto>>), ApiError> {
    let vehicle = state
        .vehicles
        .register(&request.plate, request.capacity, &request.vehicle_type)
        .await
        .map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(vehicle.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    tag = "Vehicles",
    responses(
        (status = 200, description = "All vehicles", body = ApiResponse<Vec<VehicleDto>>)
    )
)]
pub async fn list_vehicles(State(state): State<VehicleState>) -> ApiResult<Vec<VehicleDto>> {
    let vehicles = state.vehicles.list().await.map_err(domain_error)?;
    ok(vehicles.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{plate}",
    tag = "Vehicles",
    params(("plate" = String, Path, description = "Licence plate")),
    responses(
        (status = 200, description = "Vehicle details", body = ApiResponse<VehicleDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_vehicle(
    State(state): State<VehicleState>,
    Path(plate): Path<String>,
) -> ApiResult<VehicleDto> {
    match state.vehicles.get(&plate).await.map_err(domain_error)? {
        Some(vehicle) => ok(vehicle.into()),
        None => Err(not_found(format!("Vehicle {} not found", plate))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/vehicles/{plate}",
    tag = "Vehicles",
    params(("plate" = String, Path, description = "Licence plate")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = ApiResponse<VehicleDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Vehicle has upcoming trips")
    )
)]
pub async fn update_vehicle(
    State(state): State<VehicleState>,
    Path(plate): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateVehicleRequest>,
) -> ApiResult<VehicleDto> {
    let vehicle = state
        .vehicles
        .update(&plate, request.capacity, &request.vehicle_type)
        .await
        .map_err(domain_error)?;
    ok(vehicle.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{plate}",
    tag = "Vehicles",
    params(("plate" = String, Path, description = "Licence plate")),
    responses(
        (status = 200, description = "Vehicle removed", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Vehicle has upcoming trips")
    )
)]
pub async fn delete_vehicle(
    State(state): State<VehicleState>,
    Path(plate): Path<String>,
) -> ApiResult<EmptyData> {
    state.vehicles.remove(&plate).await.map_err(domain_error)?;
    ok(EmptyData {})
}
