//! Customer REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{CustomerDto, RegisterCustomerRequest, UpdateCustomerRequest};
use crate::application::CustomerDirectory;
use crate::interfaces::http::common::{
    domain_error, not_found, ok, ApiError, ApiResponse, ApiResult, EmptyData, ValidatedJson,
};

#[derive(Clone)]
pub struct CustomerState {
    pub customers: Arc<CustomerDirectory>,
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "Customers",
    request_body = RegisterCustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = ApiResponse<CustomerDto>),
        (status = 400, description = "Invalid data"),
        (status = 409, description = "Identification already registered")
    )
)]
pub async fn register_customer(
    State(state): State<CustomerState>,
    ValidatedJson(request): ValidatedJson<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerDto>>), ApiError> {
    let customer = state
        .customers
        .register(
            &request.identification,
            &request.name,
            request.email,
            request.phone,
        )
        .await
        .map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(customer.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "All customers", body = ApiResponse<Vec<CustomerDto>>)
    )
)]
pub async fn list_customers(State(state): State<CustomerState>) -> ApiResult<Vec<CustomerDto>> {
    let customers = state.customers.list().await.map_err(domain_error)?;
    ok(customers.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{identification}",
    tag = "Customers",
    params(("identification" = String, Path, description = "Customer identification")),
    responses(
        (status = 200, description = "Customer details", body = ApiResponse<CustomerDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_customer(
    State(state): State<CustomerState>,
    Path(identification): Path<String>,
) -> ApiResult<CustomerDto> {
    match state
        .customers
        .get(&identification)
        .await
        .map_err(domain_error)?
    {
        Some(customer) => ok(customer.into()),
        None => Err(not_found(format!("Customer {} not found", identification))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{identification}",
    tag = "Customers",
    params(("identification" = String, Path, description = "Customer identification")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_customer(
    State(state): State<CustomerState>,
    Path(identification): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCustomerRequest>,
) -> ApiResult<CustomerDto> {
    let customer = state
        .customers
        .update(&identification, &request.name, request.email, request.phone)
        .await
        .map_err(domain_error)?;
    ok(customer.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{identification}",
    tag = "Customers",
    params(("identification" = String, Path, description = "Customer identification")),
    responses(
        (status = 200, description = "Customer removed", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Customer has reservations")
    )
)]
pub async fn delete_customer(
    State(state): State<CustomerState>,
    Path(identification): Path<String>,
) -> ApiResult<EmptyData> {
    state
        .customers
        .remove(&identification)
        .await
        .map_err(domain_error)?;
    ok(EmptyData {})
}
