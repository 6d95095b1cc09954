//! Reservation REST API handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    BookReservationRequest, ModifyReservationRequest, ReservationDto, SetStateRequest,
};
use crate::application::{CustomerDirectory, ReservationEngine, TripScheduler};
use crate::domain::{Customer, Reservation, ReservationChanges, Trip};
use crate::interfaces::http::common::{
    domain_error, not_found, ok, ApiError, ApiResponse, ApiResult, ValidatedJson,
};

/// Application state for reservation handlers.
#[derive(Clone)]
pub struct ReservationAppState {
    pub reservations: Arc<ReservationEngine>,
    pub trips: Arc<TripScheduler>,
    pub customers: Arc<CustomerDirectory>,
}

/// Resolves trip and customer ids into display summaries, once per id.
struct Resolver<'a> {
    state: &'a ReservationAppState,
    trips: HashMap<i32, Option<Trip>>,
    customers: HashMap<i32, Option<Customer>>,
}

impl<'a> Resolver<'a> {
    fn new(state: &'a ReservationAppState) -> Self {
        Self {
            state,
            trips: HashMap::new(),
            customers: HashMap::new(),
        }
    }

    async fn dto(&mut self, r: Reservation) -> Result<ReservationDto, ApiError> {
        if !self.trips.contains_key(&r.trip_id) {
            let trip = self
                .state
                .trips
                .get(r.trip_id)
                .await
                .map_err(domain_error)?
                .map(|view| view.trip);
            self.trips.insert(r.trip_id, trip);
        }
        if !self.customers.contains_key(&r.customer_id) {
            let customer = self
                .state
                .customers
                .get_by_id(r.customer_id)
                .await
                .map_err(domain_error)?;
            self.customers.insert(r.customer_id, customer);
        }
        let trip = self.trips.get(&r.trip_id).and_then(Option::as_ref);
        let customer = self.customers.get(&r.customer_id).and_then(Option::as_ref);
        Ok(ReservationDto::new(r, trip, customer))
    }

    async fn all(&mut self, rows: Vec<Reservation>) -> Result<Vec<ReservationDto>, ApiError> {
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(self.dto(r).await?);
        }
        Ok(out)
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    request_body = BookReservationRequest,
    responses(
        (status = 201, description = "Seat booked", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Trip already departed"),
        (status = 404, description = "Trip or customer not found"),
        (status = 409, description = "No seats left or duplicate booking")
    )
)]
pub async fn book_reservation(
    State(state): State<ReservationAppState>,
    ValidatedJson(request): ValidatedJson<BookReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationDto>>), ApiError> {
    let reservation = state
        .reservations
        .book(request.trip_id, request.customer_id)
        .await
        .map_err(domain_error)?;
    let dto = Resolver::new(&state).dto(reservation).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "Reservations",
    responses(
        (status = 200, description = "All reservations", body = ApiResponse<Vec<ReservationDto>>)
    )
)]
pub async fn list_reservations(
    State(state): State<ReservationAppState>,
) -> ApiResult<Vec<ReservationDto>> {
    let rows = state.reservations.list().await.map_err(domain_error)?;
    ok(Resolver::new(&state).all(rows).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{identification}/reservations",
    tag = "Reservations",
    params(("identification" = String, Path, description = "Customer identification")),
    responses(
        (status = 200, description = "Reservations held by the customer", body = ApiResponse<Vec<ReservationDto>>),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn list_customer_reservations(
    State(state): State<ReservationAppState>,
    Path(identification): Path<String>,
) -> ApiResult<Vec<ReservationDto>> {
    let customer = state
        .customers
        .get(&identification)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| not_found(format!("Customer {} not found", identification)))?;
    let rows = state
        .reservations
        .list_by_customer(customer.id)
        .await
        .map_err(domain_error)?;
    ok(Resolver::new(&state).all(rows).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation details", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_reservation(
    State(state): State<ReservationAppState>,
    Path(id): Path<i32>,
) -> ApiResult<ReservationDto> {
    match state.reservations.get(id).await.map_err(domain_error)? {
        Some(r) => ok(Resolver::new(&state).dto(r).await?),
        None => Err(not_found(format!("Reservation {} not found", id))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = ModifyReservationRequest,
    responses(
        (status = 200, description = "Reservation modified", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Trip departed or illegal transition")
    )
)]
pub async fn modify_reservation(
    State(state): State<ReservationAppState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ModifyReservationRequest>,
) -> ApiResult<ReservationDto> {
    let changes = ReservationChanges {
        status: request.status.map(Into::into),
    };
    let r = state
        .reservations
        .modify(id, changes)
        .await
        .map_err(domain_error)?;
    ok(Resolver::new(&state).dto(r).await?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}/state",
    tag = "Reservations",
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = SetStateRequest,
    responses(
        (status = 200, description = "State changed", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Illegal transition")
    )
)]
pub async fn set_reservation_state(
    State(state): State<ReservationAppState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<SetStateRequest>,
) -> ApiResult<ReservationDto> {
    let r = state
        .reservations
        .set_state(id, request.status.into())
        .await
        .map_err(domain_error)?;
    ok(Resolver::new(&state).dto(r).await?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}/cancel",
    tag = "Reservations",
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Trip departed or reservation past cancellation"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already cancelled")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationAppState>,
    Path(id): Path<i32>,
) -> ApiResult<ReservationDto> {
    let r = state.reservations.cancel(id).await.map_err(domain_error)?;
    ok(Resolver::new(&state).dto(r).await?)
}
