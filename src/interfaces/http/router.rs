//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    http::{StatusCode, Uri},
    middleware,
    routing::{get, patch},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::BookingServices;
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::modules::{
    customers, health, metrics, request_id::request_id_middleware, reservations, trips, vehicles,
};

/// Unified state for every route. Axum extracts the specific handler
/// state via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub services: BookingServices,
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
    pub metrics: PrometheusHandle,
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<ApiState> for vehicles::VehicleState {
    fn from_ref(s: &ApiState) -> Self {
        vehicles::VehicleState {
            vehicles: Arc::clone(&s.services.vehicles),
        }
    }
}

impl FromRef<ApiState> for customers::CustomerState {
    fn from_ref(s: &ApiState) -> Self {
        customers::CustomerState {
            customers: Arc::clone(&s.services.customers),
        }
    }
}

impl FromRef<ApiState> for trips::TripState {
    fn from_ref(s: &ApiState) -> Self {
        trips::TripState {
            trips: Arc::clone(&s.services.trips),
        }
    }
}

impl FromRef<ApiState> for reservations::ReservationAppState {
    fn from_ref(s: &ApiState) -> Self {
        reservations::ReservationAppState {
            reservations: Arc::clone(&s.services.reservations),
            trips: Arc::clone(&s.services.trips),
            customers: Arc::clone(&s.services.customers),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for metrics::MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        metrics::MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Vehicles
        vehicles::register_vehicle,
        vehicles::list_vehicles,
        vehicles::get_vehicle,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        // Customers
        customers::register_customer,
        customers::list_customers,
        customers::get_customer,
        customers::update_customer,
        customers::delete_customer,
        // Trips
        trips::schedule_trip,
        trips::list_trips,
        trips::get_trip,
        trips::update_trip,
        trips::cancel_trip,
        // Reservations
        reservations::book_reservation,
        reservations::list_reservations,
        reservations::list_customer_reservations,
        reservations::get_reservation,
        reservations::modify_reservation,
        reservations::set_reservation_state,
        reservations::cancel_reservation,
    ),
    components(
        schemas(
            // Common
            ApiResponse<EmptyData>,
            EmptyData,
            health::HealthResponse,
            health::ComponentHealth,
            // Vehicles
            vehicles::RegisterVehicleRequest,
            vehicles::UpdateVehicleRequest,
            vehicles::VehicleDto,
            // Customers
            customers::RegisterCustomerRequest,
            customers::UpdateCustomerRequest,
            customers::CustomerDto,
            // Trips
            trips::ScheduleTripRequest,
            trips::UpdateTripRequest,
            trips::TripDto,
            // Reservations
            reservations::ReservationStatusDto,
            reservations::BookReservationRequest,
            reservations::ModifyReservationRequest,
            reservations::SetStateRequest,
            reservations::TripSummary,
            reservations::CustomerSummary,
            reservations::ReservationDto,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Vehicles", description = "Fleet registry: plates, capacity and type"),
        (name = "Customers", description = "Customer directory keyed by identification"),
        (name = "Trips", description = "Trip scheduling with vehicle overlap checks and live seat counts"),
        (name = "Reservations", description = "Seat booking and the reservation lifecycle"),
    ),
    info(
        title = "Travel Booking API",
        version = "1.0.0",
        description = "REST API for scheduling vehicle trips and booking seats",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

async fn route_not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("No route for {}", uri.path()))),
    )
}

/// Create the API router with all routes
pub fn create_api_router(
    services: BookingServices,
    db: DatabaseConnection,
    metrics_handle: PrometheusHandle,
) -> Router {
    let state = ApiState {
        services,
        db,
        started_at: Arc::new(Instant::now()),
        metrics: metrics_handle,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes =
        SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        // Health & metrics
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        // Vehicles
        .route(
            "/api/v1/vehicles",
            get(vehicles::list_vehicles).post(vehicles::register_vehicle),
        )
        .route(
            "/api/v1/vehicles/{plate}",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        // Customers
        .route(
            "/api/v1/customers",
            get(customers::list_customers).post(customers::register_customer),
        )
        .route(
            "/api/v1/customers/{identification}",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route(
            "/api/v1/customers/{identification}/reservations",
            get(reservations::list_customer_reservations),
        )
        // Trips
        .route(
            "/api/v1/trips",
            get(trips::list_trips).post(trips::schedule_trip),
        )
        .route(
            "/api/v1/trips/{id}",
            get(trips::get_trip)
                .put(trips::update_trip)
                .delete(trips::cancel_trip),
        )
        // Reservations
        .route(
            "/api/v1/reservations",
            get(reservations::list_reservations).post(reservations::book_reservation),
        )
        .route(
            "/api/v1/reservations/{id}",
            get(reservations::get_reservation).put(reservations::modify_reservation),
        )
        .route(
            "/api/v1/reservations/{id}/state",
            patch(reservations::set_reservation_state),
        )
        .route(
            "/api/v1/reservations/{id}/cancel",
            patch(reservations::cancel_reservation),
        )
        .fallback(route_not_found)
        .with_state(state)
        // Swagger UI
        .merge(swagger_routes)
        // Middleware
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use sea_orm_migration::MigratorTrait;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
    use crate::shared::FixedClock;

    async fn app() -> Router {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap(),
        ));
        let services = BookingServices::new(
            Arc::new(SeaOrmRepositoryProvider::new(db.clone())),
            clock,
        );
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_api_router(services, db, handle)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn seed(app: &Router) -> (i64, i64, i64) {
        let (status, vehicle) = call(
            app,
            "POST",
            "/api/v1/vehicles",
            Some(json!({"plate": "ABC123", "capacity": 1, "vehicle_type": "van"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, customer) = call(
            app,
            "POST",
            "/api/v1/customers",
            Some(json!({"identification": "1032", "name": "Ana Ruiz", "email": "ana@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, trip) = call(
            app,
            "POST",
            "/api/v1/trips",
            Some(json!({
                "vehicle_id": vehicle["data"]["id"],
                "origin": "Cali",
                "destination": "Pasto",
                "departure_at": "2030-01-02T08:00:00Z",
                "arrival_at": "2030-01-02T16:00:00Z",
                "price": "45.00"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            vehicle["data"]["id"].as_i64().unwrap(),
            customer["data"]["id"].as_i64().unwrap(),
            trip["data"]["id"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn health_reports_database_ok() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_vehicle_is_404_and_duplicate_plate_is_409() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/api/v1/vehicles/NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        seed(&app).await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/vehicles",
            Some(json!({"plate": "ABC123", "capacity": 10, "vehicle_type": "bus"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn field_rules_map_to_400_and_422() {
        let app = app().await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/vehicles",
            Some(json!({"plate": "XYZ9", "capacity": 0, "vehicle_type": "van"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/vehicles",
            Some(json!({"plate": "WAY-TOO-LONG-PLATE", "capacity": 4, "vehicle_type": "van"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn booking_embeds_summaries_and_respects_capacity() {
        let app = app().await;
        let (_, customer_id, trip_id) = seed(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/reservations",
            Some(json!({"trip_id": trip_id, "customer_id": customer_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["trip"]["origin"], "Cali");
        assert_eq!(body["data"]["customer"]["identification"], "1032");

        let (_, trip) = call(&app, "GET", &format!("/api/v1/trips/{}", trip_id), None).await;
        assert_eq!(trip["data"]["available_seats"], 0);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/customers",
            Some(json!({"identification": "2040", "name": "Luis Mora"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, other) = call(&app, "GET", "/api/v1/customers/2040", None).await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/reservations",
            Some(json!({"trip_id": trip_id, "customer_id": other["data"]["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, list) = call(&app, "GET", "/api/v1/customers/1032/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_twice_is_409() {
        let app = app().await;
        let (_, customer_id, trip_id) = seed(&app).await;
        let (_, booked) = call(
            &app,
            "POST",
            "/api/v1/reservations",
            Some(json!({"trip_id": trip_id, "customer_id": customer_id})),
        )
        .await;
        let uri = format!("/api/v1/reservations/{}/cancel", booked["data"]["id"]);

        let (status, body) = call(&app, "PATCH", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");

        let (status, _) = call(&app, "PATCH", &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn illegal_state_change_is_409() {
        let app = app().await;
        let (_, customer_id, trip_id) = seed(&app).await;
        let (_, booked) = call(
            &app,
            "POST",
            "/api/v1/reservations",
            Some(json!({"trip_id": trip_id, "customer_id": customer_id})),
        )
        .await;
        let uri = format!("/api/v1/reservations/{}/state", booked["data"]["id"]);

        let (status, _) = call(&app, "PATCH", &uri, Some(json!({"status": "completed"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&app, "PATCH", &uri, Some(json!({"status": "confirmed"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "confirmed");
    }

    #[tokio::test]
    async fn vehicle_with_trips_is_locked() {
        let app = app().await;
        seed(&app).await;
        let (status, _) = call(&app, "DELETE", "/api/v1/vehicles/ABC123", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_route_is_404_with_envelope() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/api/v1/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn openapi_document_lists_booking_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/reservations/{id}/cancel"));
        assert!(doc.paths.paths.contains_key("/api/v1/trips/{id}"));
    }
}
