//! JSON body extractor that runs `validator` rules before the handler.
//!
//! Rejections share the `ApiResponse` envelope with domain errors: a body that
//! does not deserialize is 400, a body that breaks a field rule is 422.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::{ApiError, ApiResponse};

/// `Json<T>` plus `Validate::validate()`.
///
/// ```ignore
/// async fn register_vehicle(
///     State(state): State<VehicleState>,
///     ValidatedJson(req): ValidatedJson<RegisterVehicleRequest>,
/// ) -> ApiResult<VehicleDto> {
///     // `req.plate` is at most 10 characters here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    /// Body missing, not JSON, or not the expected shape.
    Malformed(JsonRejection),
    /// Deserialized, but a field rule failed.
    Invalid(ValidationErrors),
}

impl ValidatedJsonRejection {
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Malformed(rejection) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!(
                    "Invalid JSON: {}",
                    rejection.body_text()
                ))),
            ),
            Self::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error(describe(&errors))),
            ),
        }
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        self.into_api_error().into_response()
    }
}

/// `field: rule` pairs sorted by field name, joined with `; `.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Malformed)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}
