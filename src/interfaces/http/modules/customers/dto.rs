//! Customer DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Customer;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterCustomerRequest {
    #[validate(length(max = 20))]
    #[schema(example = "1032456789")]
    pub identification: String,
    #[validate(length(max = 100))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub phone: Option<String>,
}

/// Name and contact details; identification cannot change
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(max = 100))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerDto {
    pub id: i32,
    pub identification: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerDto {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            identification: c.identification,
            name: c.name,
            email: c.email,
            phone: c.phone,
            created_at: c.created_at,
        }
    }
}
