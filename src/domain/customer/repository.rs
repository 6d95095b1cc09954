//! Customer repository interface

use async_trait::async_trait;

use super::model::Customer;
use crate::domain::DomainResult;

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert a new customer. A duplicate identification yields `Conflict`.
    async fn save(&self, customer: Customer) -> DomainResult<Customer>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>>;

    async fn find_by_identification(&self, identification: &str)
        -> DomainResult<Option<Customer>>;

    async fn find_all(&self) -> DomainResult<Vec<Customer>>;

    async fn update(&self, customer: Customer) -> DomainResult<Customer>;

    async fn delete(&self, id: i32) -> DomainResult<()>;
}
