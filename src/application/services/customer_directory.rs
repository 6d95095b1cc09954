//! Customer registration and lookup

use std::sync::Arc;

use tracing::info;

use crate::domain::{Customer, DomainError, DomainResult, RepositoryProvider};
use crate::shared::SharedClock;

pub struct CustomerDirectory {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
}

impl CustomerDirectory {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        Self { repos, clock }
    }

    pub async fn register(
        &self,
        identification: &str,
        name: &str,
        email: Option<String>,
        phone: Option<String>,
    ) -> DomainResult<Customer> {
        let customer = Customer::new(identification, name, email, phone, self.clock.now())?;

        if self
            .repos
            .customers()
            .find_by_identification(&customer.identification)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "Customer with identification {} already exists",
                customer.identification
            )));
        }

        let saved = self.repos.customers().save(customer).await?;
        info!(customer_id = saved.id, "Customer registered");
        Ok(saved)
    }

    pub async fn get(&self, identification: &str) -> DomainResult<Option<Customer>> {
        self.repos
            .customers()
            .find_by_identification(identification.trim())
            .await
    }

    pub async fn get_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        self.repos.customers().find_by_id(id).await
    }

    pub async fn list(&self) -> DomainResult<Vec<Customer>> {
        self.repos.customers().find_all().await
    }

    /// Replace name and contact details. Identification is immutable.
    pub async fn update(
        &self,
        identification: &str,
        name: &str,
        email: Option<String>,
        phone: Option<String>,
    ) -> DomainResult<Customer> {
        let mut customer = self.require(identification).await?;
        customer.apply_contact(name, email, phone)?;
        let saved = self.repos.customers().update(customer).await?;
        info!(customer_id = saved.id, "Customer updated");
        Ok(saved)
    }

    /// Delete a customer with no reservation history.
    pub async fn remove(&self, identification: &str) -> DomainResult<()> {
        let customer = self.require(identification).await?;
        if self
            .repos
            .reservations()
            .exists_for_customer(customer.id)
            .await?
        {
            return Err(DomainError::conflict(format!(
                "Customer {} has reservations and cannot be removed",
                customer.identification
            )));
        }
        self.repos.customers().delete(customer.id).await?;
        info!(customer_id = customer.id, "Customer removed");
        Ok(())
    }

    async fn require(&self, identification: &str) -> DomainResult<Customer> {
        let identification = identification.trim();
        self.repos
            .customers()
            .find_by_identification(identification)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", "identification", identification))
    }
}
