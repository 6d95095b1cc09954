//! Customer domain entity

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, DomainResult};

pub const MAX_IDENTIFICATION_LEN: usize = 20;
pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: i32,
    /// External identification (national id, passport, ...), unique
    pub identification: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        identification: impl Into<String>,
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let customer = Self {
            id: 0,
            identification: identification.into().trim().to_string(),
            name: name.into().trim().to_string(),
            email: normalize_optional(email),
            phone: normalize_optional(phone),
            created_at,
        };
        customer.validate()?;
        Ok(customer)
    }

    /// Replace the mutable contact fields. Identification never changes.
    pub fn apply_contact(
        &mut self,
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> DomainResult<()> {
        self.name = name.into().trim().to_string();
        self.email = normalize_optional(email);
        self.phone = normalize_optional(phone);
        self.validate()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.identification.is_empty() {
            return Err(DomainError::invalid("identification is required"));
        }
        if self.identification.chars().count() > MAX_IDENTIFICATION_LEN {
            return Err(DomainError::invalid(format!(
                "identification must be at most {} characters",
                MAX_IDENTIFICATION_LEN
            )));
        }
        if self.name.is_empty() || self.name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::invalid(format!(
                "name must be 1..={} characters",
                MAX_NAME_LEN
            )));
        }
        Ok(())
    }
}

fn normalize_optional(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contact_fields_become_none() {
        let c = Customer::new("CC-1", "Ana", Some("  ".into()), None, Utc::now()).unwrap();
        assert_eq!(c.email, None);
        assert_eq!(c.phone, None);
    }

    #[test]
    fn identification_is_required() {
        let err = Customer::new(" ", "Ana", None, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[test]
    fn apply_contact_keeps_identification() {
        let mut c = Customer::new("CC-1", "Ana", None, None, Utc::now()).unwrap();
        c.apply_contact("Ana María", Some("ana@example.com".into()), None)
            .unwrap();
        assert_eq!(c.identification, "CC-1");
        assert_eq!(c.name, "Ana María");
        assert_eq!(c.email.as_deref(), Some("ana@example.com"));
    }
}
