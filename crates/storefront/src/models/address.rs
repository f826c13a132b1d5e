//! Shipping address types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::{AddressId, UserId};

/// A saved shipping address. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Short label such as "Home" or "Office".
    pub label: String,
    pub name: String,
    pub address_line: String,
    pub city: String,
    pub pincode: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Raw address form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address_line: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub phone: String,
}

/// Errors from validating an [`AddressForm`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressValidationError {
    /// A required field was empty or whitespace.
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A validated address ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub label: String,
    pub name: String,
    pub address_line: String,
    pub city: String,
    pub pincode: String,
    pub phone: String,
}

impl AddressForm {
    /// Trim every field and require all of them to be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`AddressValidationError::MissingField`] naming the first
    /// empty field.
    pub fn validate(&self) -> Result<NewAddress, AddressValidationError> {
        fn required(value: &str, field: &'static str) -> Result<String, AddressValidationError> {
            let value = value.trim();
            if value.is_empty() {
                return Err(AddressValidationError::MissingField(field));
            }
            Ok(value.to_string())
        }

        Ok(NewAddress {
            label: required(&self.label, "label")?,
            name: required(&self.name, "name")?,
            address_line: required(&self.address_line, "address line")?,
            city: required(&self.city, "city")?,
            pincode: required(&self.pincode, "pincode")?,
            phone: required(&self.phone, "phone")?,
        })
    }
}
