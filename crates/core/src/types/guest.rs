//! Guest checkout contact and address data.
//!
//! Collected only for the anonymous checkout flow and persisted locally
//! just long enough to place the order. Field names mirror the backend's
//! Spanish contract so the stored record is the wire record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for guest checkout data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuestInfoError {
    #[error("el correo electrónico es obligatorio")]
    MissingEmail,
    #[error("el nombre es obligatorio")]
    MissingName,
    #[error("la dirección está incompleta: falta {0}")]
    IncompleteAddress(&'static str),
}

/// Structured delivery address (Costa Rican administrative divisions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestAddress {
    pub provincia: String,
    pub canton: String,
    pub distrito: String,
    #[serde(default)]
    pub barrio: String,
    /// Free-form directions ("señas") - required, addresses here are
    /// descriptive rather than numbered.
    pub senas: String,
    #[serde(default, rename = "codigoPostal")]
    pub codigo_postal: String,
    #[serde(default)]
    pub referencia: String,
}

impl GuestAddress {
    /// Structural completeness: provincia, canton, distrito, and senas
    /// must all be non-empty.
    ///
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn validate(&self) -> Result<(), GuestInfoError> {
        for (value, field) in [
            (&self.provincia, "provincia"),
            (&self.canton, "cantón"),
            (&self.distrito, "distrito"),
            (&self.senas, "señas"),
        ] {
            if value.trim().is_empty() {
                return Err(GuestInfoError::IncompleteAddress(field));
            }
        }
        Ok(())
    }
}

/// Guest checkout contact data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub email: String,
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
    pub direccion: GuestAddress,
}

impl GuestInfo {
    /// Check the fields required to place a guest order: email, name,
    /// and a structurally complete address.
    ///
    /// # Errors
    ///
    /// Returns the first failing requirement.
    pub fn validate(&self) -> Result<(), GuestInfoError> {
        if self.email.trim().is_empty() {
            return Err(GuestInfoError::MissingEmail);
        }
        if self.nombre.trim().is_empty() {
            return Err(GuestInfoError::MissingName);
        }
        self.direccion.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_info() -> GuestInfo {
        GuestInfo {
            email: "ana@example.com".to_string(),
            nombre: "Ana Rojas".to_string(),
            telefono: "8888-8888".to_string(),
            direccion: GuestAddress {
                provincia: "San José".to_string(),
                canton: "Escazú".to_string(),
                distrito: "San Rafael".to_string(),
                barrio: "Los Laureles".to_string(),
                senas: "200m norte de la iglesia".to_string(),
                codigo_postal: "10203".to_string(),
                referencia: String::new(),
            },
        }
    }

    #[test]
    fn test_valid_info_passes() {
        assert_eq!(valid_info().validate(), Ok(()));
    }

    #[test]
    fn test_missing_email_rejected() {
        let mut info = valid_info();
        info.email = "  ".to_string();
        assert_eq!(info.validate(), Err(GuestInfoError::MissingEmail));
    }

    #[test]
    fn test_missing_name_rejected() {
        let mut info = valid_info();
        info.nombre = String::new();
        assert_eq!(info.validate(), Err(GuestInfoError::MissingName));
    }

    #[test]
    fn test_empty_senas_rejected() {
        let mut info = valid_info();
        info.direccion.senas = String::new();
        assert_eq!(
            info.validate(),
            Err(GuestInfoError::IncompleteAddress("señas"))
        );
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let mut info = valid_info();
        info.telefono = String::new();
        info.direccion.barrio = String::new();
        info.direccion.codigo_postal = String::new();
        assert_eq!(info.validate(), Ok(()));
    }
}
