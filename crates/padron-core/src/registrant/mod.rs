pub mod national_id;
pub mod phone;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub use national_id::NationalId;
pub use phone::{MaskedPhone, PhoneNumber};

/// Who is being verified. Valid on construction; the OTP flow never starts
/// from an invalid identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantIdentity {
    name: String,
    surname: String,
    national_id: NationalId,
}

impl RegistrantIdentity {
    pub fn new(name: &str, surname: &str, national_id: NationalId) -> Result<Self, DomainError> {
        let name = name.trim();
        let surname = surname.trim();
        if name.chars().count() < 2 {
            return Err(DomainError::NameTooShort);
        }
        if surname.chars().count() < 2 {
            return Err(DomainError::SurnameTooShort);
        }
        Ok(Self {
            name: name.to_string(),
            surname: surname.to_string(),
            national_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn national_id(&self) -> &NationalId {
        &self.national_id
    }
}
