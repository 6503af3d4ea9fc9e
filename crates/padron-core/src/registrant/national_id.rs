use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::phone::digits_of;

/// National identity document number, 7 to 9 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NationalId(String);

impl NationalId {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let digits = digits_of(raw);
        if digits.len() < 7 || digits.len() > 9 {
            return Err(DomainError::InvalidNationalId);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NationalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
