use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::registrant::phone::digits_of;

/// One-time confirmation code as delivered over the messaging channel:
/// exactly two digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let digits = digits_of(raw);
        if digits.len() != 2 {
            return Err(DomainError::InvalidCode);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
