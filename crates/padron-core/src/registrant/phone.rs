use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Digit inserted between country and area code when addressing a mobile
/// line over the messaging channel. Never part of the canonical form.
const MOBILE_INDICATOR: char = '9';

/// Phone number split the way registrants enter it: country code (1-3
/// digits), area code (2-4 digits) and an 8-digit subscriber number.
/// Non-digit characters are stripped before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    country: String,
    area: String,
    subscriber: String,
}

impl PhoneNumber {
    pub fn new(country: &str, area: &str, subscriber: &str) -> Result<Self, DomainError> {
        let country = digits_of(country);
        let area = digits_of(area);
        let subscriber = digits_of(subscriber);

        if country.is_empty() || country.len() > 3 {
            return Err(DomainError::InvalidCountryCode);
        }
        if area.len() < 2 || area.len() > 4 {
            return Err(DomainError::InvalidAreaCode);
        }
        if subscriber.len() != 8 {
            return Err(DomainError::InvalidSubscriberNumber);
        }

        Ok(Self {
            country,
            area,
            subscriber,
        })
    }

    /// Human-readable rendering shown back to the registrant.
    pub fn display(&self) -> String {
        format!(
            "+{} {} {}",
            self.country,
            self.area,
            group_subscriber(&self.subscriber)
        )
    }

    /// Canonical form used for backend matching. No indicator digit.
    pub fn dispatch(&self) -> String {
        format!("{}{}{}", self.country, self.area, self.subscriber)
    }

    /// Outbound-messaging form: indicator digit inserted between country
    /// and area code.
    pub fn messaging(&self) -> String {
        format!(
            "{}{}{}{}",
            self.country, MOBILE_INDICATOR, self.area, self.subscriber
        )
    }

    /// Partial rendering safe to show before the owner proved control of
    /// the number.
    pub fn masked(&self) -> MaskedPhone {
        let visible = &self.subscriber[self.subscriber.len() - 3..];
        MaskedPhone(format!(
            "+{} {} {}{}",
            self.country,
            "*".repeat(self.area.len()),
            "*".repeat(self.subscriber.len() - 3),
            visible
        ))
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }
}

/// Split an 8-digit subscriber number into two groups of four. Any other
/// length is returned untouched.
pub fn group_subscriber(subscriber: &str) -> String {
    if subscriber.len() == 8 {
        format!("{}-{}", &subscriber[..4], &subscriber[4..])
    } else {
        subscriber.to_string()
    }
}

pub fn digits_of(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Obscured phone rendering handed to the view layer for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedPhone(String);

impl MaskedPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MaskedPhone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
