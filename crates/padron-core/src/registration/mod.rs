use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{DomainEvent, RegistrationCompleted};
use crate::ids::RegistrationId;
use crate::registrant::{PhoneNumber, RegistrantIdentity};
use crate::verification::{OtpSession, SessionStatus};

/// A responsible party whose phone number was proven. Only a confirmed
/// session can produce one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    id: RegistrationId,
    registrant: RegistrantIdentity,
    phone: PhoneNumber,
    registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn from_session(
        session: &OtpSession,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<DomainEvent>), DomainError> {
        if session.status() != SessionStatus::Confirmed {
            return Err(DomainError::VerificationIncomplete);
        }
        let id = RegistrationId::new();
        let registration = Self {
            id: id.clone(),
            registrant: session.registrant().clone(),
            phone: session.phone().clone(),
            registered_at: now,
        };
        let events = vec![DomainEvent::RegistrationCompleted(RegistrationCompleted {
            registration_id: id,
            national_id: session.registrant().national_id().to_string(),
            occurred_at: now,
        })];
        Ok((registration, events))
    }

    pub fn id(&self) -> &RegistrationId {
        &self.id
    }

    pub fn registrant(&self) -> &RegistrantIdentity {
        &self.registrant
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}
