pub mod code;
pub mod countdown;
pub mod status;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{CodeConfirmed, CodeExpired, CodeRequested, DomainEvent};
use crate::ids::SessionId;
use crate::registrant::{PhoneNumber, RegistrantIdentity};

pub use code::OtpCode;
pub use status::SessionStatus;

/// How long a dispatched code stays valid.
pub const CODE_TTL_SECONDS: i64 = 120;

/// One verification attempt: a code was dispatched to a phone number and
/// must be confirmed before the deadline. Idle is the absence of a
/// session; a session is born `Pending` and ends `Confirmed` or `Expired`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpSession {
    id: SessionId,
    registrant: RegistrantIdentity,
    phone: PhoneNumber,
    status: SessionStatus,
    requested_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl OtpSession {
    pub fn start(
        registrant: RegistrantIdentity,
        phone: PhoneNumber,
        now: DateTime<Utc>,
    ) -> (Self, Vec<DomainEvent>) {
        let id = SessionId::new();
        let session = Self {
            id: id.clone(),
            registrant: registrant.clone(),
            phone: phone.clone(),
            status: SessionStatus::Pending,
            requested_at: now,
            expires_at: now + Duration::seconds(CODE_TTL_SECONDS),
            confirmed_at: None,
        };
        let events = vec![DomainEvent::CodeRequested(CodeRequested {
            session_id: id,
            national_id: registrant.national_id().to_string(),
            masked_phone: phone.masked().to_string(),
            occurred_at: now,
        })];
        (session, events)
    }

    /// Time-driven transition check. Fires `Pending -> Expired` exactly
    /// once; every other state (or an undue deadline) is a no-op.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> Vec<DomainEvent> {
        if self.status == SessionStatus::Pending && now >= self.expires_at {
            self.status = SessionStatus::Expired;
            return vec![DomainEvent::CodeExpired(CodeExpired {
                session_id: self.id.clone(),
                occurred_at: now,
            })];
        }
        vec![]
    }

    /// `Pending -> Confirmed`, only before the deadline. Confirming an
    /// already-confirmed session is a no-op; a lapsed or expired session
    /// reports `CodeExpired` so the caller can distinguish it from a
    /// rejected code.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<Vec<DomainEvent>, DomainError> {
        match self.status {
            SessionStatus::Expired => Err(DomainError::CodeExpired),
            SessionStatus::Confirmed => Ok(vec![]),
            SessionStatus::Pending => {
                if now >= self.expires_at {
                    return Err(DomainError::CodeExpired);
                }
                self.status = SessionStatus::Confirmed;
                self.confirmed_at = Some(now);
                Ok(vec![DomainEvent::CodeConfirmed(CodeConfirmed {
                    session_id: self.id.clone(),
                    national_id: self.registrant.national_id().to_string(),
                    occurred_at: now,
                })])
            }
        }
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u32 {
        match self.status {
            SessionStatus::Pending => countdown::remaining_seconds(now, self.expires_at),
            _ => 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn registrant(&self) -> &RegistrantIdentity {
        &self.registrant
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
