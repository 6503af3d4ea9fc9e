use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ids::{ReferralId, RegistrationId, SessionId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DomainEvent {
    CodeRequested(CodeRequested),
    CodeConfirmed(CodeConfirmed),
    CodeExpired(CodeExpired),
    CredentialsIssued(CredentialsIssued),
    RegistrationCompleted(RegistrationCompleted),
    ReferralRecorded(ReferralRecorded),
    VoterCheckedIn(VoterCheckedIn),
}

impl DomainEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::CodeRequested(e) => e.occurred_at,
            Self::CodeConfirmed(e) => e.occurred_at,
            Self::CodeExpired(e) => e.occurred_at,
            Self::CredentialsIssued(e) => e.occurred_at,
            Self::RegistrationCompleted(e) => e.occurred_at,
            Self::ReferralRecorded(e) => e.occurred_at,
            Self::VoterCheckedIn(e) => e.occurred_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CodeRequested(_) => "code.requested",
            Self::CodeConfirmed(_) => "code.confirmed",
            Self::CodeExpired(_) => "code.expired",
            Self::CredentialsIssued(_) => "credentials.issued",
            Self::RegistrationCompleted(_) => "registration.completed",
            Self::ReferralRecorded(_) => "referral.recorded",
            Self::VoterCheckedIn(_) => "voter.checked_in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeRequested {
    pub session_id: SessionId,
    pub national_id: String,
    pub masked_phone: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeConfirmed {
    pub session_id: SessionId,
    pub national_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeExpired {
    pub session_id: SessionId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialsIssued {
    pub national_id: String,
    pub reference_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationCompleted {
    pub registration_id: RegistrationId,
    pub national_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralRecorded {
    pub referral_id: ReferralId,
    pub document: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoterCheckedIn {
    pub document: String,
    pub verified_by: String,
    pub occurred_at: DateTime<Utc>,
}
