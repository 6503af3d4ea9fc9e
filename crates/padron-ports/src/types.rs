use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use padron_core::registrant::MaskedPhone;

/// Enrollment form data as typed by the operator, before domain
/// validation.
#[derive(Debug, Clone, Default)]
pub struct RawEnrollment {
    pub name: String,
    pub surname: String,
    pub national_id: String,
    pub country_code: String,
    pub area_code: String,
    pub subscriber_number: String,
}

/// Payload for the send-code collaborator. Carries the messaging form of
/// the phone number.
#[derive(Debug, Clone, Serialize)]
pub struct CodeDispatch {
    pub name: String,
    pub surname: String,
    pub national_id: String,
    pub messaging_phone: String,
}

/// Payload for the confirm-code collaborator. Carries the canonical
/// dispatch form.
#[derive(Debug, Clone, Serialize)]
pub struct CodeCheck {
    pub national_id: String,
    pub dispatch_phone: String,
    pub code: String,
}

/// Payload for the issue-credentials collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialIssue {
    pub national_id: String,
    pub dispatch_phone: String,
}

/// Delivery metadata returned by the credential collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialReceipt {
    pub reference_id: Option<String>,
}

/// Referral form data before domain validation.
#[derive(Debug, Clone, Default)]
pub struct RawReferral {
    pub document: String,
    pub superior_id: i64,
    pub intermediate: String,
    pub direct: String,
    pub created_by: String,
}

/// View-facing snapshot of the verification flow.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationPhase {
    Idle,
    AwaitingCode {
        masked_phone: MaskedPhone,
        remaining_seconds: u32,
        expires_at: DateTime<Utc>,
    },
    Expired,
    Confirmed,
}
