use async_trait::async_trait;
use chrono::{DateTime, Utc};

use padron_core::ids::{ReferralId, RegistrationId};
use padron_core::registrant::MaskedPhone;
use padron_core::roll::{CheckIn, RollEntry};

use crate::error::{DeskError, FlowError};
use crate::types::{RawEnrollment, RawReferral, VerificationPhase};

/// The registration desk: one instance drives one enrollment attempt.
#[async_trait]
pub trait EnrollmentFlow: Send + Sync {
    async fn request_code(
        &self,
        enrollment: RawEnrollment,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError>;
    async fn confirm_code(&self, code: &str, now: DateTime<Utc>) -> Result<(), FlowError>;
    async fn finalize(&self, now: DateTime<Utc>) -> Result<RegistrationId, FlowError>;
    async fn tick(&self, now: DateTime<Utc>) -> Result<Option<u32>, FlowError>;
    fn phase(&self, now: DateTime<Utc>) -> VerificationPhase;
    fn reset(&self);
}

/// Re-verification for someone already on the registered list: a fresh
/// code goes to the phone on file and confirmed attempts re-deliver
/// credentials.
#[async_trait]
pub trait CredentialRecovery: Send + Sync {
    async fn begin_identity_check(
        &self,
        national_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError>;
}

/// Roll-side data entry: referral registration and table check-in.
#[async_trait]
pub trait RollDesk: Send + Sync {
    async fn verify_document(&self, document: &str) -> Result<RollEntry, DeskError>;
    async fn record_referral(
        &self,
        referral: RawReferral,
        now: DateTime<Utc>,
    ) -> Result<ReferralId, DeskError>;
    async fn check_in(
        &self,
        document: &str,
        verified_by: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckIn, DeskError>;
    async fn checked_in(&self) -> Result<Vec<CheckIn>, DeskError>;
}
