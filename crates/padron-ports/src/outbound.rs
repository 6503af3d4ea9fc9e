use async_trait::async_trait;

use padron_core::events::DomainEvent;
use padron_core::registration::Registration;
use padron_core::roll::{CheckIn, Referral, RollEntry};

use crate::error::{GatewayError, PortError};
use crate::types::{CodeCheck, CodeDispatch, CredentialIssue, CredentialReceipt};

/// The three opaque verification collaborators. Wire format is owned by
/// the other side; these are the contracts this system consumes.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn send_code(&self, dispatch: &CodeDispatch) -> Result<(), GatewayError>;
    async fn confirm_code(&self, check: &CodeCheck) -> Result<(), GatewayError>;
    async fn issue_credentials(
        &self,
        issue: &CredentialIssue,
    ) -> Result<CredentialReceipt, GatewayError>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn save(&self, registration: &Registration) -> Result<(), PortError>;
    async fn find_by_national_id(&self, national_id: &str)
        -> Result<Option<Registration>, PortError>;
}

#[async_trait]
pub trait RollRepository: Send + Sync {
    async fn save_entry(&self, entry: &RollEntry) -> Result<(), PortError>;
    async fn find_entry(&self, document: &str) -> Result<Option<RollEntry>, PortError>;
    async fn save_referral(&self, referral: &Referral) -> Result<(), PortError>;
    async fn save_check_in(&self, check_in: &CheckIn) -> Result<(), PortError>;
    async fn find_check_in(&self, document: &str) -> Result<Option<CheckIn>, PortError>;
    async fn list_checked_in(&self) -> Result<Vec<CheckIn>, PortError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError>;
}
