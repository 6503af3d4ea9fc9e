use padron_core::error::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("connection error: {0}")]
    Connection(String),
}

/// Failures of the external verification collaborators. A structured
/// rejection carries the reason the backend gave; everything else is
/// transport trouble.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{reason}")]
    Rejected { reason: String },
    #[error("collaborator unreachable: {0}")]
    Unreachable(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// User-visible outcome of every verification flow operation. Each variant
/// is locally recoverable: retry the same action, or restart via reset.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("validation: {0}")]
    Validation(#[from] DomainError),
    #[error("could not send the code: {0}")]
    Dispatch(String),
    #[error("the code expired, restart the verification")]
    Expired,
    #[error("code not accepted: {0}")]
    Confirmation(String),
    #[error("credential delivery failed: {0}")]
    Issuance(String),
    #[error("no code was requested")]
    NoActiveSession,
    #[error("national id is not registered")]
    NotRegistered,
    #[error("a request is already in flight")]
    Busy,
    #[error("attempt was superseded")]
    Superseded,
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Outcome of the roll-desk operations (referral registration, voter
/// check-in).
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("validation: {0}")]
    Validation(#[from] DomainError),
    #[error("document not on the roll")]
    NotOnRoll,
    #[error("voter already checked in")]
    AlreadyCheckedIn,
    #[error(transparent)]
    Port(#[from] PortError),
}
